//! Integration tests for the Succulent Shop API.
//!
//! The tests drive the full router (middleware, extractors, services) with
//! [`tower::ServiceExt::oneshot`] against the in-memory repositories, so no
//! database or listening socket is needed.
//!
//! ```bash
//! cargo test -p succulent-shop-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use succulent_shop_api::config::{AuthConfig, JobsConfig, ShopConfig};
use succulent_shop_api::db::Repositories;
use succulent_shop_api::models::User;
use succulent_shop_api::services::auth::hash_password;
use succulent_shop_api::state::AppState;
use succulent_shop_core::requests::UserDraft;
use succulent_shop_core::{Email, Role};

/// Password given to every account created by [`TestApp::account`].
pub const PASSWORD: &str = "cactus-123";

/// A router over a fresh in-memory store and a private upload directory.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _uploads: TempDir,
}

/// Status and decoded JSON body (or `Value::Null` for empty bodies).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

fn test_config(upload_dir: &std::path::Path) -> ShopConfig {
    ShopConfig {
        database_url: SecretString::from("postgres://unused"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        upload_dir: upload_dir.to_path_buf(),
        auth: AuthConfig {
            jwt_secret: SecretString::from("integration-test-secret-integration-test"),
            token_ttl: Duration::from_secs(3600),
        },
        jobs: JobsConfig::default(),
        smtp: None,
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let state = AppState::new(test_config(uploads.path()), Repositories::in_memory());
        state.storage().init().await.unwrap();
        let router = succulent_shop_api::app(state.clone());
        Self {
            state,
            router,
            _uploads: uploads,
        }
    }

    /// Insert a user directly, bypassing registration so any role can be used.
    pub async fn account(&self, email: &str, role: Role) -> User {
        let draft = UserDraft {
            firstname: "Iva".to_owned(),
            lastname: "Maric".to_owned(),
            email: Email::parse(email).unwrap(),
            password: Some(PASSWORD.to_owned()),
            role,
            address: "Aloe 12, Split".to_owned(),
        };
        let hash = hash_password(PASSWORD).unwrap();
        self.state.repos().users.insert(&draft, &hash).await.unwrap()
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["accessToken"].as_str().unwrap().to_owned()
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        json: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match json {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.call(request).await
    }

    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A valid decor product body.
#[must_use]
pub fn decor(name: &str, price: &str) -> Value {
    serde_json::json!({
        "productName": name,
        "productDesc": format!("{name} for a sunny shelf"),
        "productType": "DECOR",
        "price": price,
        "quantity": 10,
        "active": true
    })
}

const BOUNDARY: &str = "shop-test-boundary";

/// Build a `multipart/form-data` request with one JSON part and an optional photo.
#[must_use]
pub fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    part: &str,
    json: &Value,
    photo: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{part}\"\r\nContent-Type: application/json\r\n\r\n{json}\r\n"
        )
        .as_bytes(),
    );
    if let Some((file_name, content_type, bytes)) = photo {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}
