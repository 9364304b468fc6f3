//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ShopConfig;
use crate::db::Repositories;
use crate::services::auth::JwtKeys;
use crate::services::storage::FileStorage;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the repositories, photo storage and token keys.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ShopConfig,
    repos: Repositories,
    storage: FileStorage,
    jwt: JwtKeys,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Photos are stored under `config.upload_dir`.
    #[must_use]
    pub fn new(config: ShopConfig, repos: Repositories) -> Self {
        let storage = FileStorage::new(config.upload_dir.clone());
        let jwt = JwtKeys::new(&config.auth.jwt_secret, config.auth.token_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repos,
                storage,
                jwt,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ShopConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Get a reference to the uploaded photo storage.
    #[must_use]
    pub fn storage(&self) -> &FileStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }
}
