//! User, registration and login bodies.

use serde::Deserialize;

use crate::types::{Email, EmailError, Role};
use crate::validation::{ValidationError, Violations};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Admin-facing create/update body.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub address: Option<String>,
}

impl std::fmt::Debug for UserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRequest")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .field("address", &self.address)
            .finish()
    }
}

/// Checked user fields. `password` is still plain text and must be hashed
/// before it is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub firstname: String,
    pub lastname: String,
    pub email: Email,
    pub password: Option<String>,
    pub role: Role,
    pub address: String,
}

impl std::fmt::Debug for UserDraft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDraft")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

fn check_email(v: &mut Violations, raw: Option<&str>) -> Option<Email> {
    match Email::parse(raw.unwrap_or_default()) {
        Ok(email) => Some(email),
        Err(EmailError::Empty) => {
            v.push("Email cannot be empty");
            None
        }
        Err(err) => {
            v.push(err.to_string());
            None
        }
    }
}

fn check_password(v: &mut Violations, raw: Option<&str>) -> Option<String> {
    match raw {
        Some(p) if !p.trim().is_empty() => {
            v.check(
                p.chars().count() < MIN_PASSWORD_LENGTH,
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters long"),
            );
            Some(p.to_owned())
        }
        _ => {
            v.push("Password cannot be empty");
            None
        }
    }
}

impl UserRequest {
    /// Validate for create (`password_required`) or update.
    ///
    /// On update a blank password keeps the stored one.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self, password_required: bool) -> Result<UserDraft, ValidationError> {
        let mut v = Violations::new();
        let firstname = v.require_text(self.firstname.as_deref(), "First name");
        let lastname = v.require_text(self.lastname.as_deref(), "Last name");
        let address = v.require_text(self.address.as_deref(), "Address");
        let email = check_email(&mut v, self.email.as_deref());
        let password = if password_required || self.password.as_deref().is_some_and(|p| !p.is_empty())
        {
            check_password(&mut v, self.password.as_deref())
        } else {
            None
        };
        let role = match self.role.as_deref().map(str::trim) {
            None | Some("") => {
                v.push("Role must be specified");
                None
            }
            Some(raw) => v.parse_optional::<Role>(Some(raw), "Invalid role value"),
        };
        v.finish()?;

        let (Some(firstname), Some(lastname), Some(address), Some(email), Some(role)) =
            (firstname, lastname, address, email, role)
        else {
            return Err(ValidationError::single("Invalid user data"));
        };
        Ok(UserDraft {
            firstname: firstname.to_owned(),
            lastname: lastname.to_owned(),
            email,
            password,
            role,
            address: address.to_owned(),
        })
    }
}

/// Self-service sign-up. Always creates a `USER`.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
}

impl RegisterRequest {
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<UserDraft, ValidationError> {
        UserRequest {
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role: Some(Role::User.as_str().to_owned()),
            address: self.address.clone(),
        }
        .validate(true)
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> UserRequest {
        UserRequest {
            firstname: Some("Ana".to_owned()),
            lastname: Some("Petrović".to_owned()),
            email: Some("ana@example.com".to_owned()),
            password: Some("secret1".to_owned()),
            role: Some("employee".to_owned()),
            address: Some("Cactus street 3".to_owned()),
        }
    }

    #[test]
    fn test_valid_user() {
        let draft = request().validate(true).unwrap();
        assert_eq!(draft.role, Role::Employee);
        assert_eq!(draft.email.as_str(), "ana@example.com");
        assert_eq!(draft.password.as_deref(), Some("secret1"));
    }

    #[test]
    fn test_short_password_and_bad_email() {
        let mut req = request();
        req.password = Some("abc".to_owned());
        req.email = Some("ana-at-example".to_owned());
        assert_eq!(
            req.validate(true).unwrap_err().violations,
            [
                "Email format is invalid",
                "Password must be at least 6 characters long"
            ]
        );
    }

    #[test]
    fn test_update_may_omit_password() {
        let mut req = request();
        req.password = None;
        assert!(req.validate(true).is_err());
        assert_eq!(req.validate(false).unwrap().password, None);
    }

    #[test]
    fn test_register_forces_user_role() {
        let register = RegisterRequest {
            firstname: Some("Ivo".to_owned()),
            lastname: Some("Ivić".to_owned()),
            email: Some("ivo@example.com".to_owned()),
            password: Some("hunter22".to_owned()),
            address: Some("Aloe 1".to_owned()),
        };
        assert_eq!(register.validate().unwrap().role, Role::User);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", request());
        assert!(!rendered.contains("secret1"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
