//! Account creation from the command line.
//!
//! The password is generated, printed once, and only its argon2 hash is
//! stored. Useful for bootstrapping the first admin.

use rand::{Rng, distr::Alphanumeric};

use succulent_shop_api::db::Repositories;
use succulent_shop_api::services::auth::hash_password;
use succulent_shop_core::requests::UserDraft;
use succulent_shop_core::{Email, Role};

use super::{CommandError, connect};

const GENERATED_PASSWORD_LENGTH: usize = 20;

pub struct NewAccount {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub role: String,
    pub address: String,
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

fn draft(account: &NewAccount, password: &str) -> Result<UserDraft, CommandError> {
    let role: Role = account
        .role
        .parse()
        .map_err(|_| {
            CommandError::Invalid(format!(
                "Invalid role: {}. Valid roles: user, employee, admin",
                account.role
            ))
        })?;
    let email = Email::parse(&account.email)
        .map_err(|e| CommandError::Invalid(format!("Invalid email {}: {e}", account.email)))?;
    Ok(UserDraft {
        firstname: account.firstname.clone(),
        lastname: account.lastname.clone(),
        email,
        password: Some(password.to_owned()),
        role,
        address: account.address.clone(),
    })
}

/// Create the account and print its generated password.
pub async fn create(account: &NewAccount) -> Result<(), CommandError> {
    let password = generate_password();
    let draft = draft(account, &password)?;
    let hash = hash_password(&password)?;

    let repos = Repositories::postgres(connect().await?);
    if repos.users.get_by_email(&draft.email).await?.is_some() {
        return Err(CommandError::Invalid(format!(
            "User already exists with email: {}",
            draft.email
        )));
    }
    let user = repos.users.insert(&draft, &hash).await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "User created");
    #[allow(clippy::print_stdout)]
    {
        println!("Password for {}: {password}", user.email);
        println!("Store it now; it is not shown again.");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn account(role: &str, email: &str) -> NewAccount {
        NewAccount {
            email: email.to_owned(),
            firstname: "Ana".to_owned(),
            lastname: "Kovac".to_owned(),
            role: role.to_owned(),
            address: "-".to_owned(),
        }
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }

    #[test]
    fn test_draft_checks_role_and_email() {
        let ok = draft(&account("admin", "ana@shop.test"), "pw").unwrap();
        assert_eq!(ok.role, Role::Admin);
        assert!(matches!(
            draft(&account("owner", "ana@shop.test"), "pw"),
            Err(CommandError::Invalid(msg)) if msg.starts_with("Invalid role")
        ));
        assert!(matches!(
            draft(&account("user", "nope"), "pw"),
            Err(CommandError::Invalid(msg)) if msg.starts_with("Invalid email")
        ));
    }
}
