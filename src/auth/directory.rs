use std::sync::Arc;

use validator::{Validate, ValidationErrors};

use super::password::CredentialHasher;
use super::RegisterRequest;
use crate::error::AppError;
use crate::models::{NewUser, PublicUser, User, DEFAULT_PROFILE};
use crate::store::StoreTx;

/// Username -> principal lookups and registration.
///
/// Owns the uniqueness rules on username and e-mail. The checks and the insert run
/// in the caller's transaction; the store's unique indexes back them up when two
/// registrations race.
#[derive(Clone)]
pub struct PrincipalDirectory {
    hasher: Arc<dyn CredentialHasher>,
}

fn field_failed(errors: &Option<ValidationErrors>, field: &str) -> bool {
    errors
        .as_ref()
        .is_some_and(|e| e.field_errors().contains_key(field))
}

impl PrincipalDirectory {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { hasher }
    }

    /// Creates a principal. Fields are checked in order (username, e-mail, password)
    /// and the first failure is reported as `NotAcceptable`.
    pub async fn register(
        &self,
        tx: &mut dyn StoreTx,
        request: RegisterRequest,
    ) -> Result<User, AppError> {
        let request = request.normalized();
        let errors = request.validate().err();

        if field_failed(&errors, "username") || tx.username_taken(&request.username).await? {
            return Err(AppError::NotAcceptable("Invalid username".into()));
        }
        if field_failed(&errors, "email") || tx.email_taken(&request.email).await? {
            return Err(AppError::NotAcceptable("Invalid email".into()));
        }
        if field_failed(&errors, "password") {
            return Err(AppError::NotAcceptable("Invalid password".into()));
        }

        let password_hash = self.hasher.hash_password(&request.password)?;
        let user = tx
            .insert_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                profile: DEFAULT_PROFILE.to_string(),
            })
            .await?;

        log::info!("registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    pub async fn resolve(
        &self,
        tx: &mut dyn StoreTx,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(None);
        }
        tx.find_user_by_username(username).await
    }

    pub async fn list(&self, tx: &mut dyn StoreTx) -> Result<Vec<PublicUser>, AppError> {
        Ok(tx.list_users().await?.iter().map(User::public).collect())
    }
}
