use std::sync::Arc;

use super::password::CredentialHasher;
use super::token::{SessionTokens, MIN_TOKEN_BYTES};
use crate::error::AppError;
use crate::models::User;
use crate::store::StoreTx;

/// Issues and revokes session/CSRF token pairs.
///
/// A principal holds at most one pair. Logging in replaces whatever pair was there,
/// so of two concurrent logins the later commit wins and the earlier pair is dead.
#[derive(Clone)]
pub struct SessionManager {
    hasher: Arc<dyn CredentialHasher>,
    token_bytes: usize,
}

impl SessionManager {
    pub fn new(hasher: Arc<dyn CredentialHasher>, token_bytes: usize) -> Self {
        Self {
            hasher,
            token_bytes: token_bytes.max(MIN_TOKEN_BYTES),
        }
    }

    /// Verifies the password and binds a fresh token pair to the principal.
    ///
    /// Both fields are trimmed, as they are at registration. Unknown user, wrong
    /// password and an unreadable stored hash all fail with the same error.
    pub async fn login(
        &self,
        tx: &mut dyn StoreTx,
        username: &str,
        password: &str,
    ) -> Result<(User, SessionTokens), AppError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::invalid_credentials());
        }

        let user = match tx.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                log::debug!("login for unknown user {}", username);
                return Err(AppError::invalid_credentials());
            }
        };

        let verified = self
            .hasher
            .verify_password(password, &user.password_hash)
            .unwrap_or_else(|e| {
                log::warn!("stored hash for user {} is unusable: {}", user.id, e);
                false
            });
        if !verified {
            log::debug!("wrong password for user {}", user.id);
            return Err(AppError::invalid_credentials());
        }

        let tokens = SessionTokens::issue(self.token_bytes);
        tx.set_session_tokens(user.id, Some(&tokens)).await?;
        log::info!("user {} logged in", user.id);

        Ok((user, tokens))
    }

    /// Clears both tokens of the principal.
    pub async fn logout(&self, tx: &mut dyn StoreTx, user_id: i32) -> Result<(), AppError> {
        tx.set_session_tokens(user_id, None).await?;
        log::info!("user {} logged out", user_id);
        Ok(())
    }

    /// True when `username` names a known principal that holds no session.
    ///
    /// A repeated logout fails the gate (the tokens are gone); this is how the
    /// handler tells that case apart from a forged one.
    pub async fn already_logged_out(
        &self,
        tx: &mut dyn StoreTx,
        username: &str,
    ) -> Result<bool, AppError> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(false);
        }
        Ok(tx
            .find_user_by_username(username)
            .await?
            .is_some_and(|user| !user.has_active_session()))
    }
}
