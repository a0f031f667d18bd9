use async_trait::async_trait;

use super::token::tokens_match;
use crate::error::AppError;
use crate::store::StoreTx;

/// What a request presents to prove who it is.
///
/// `username` is the caller's claim; the two tokens must match the ones stored for
/// that principal. Any of the three may be empty, which simply fails authorization.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub session_token: String,
    pub csrf_token: String,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub username: String,
}

/// Decides whether a request is made on behalf of a live session.
///
/// Runs inside the request's transaction. The user row is read, not locked: a
/// logout that commits after the check does not undo a request already let through.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn authorize(
        &self,
        tx: &mut dyn StoreTx,
        credentials: &Credentials,
    ) -> Result<Principal, AppError>;
}

/// Checks a claimed username against the session cookie and the CSRF header.
///
/// The claim is only trusted once both tokens match the ones stored for it, so a
/// request naming another principal fails unless it also carries that principal's
/// tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimedIdentityGate;

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".into())
}

#[async_trait]
impl AuthGate for ClaimedIdentityGate {
    async fn authorize(
        &self,
        tx: &mut dyn StoreTx,
        credentials: &Credentials,
    ) -> Result<Principal, AppError> {
        let username = credentials.username.trim();
        if username.is_empty() {
            log::debug!("rejected request without a claimed username");
            return Err(unauthorized());
        }

        let user = match tx.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                log::debug!("rejected request claiming unknown user {}", username);
                return Err(unauthorized());
            }
        };

        if !tokens_match(&credentials.session_token, user.session_token.as_deref()) {
            log::debug!("session token mismatch for user {}", user.id);
            return Err(unauthorized());
        }
        if !tokens_match(&credentials.csrf_token, user.csrf_token.as_deref()) {
            log::debug!("csrf token mismatch for user {}", user.id);
            return Err(unauthorized());
        }

        Ok(Principal {
            id: user.id,
            username: user.username,
        })
    }
}
