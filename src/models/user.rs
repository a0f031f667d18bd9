use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Avatar assigned to every new account.
pub const DEFAULT_PROFILE: &str = "Default.png";

/// A principal as stored. Never serialized directly: it carries the password hash
/// and the live session secrets. Use [`User::public`] for anything sent to a client.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: String,
    /// Set together with `csrf_token`; both are `None` while logged out.
    pub session_token: Option<String>,
    pub csrf_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_active_session(&self) -> bool {
        matches!(
            (self.session_token.as_deref(), self.csrf_token.as_deref()),
            (Some(s), Some(c)) if !s.is_empty() && !c.is_empty()
        )
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile: self.profile.clone(),
            created_at: self.created_at,
        }
    }
}

/// The client-facing view of a user, without credentials or tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub profile: String,
    pub created_at: DateTime<Utc>,
}

/// A validated, hashed registration ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: String,
}
