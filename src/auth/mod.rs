pub mod directory;
pub mod extractors;
pub mod gate;
pub mod ownership;
pub mod password;
pub mod session;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::validate_email_shape;

// Re-export necessary items
pub use directory::PrincipalDirectory;
pub use extractors::SessionCredentials;
pub use gate::{AuthGate, ClaimedIdentityGate, Credentials, Principal};
pub use ownership::{OwnerScope, OwnershipGuard, ProjectOwnership, TaskOwnership};
pub use password::{BcryptHasher, CredentialHasher};
pub use session::SessionManager;
pub use token::{generate_token, tokens_match, SessionTokens};

/// Represents the payload for a new user registration request.
///
/// Missing fields deserialize as empty strings so that they are reported as
/// invalid fields (406) rather than as a malformed body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Must be non-empty and not already taken.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub username: String,
    /// Must contain "@" and ".com" and not already be registered.
    #[serde(default)]
    #[validate(custom = "validate_email_shape")]
    pub email: String,
    /// Between 8 and 200 characters.
    #[serde(default)]
    #[validate(length(min = 8, max = 200))]
    pub password: String,
}

impl RegisterRequest {
    /// Strips surrounding whitespace from every field.
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.trim().to_string(),
        }
    }
}

/// Represents the payload for a user login request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of a successful login. The session token itself travels in a cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}
