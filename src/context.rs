//! Everything a handler needs, bundled once at startup and shared through
//! `web::Data<AppContext>`.

use std::sync::Arc;

use crate::auth::token::MIN_TOKEN_BYTES;
use crate::auth::{
    AuthGate, BcryptHasher, ClaimedIdentityGate, CredentialHasher, Credentials, Principal,
    PrincipalDirectory, SessionManager,
};
use crate::config::Config;
use crate::error::AppError;
use crate::store::{Store, StoreTx};

/// Knobs of the auth components that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ContextSettings {
    pub bcrypt_cost: u32,
    pub token_bytes: usize,
    pub cookie_secure: bool,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            token_bytes: MIN_TOKEN_BYTES,
            cookie_secure: false,
        }
    }
}

impl From<&Config> for ContextSettings {
    fn from(config: &Config) -> Self {
        Self {
            bcrypt_cost: config.bcrypt_cost,
            token_bytes: config.token_bytes,
            cookie_secure: config.cookie_secure,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn Store>,
    directory: PrincipalDirectory,
    sessions: SessionManager,
    gate: Arc<dyn AuthGate>,
    cookie_secure: bool,
}

impl AppContext {
    pub fn new(store: Arc<dyn Store>, settings: ContextSettings) -> Self {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(BcryptHasher::new(settings.bcrypt_cost));
        Self {
            store,
            directory: PrincipalDirectory::new(hasher.clone()),
            sessions: SessionManager::new(hasher, settings.token_bytes),
            gate: Arc::new(ClaimedIdentityGate),
            cookie_secure: settings.cookie_secure,
        }
    }

    /// Swaps the identity strategy.
    pub fn with_gate(mut self, gate: Arc<dyn AuthGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn directory(&self) -> &PrincipalDirectory {
        &self.directory
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    pub async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        self.store.begin().await
    }

    pub async fn authorize(
        &self,
        tx: &mut dyn StoreTx,
        credentials: &Credentials,
    ) -> Result<Principal, AppError> {
        self.gate.authorize(tx, credentials).await
    }
}
