use std::env;
use std::fmt;

use crate::auth::password::{MAX_COST, MIN_COST};
use crate::auth::token::MIN_TOKEN_BYTES;

/// Runtime configuration, read from the environment (and `.env` via `dotenv` in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub db_max_connections: u32,
    /// Origin allowed by CORS. Credentials are allowed for it, so it must be exact.
    pub cors_origin: String,
    /// Marks the session cookie `Secure`. Enable whenever the server sits behind HTTPS.
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    /// Random bytes per issued session/CSRF token.
    pub token_bytes: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value {:?}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let token_bytes = parsed("TOKEN_BYTES", MIN_TOKEN_BYTES)?;
        if token_bytes < MIN_TOKEN_BYTES {
            return Err(ConfigError::Invalid {
                key: "TOKEN_BYTES",
                value: token_bytes.to_string(),
            });
        }

        let bcrypt_cost = parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(MIN_COST..=MAX_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url,
            server_port: parsed("SERVER_PORT", 3000)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3030".to_string()),
            cookie_secure: parsed("COOKIE_SECURE", false)?,
            bcrypt_cost,
            token_bytes,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
