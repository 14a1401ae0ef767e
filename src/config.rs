//! Configuration for Chirpy
//!
//! CLI arguments and environment variable handling using clap. The parsed
//! `Args` are turned into plain config values which are handed to the
//! token service, credential hasher and document store at construction.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{ChirpyError, Result};

/// Default access token lifetime (1 hour)
pub const DEFAULT_ACCESS_TTL_SECONDS: u64 = 60 * 60;

/// Default refresh token lifetime (60 days)
pub const DEFAULT_REFRESH_TTL_SECONDS: u64 = 60 * 24 * 60 * 60;

/// Minimum accepted length of the token signing secret
pub const MIN_SECRET_LEN: usize = 32;

/// Chirpy - accounts, chirps and tokens backed by a JSON file
#[derive(Parser, Debug, Clone)]
#[command(name = "chirpy")]
#[command(about = "Manage Chirpy users, chirps and tokens in a JSON document store")]
pub struct Args {
    /// Path of the JSON document store
    #[arg(long, env = "DB_PATH", default_value = "database.json")]
    pub db_path: PathBuf,

    /// Token configuration
    #[command(flatten)]
    pub auth: AuthArgs,

    /// Password hashing cost
    #[command(flatten)]
    pub hash: HashArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Token signing and lifetime configuration
#[derive(Parser, Debug, Clone)]
pub struct AuthArgs {
    /// JWT secret for token signing
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECONDS", default_value_t = DEFAULT_ACCESS_TTL_SECONDS)]
    pub access_ttl_seconds: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECONDS", default_value_t = DEFAULT_REFRESH_TTL_SECONDS)]
    pub refresh_ttl_seconds: u64,

    /// API key expected on payment provider webhooks
    #[arg(long, env = "POLKA_API_KEY", hide_env_values = true)]
    pub polka_api_key: Option<String>,
}

/// Argon2 cost parameters
#[derive(Parser, Debug, Clone)]
pub struct HashArgs {
    /// Memory cost in KiB
    #[arg(long, env = "HASH_MEMORY_KIB", default_value_t = argon2::Params::DEFAULT_M_COST)]
    pub hash_memory_kib: u32,

    /// Number of iterations
    #[arg(long, env = "HASH_ITERATIONS", default_value_t = argon2::Params::DEFAULT_T_COST)]
    pub hash_iterations: u32,

    /// Degree of parallelism
    #[arg(long, env = "HASH_PARALLELISM", default_value_t = argon2::Params::DEFAULT_P_COST)]
    pub hash_parallelism: u32,
}

/// Operations exposed by the CLI
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the store file if it does not exist
    Init,
    /// Create a user account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and print an access/refresh token pair
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Change the email and password of the authenticated user
    UpdateUser {
        /// Access token
        #[arg(long)]
        token: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// List all users
    Users,
    /// Post a chirp as the authenticated user
    Post {
        /// Access token
        #[arg(long)]
        token: String,
        #[arg(long)]
        body: String,
    },
    /// List all chirps in ascending id order
    Chirps,
    /// Show a single chirp
    Chirp { id: u64 },
    /// Delete a chirp owned by the authenticated user
    Delete {
        /// Access token
        #[arg(long)]
        token: String,
        id: u64,
    },
    /// Exchange a refresh token for a new access token
    Refresh {
        /// Refresh token
        #[arg(long)]
        token: String,
    },
    /// Revoke a refresh token
    Revoke {
        /// Refresh token
        #[arg(long)]
        token: String,
    },
    /// Upgrade a user to premium (payment webhook)
    Upgrade {
        /// Webhook API key
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        user_id: u64,
    },
}

/// Settings injected into the token service
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Token settings with the standard lifetimes
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECONDS),
        }
    }
}

/// Settings injected into the credential hasher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Settings injected into the document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.auth.jwt_secret.as_deref() {
            None | Some("") => {
                return Err(ChirpyError::Config("JWT_SECRET is required".into()));
            }
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ChirpyError::Config(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                )));
            }
            Some(_) => {}
        }

        if self.auth.access_ttl_seconds == 0 || self.auth.refresh_ttl_seconds == 0 {
            return Err(ChirpyError::Config("Token lifetimes must be non-zero".into()));
        }

        Ok(())
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.auth.jwt_secret.clone().unwrap_or_default(),
            access_ttl: Duration::from_secs(self.auth.access_ttl_seconds),
            refresh_ttl: Duration::from_secs(self.auth.refresh_ttl_seconds),
        }
    }

    pub fn hasher_config(&self) -> HasherConfig {
        HasherConfig {
            memory_kib: self.hash.hash_memory_kib,
            iterations: self.hash.hash_iterations,
            parallelism: self.hash.hash_parallelism,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.db_path.clone(),
        }
    }
}
