use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::{env, fmt};

use sqlx::{Pool, Postgres};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub media_root: PathBuf,
}

impl Config {
    /// Reads configuration from the environment; `.env` files are loaded by
    /// the binaries before this runs.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:8000"));
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr.clone()))?;

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| String::from("media"));

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            media_root: media_root.into(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // jwt_secret stays out of logs
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("media_root", &self.media_root)
            .finish()
    }
}

/// Shared handler state cloned into every route filter.
#[derive(Clone)]
pub struct Context {
    pub pool: Pool<Postgres>,
    pub config: Arc<Config>,
}

impl Context {
    pub fn new(pool: Pool<Postgres>, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
