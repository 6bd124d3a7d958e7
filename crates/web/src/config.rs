use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            host: lookup("HOST").context("Cannot load HOST env variable")?,
            port: lookup("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: lookup("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            database_max_connections: match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(value) => value
                    .parse()
                    .context("DATABASE_MAX_CONNECTIONS must be a number")?,
                None => DEFAULT_MAX_CONNECTIONS,
            },
            database_acquire_timeout_secs: match lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
                Some(value) => value
                    .parse()
                    .context("DATABASE_ACQUIRE_TIMEOUT_SECS must be a number")?,
                None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
            },
            request_timeout_secs: match lookup("REQUEST_TIMEOUT_SECS") {
                Some(value) => value
                    .parse()
                    .context("REQUEST_TIMEOUT_SECS must be a number")?,
                None => DEFAULT_REQUEST_TIMEOUT_SECS,
            },
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn database_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    /// Host part of the database URL, without credentials.
    pub fn database_host(&self) -> &str {
        self.database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    }
}
