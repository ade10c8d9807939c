use crate::Error;
use crate::Result;
use std::time::Duration;

/// Connection pool configuration.
///
/// `user`, `password`, and `database` are required; everything else
/// carries the documented default. `acquire_timeout` bounds how long
/// [`Pool::acquire`](super::Pool::acquire) may suspend when every
/// connection is checked out; `None` waits indefinitely. `strict_writes`
/// selects the single-row write policy: fail on an affected-row mismatch
/// instead of warning.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub charset: String,
    pub autocommit: bool,
    pub min_size: usize,
    pub max_size: usize,
    pub acquire_timeout: Option<Duration>,
    pub strict_writes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: None,
            password: None,
            database: None,
            charset: "utf8".to_string(),
            autocommit: true,
            min_size: 1,
            max_size: 10,
            acquire_timeout: None,
            strict_writes: false,
        }
    }
}

impl Config {
    /// Reads connection settings from `DB_HOST`, `DB_PORT`, `DB_USER`,
    /// `DB_PASSWORD`, and `DB_NAME`, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("DB_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("DB_PORT") {
            if let Ok(port) = port.parse() {
                config.port = port;
            }
        }
        config.user = std::env::var("DB_USER").ok();
        config.password = std::env::var("DB_PASSWORD").ok();
        config.database = std::env::var("DB_NAME").ok();
        config
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.user.is_none() {
            return Err(Error::Config("user is required".to_string()));
        }
        if self.password.is_none() {
            return Err(Error::Config("password is required".to_string()));
        }
        if self.database.is_none() {
            return Err(Error::Config("database is required".to_string()));
        }
        if self.max_size == 0 {
            return Err(Error::Config("max_size must be positive".to_string()));
        }
        if self.min_size > self.max_size {
            return Err(Error::Config(format!(
                "min_size ({}) exceeds max_size ({})",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}
