//! Store configuration for campus-data
//!
//! Configuration is fixed at process start: read the environment once,
//! build one `StoreConfig`, hand it to the pool. Nothing here is re-read
//! per call.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable for the store host (default `localhost`)
pub const ENV_HOST: &str = "CAMPUS_DB_HOST";
/// Environment variable for the store port (default `5432`)
pub const ENV_PORT: &str = "CAMPUS_DB_PORT";
/// Environment variable for the database name (default `campus`)
pub const ENV_DATABASE: &str = "CAMPUS_DB_NAME";
/// Environment variable for the database user (default `campus`)
pub const ENV_USER: &str = "CAMPUS_DB_USER";
/// Environment variable for the database password (default empty)
pub const ENV_PASSWORD: &str = "CAMPUS_DB_PASSWORD";
/// Environment variable for the TLS mode (default `prefer`)
pub const ENV_SSLMODE: &str = "CAMPUS_DB_SSLMODE";
/// Environment variable for the maximum pool size (default `10`)
pub const ENV_POOL_MAX: &str = "CAMPUS_DB_POOL_MAX";
/// Environment variable for the idle timeout in seconds (default `600`)
pub const ENV_IDLE_TIMEOUT: &str = "CAMPUS_DB_IDLE_TIMEOUT_SECS";
/// Environment variable for the connect/acquire timeout in seconds (default `10`)
pub const ENV_CONNECT_TIMEOUT: &str = "CAMPUS_DB_CONNECT_TIMEOUT_SECS";

/// TLS negotiation mode handed to the driver.
///
/// Encryption policy is the driver's concern; this layer only plumbs the
/// setting through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsMode {
    /// Never use TLS
    Disable,
    /// Use TLS if the server supports it
    #[default]
    Prefer,
    /// Fail if TLS cannot be negotiated
    Require,
}

impl TlsMode {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "disable" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" => Ok(Self::Require),
            other => Err(Error::config(format!(
                "invalid TLS mode {:?} (expected disable, prefer, or require)",
                other
            ))),
        }
    }
}

/// Connection and pool configuration, read once at process start.
#[derive(Clone)]
pub struct StoreConfig {
    /// Store host
    pub host: String,
    /// Store port
    pub port: u16,
    /// Database name
    pub database: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// TLS negotiation mode
    pub tls: TlsMode,
    /// Maximum pool size
    pub pool_max_size: usize,
    /// Idle connections older than this are recycled
    pub idle_timeout: Duration,
    /// Timeout for establishing and acquiring connections
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            database: "campus".into(),
            user: "campus".into(),
            password: String::new(),
            tls: TlsMode::default(),
            pool_max_size: 10,
            idle_timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak the password into logs.
        let password = if self.password.is_empty() {
            ""
        } else {
            "***"
        };
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &password)
            .field("tls", &self.tls)
            .field("pool_max_size", &self.pool_max_size)
            .field("idle_timeout", &self.idle_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl StoreConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests supply a closure over a map instead
    /// of mutating process-wide environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut config = defaults;
        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = parse_number(ENV_PORT, &port)?;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            config.database = database;
        }
        if let Some(user) = lookup(ENV_USER) {
            config.user = user;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.password = password;
        }
        if let Some(tls) = lookup(ENV_SSLMODE) {
            config.tls = TlsMode::parse(&tls)?;
        }
        if let Some(max) = lookup(ENV_POOL_MAX) {
            config.pool_max_size = parse_number(ENV_POOL_MAX, &max)?;
            if config.pool_max_size == 0 {
                return Err(Error::config(format!("{} must be at least 1", ENV_POOL_MAX)));
            }
        }
        if let Some(idle) = lookup(ENV_IDLE_TIMEOUT) {
            config.idle_timeout = Duration::from_secs(parse_number(ENV_IDLE_TIMEOUT, &idle)?);
        }
        if let Some(connect) = lookup(ENV_CONNECT_TIMEOUT) {
            config.connect_timeout =
                Duration::from_secs(parse_number(ENV_CONNECT_TIMEOUT, &connect)?);
        }

        Ok(config)
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the TLS mode
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Set the maximum pool size
    pub fn with_pool_max_size(mut self, size: usize) -> Self {
        self.pool_max_size = size;
        self
    }

    /// Set the idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the connect/acquire timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("invalid value {:?} for {}", value, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.database, "campus");
        assert_eq!(config.user, "campus");
        assert_eq!(config.tls, TlsMode::Prefer);
        assert_eq!(config.pool_max_size, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_HOST, "db.internal"),
            (ENV_PORT, "5433"),
            (ENV_DATABASE, "campus_test"),
            (ENV_SSLMODE, "require"),
            (ENV_POOL_MAX, "4"),
            (ENV_CONNECT_TIMEOUT, "3"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5433);
        assert_eq!(config.database, "campus_test");
        assert_eq!(config.tls, TlsMode::Require);
        assert_eq!(config.pool_max_size, 4);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        // Untouched keys keep their defaults
        assert_eq!(config.user, "campus");
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_PORT, "not-a-port")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_SSLMODE, "sometimes")])).is_err());
        assert!(StoreConfig::from_lookup(lookup_from(&[(ENV_POOL_MAX, "0")])).is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = StoreConfig::default().with_password("hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_builder_chain() {
        let config = StoreConfig::default()
            .with_host("10.0.0.5")
            .with_port(6432)
            .with_pool_max_size(2)
            .with_idle_timeout(Duration::from_secs(30));

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 6432);
        assert_eq!(config.pool_max_size, 2);
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }
}
