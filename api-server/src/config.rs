//! Server configuration
//!
//! Everything comes from the environment (or a `.env`-style lookup in tests).

use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_POOL_MAX: u32 = 10;
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// PostgreSQL connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ssl: bool,
    pub pool_max: u32,
    pub idle_timeout: Duration,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("ssl", &self.ssl)
            .field("pool_max", &self.pool_max)
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

/// Which task store backs the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres(DatabaseConfig),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub store: StoreBackend,
}

/// Parse a boolean flag, falling back to `default` on anything unrecognised.
pub fn env_flag(raw: Option<&str>, default: bool) -> bool {
    match raw {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let store = match lookup("TASK_STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            _ => StoreBackend::Postgres(DatabaseConfig {
                host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(&lookup, "DB_PORT", 5432)?,
                user: lookup("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                password: lookup("DB_PASSWORD").unwrap_or_default(),
                name: lookup("DB_NAME").unwrap_or_else(|| "postgres".to_string()),
                ssl: env_flag(lookup("DB_SSL").as_deref(), false),
                pool_max: parse_or(&lookup, "DB_POOL_MAX", DEFAULT_POOL_MAX)?,
                idle_timeout: Duration::from_millis(parse_or(
                    &lookup,
                    "DB_IDLE_TIMEOUT_MS",
                    DEFAULT_IDLE_TIMEOUT_MS,
                )?),
            }),
        };

        Ok(Self {
            port,
            cors_origins,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cors_origins.len(), 2);
        let StoreBackend::Postgres(db) = config.store else {
            panic!("expected postgres backend");
        };
        assert_eq!(db.host, "localhost");
        assert_eq!(db.port, 5432);
        assert!(!db.ssl);
        assert_eq!(db.pool_max, 10);
        assert_eq!(db.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_database_settings_from_env() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_USER", "board"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "tasks"),
            ("DB_SSL", "true"),
            ("DB_POOL_MAX", "4"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        let StoreBackend::Postgres(db) = config.store else {
            panic!("expected postgres backend");
        };
        assert_eq!(db.host, "db.internal");
        assert_eq!(db.port, 6543);
        assert_eq!(db.name, "tasks");
        assert!(db.ssl);
        assert_eq!(db.pool_max, 4);
        assert!(!format!("{:?}", db).contains("hunter2"));
    }

    #[test]
    fn test_memory_backend_and_bad_port() {
        let config = ServerConfig::from_lookup(lookup(&[("TASK_STORE", "memory")])).unwrap();
        assert_eq!(config.store, StoreBackend::Memory);

        let result = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_flag() {
        assert!(env_flag(Some("YES"), false));
        assert!(!env_flag(Some("off"), true));
        assert!(env_flag(Some("maybe"), true));
        assert!(!env_flag(None, false));
    }
}
