//! Server configuration read from the environment.
//!
//! | Variable               | Default     |
//! |------------------------|-------------|
//! | `HOST`                 | `127.0.0.1` |
//! | `PORT`                 | `3000`      |
//! | `ON_UNHANDLED_REQUEST` | `warn`      |

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// What the server does with a request no handler matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnhandledRequest {
    /// Log a warning and answer 404.
    #[default]
    Warn,
    /// Log an error and answer 500.
    Error,
}

impl FromStr for UnhandledRequest {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(UnhandledRequest::Warn),
            "error" => Ok(UnhandledRequest::Error),
            _ => Err(ConfigError::InvalidStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for UnhandledRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnhandledRequest::Warn => f.write_str("warn"),
            UnhandledRequest::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub on_unhandled_request: UnhandledRequest,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            on_unhandled_request: UnhandledRequest::Warn,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };
        let on_unhandled_request = match lookup("ON_UNHANDLED_REQUEST") {
            Some(raw) => raw.parse()?,
            None => defaults.on_unhandled_request,
        };
        Ok(Self {
            host,
            port,
            on_unhandled_request,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
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
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn reads_every_key() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("ON_UNHANDLED_REQUEST", "Error"),
        ]))
        .unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.on_unhandled_request, UnhandledRequest::Error);
    }

    #[test]
    fn rejects_bad_port() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("eighty".to_string()));
    }

    #[test]
    fn rejects_bad_strategy() {
        let err = ServerConfig::from_lookup(lookup(&[("ON_UNHANDLED_REQUEST", "bypass")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStrategy(_)));
    }
}
