//! Error types for mock handlers and server configuration.

use thiserror::Error;

/// Errors raised while building or running mock handlers.
#[derive(Debug, Error)]
pub enum MockError {
    /// `.mock` was called on an api endpoint declared without mock options.
    #[error("mock can only be called with endpoints that have mock options")]
    MissingMockOptions,

    /// `.mock` was called on an endpoint of an api built without the mock module.
    #[error("endpoint has no mock capability; install the mock module after the core module")]
    ModuleNotInstalled,

    /// Captured path params did not fit the handler's params type.
    #[error("invalid path params: {0}")]
    InvalidParams(String),

    /// The request body did not decode into the handler's body type.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Errors reading `ServerConfig` from the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),

    #[error("invalid ON_UNHANDLED_REQUEST `{0}`, expected `warn` or `error`")]
    InvalidStrategy(String),
}
