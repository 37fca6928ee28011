//! Error types for endpoint descriptors, the fetch layer and the api builder.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging.
//!
//! `ModuleOrder` and the endpoint lookup variants are configuration errors
//! raised while the api is being assembled. They are never retryable.

use thiserror::Error;

/// Errors returned by the core crate.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Path params could not be converted to or from a flat string record.
    #[error("invalid path params: {0}")]
    InvalidParams(String),

    #[error("unknown HTTP method `{0}`")]
    UnknownMethod(String),

    /// A module's hook ran before the module it depends on.
    #[error("{required} module should be before {module}")]
    ModuleOrder {
        required: &'static str,
        module: &'static str,
    },

    #[error("no endpoint named `{0}`")]
    UnknownEndpoint(String),

    #[error("endpoint `{0}` is already defined")]
    DuplicateEndpoint(String),

    /// `initiate` was called with an argument of the wrong type.
    #[error("endpoint `{endpoint}` expects an argument of type `{expected}`")]
    ArgumentType {
        endpoint: String,
        expected: &'static str,
    },
}
