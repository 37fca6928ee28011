//! Mock HTTP server whose handlers are derived from endpoint declarations.
//!
//! # Overview
//! The interception side of the endpoint/mock bridge. A [`MockServer`]
//! holds an ordered list of [`HttpHandler`]s and serves them in-process
//! ([`MockServer::handle`]) or over HTTP through axum ([`app`], [`run`]).
//!
//! Handlers come from three places:
//! - the per-verb constructors in [`http`], for hand-written mocks;
//! - [`EndpointMock::mock`] on a standalone `Endpoint` descriptor;
//! - [`ApiEndpointMock::mock`] on an api endpoint declared with
//!   [`MockOptions`], once [`MswModule`] is installed after the core module.
//!
//! # Design
//! - Typed resolvers get params of the endpoint's params type and must
//!   succeed with a [`StrictResponse`] of its result type; error responses
//!   go on the `Err` side.
//! - Handlers never reference the descriptor they came from.

pub mod config;
pub mod demo;
pub mod endpoint_ext;
pub mod error;
pub mod handler;
pub mod matcher;
pub mod module;
pub mod request;
pub mod response;
pub mod server;

/// Per-verb handler constructors.
pub mod http {
    pub use crate::handler::{all, delete, get, head, options, patch, post, put};
}

pub use config::{ServerConfig, UnhandledRequest};
pub use endpoint_ext::EndpointMock;
pub use error::{ConfigError, MockError};
pub use handler::{HttpHandler, RequestInfo, ResolverInfo};
pub use matcher::{MethodFilter, PathPattern};
pub use module::{create_api, ApiEndpointMock, MockOptions, MswModule};
pub use request::MockRequest;
pub use response::{MockResponse, ResponseInit, StrictResponse};
pub use server::{app, run, MockServer};
