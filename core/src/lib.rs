//! Typed endpoint descriptors and the request side of the endpoint/mock bridge.
//!
//! # Overview
//! An endpoint is declared once as an [`Endpoint<P, R, B>`]: method, path
//! template, params record `P`, result `R` and body `B`. Its query adapter
//! produces [`FetchArgs`], which [`FetchBaseQuery`] turns into a plain-data
//! [`HttpRequest`] (host-does-IO pattern). The `mock-server` crate derives
//! the mock handler from the same declaration.
//!
//! # Design
//! - Descriptors are immutable values; the path token set is computed once.
//! - [`api`] assembles runtime endpoints through a module pipeline, so a
//!   module such as the mock module can attach capabilities per endpoint
//!   without this crate knowing about it.
//! - No async and no network I/O.

pub mod api;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod http;
pub mod path;

pub use api::{
    build_create_api, create_api, Api, ApiEndpoint, ApiFactory, ApiOptions, CoreModule,
    EndpointBuilder, EndpointDefinition, EndpointKind, Module,
};
pub use endpoint::{Arg, ArgOf, Endpoint, EndpointTypes, NoBody, ResultOf};
pub use error::ApiError;
pub use fetch::{FetchArgs, FetchBaseQuery, FetchOverrides, IntoFetchArgs};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse};
pub use path::{apply_params, extract_params, NoParams, Params};
