//! `.mock` for standalone endpoint descriptors.

use std::future::Future;

use endpoint_core::{Endpoint, EndpointTypes};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::handler::{typed_handler, HttpHandler, ResolverInfo};
use crate::response::{MockResponse, StrictResponse};

/// Derive a mock handler from an endpoint declaration.
///
/// The handler matches the descriptor's method and path. Its resolver gets
/// params of the descriptor's params type and can only succeed with a
/// response of the descriptor's result type.
pub trait EndpointMock: EndpointTypes {
    fn mock<F, Fut>(&self, resolver: F) -> HttpHandler
    where
        F: Fn(ResolverInfo<Self::Params, Self::Body, Self::Result>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StrictResponse<Self::Result>, MockResponse>> + Send + 'static;
}

impl<P, R, B> EndpointMock for Endpoint<P, R, B>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    B: DeserializeOwned + Send + 'static,
{
    fn mock<F, Fut>(&self, resolver: F) -> HttpHandler
    where
        F: Fn(ResolverInfo<P, B, R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StrictResponse<R>, MockResponse>> + Send + 'static,
    {
        typed_handler(self.method().into(), self.path(), resolver)
    }
}
