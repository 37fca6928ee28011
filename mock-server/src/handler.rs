//! Registrable mock handlers and the typed resolver adapter.
//!
//! # Design
//! An `HttpHandler` closes over a method filter, a path pattern and a
//! resolver, nothing else. It keeps no reference to the endpoint it was
//! derived from. Handlers are cheap to clone and are shared by the server.
//!
//! `typed_handler` is the adapter both mock designs go through: it turns the
//! captured params into the endpoint's params type, hands the resolver a
//! `ResolverInfo` whose `json` helper only accepts the endpoint's result
//! type, and flattens the resolver's `Result` into a single response.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use endpoint_core::path::from_params;
use endpoint_core::{HttpMethod, Params};
use futures::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::MockError;
use crate::matcher::{MethodFilter, PathPattern};
use crate::request::MockRequest;
use crate::response::{MockResponse, ResponseInit, StrictResponse};

type Resolver = Arc<dyn Fn(RequestInfo) -> BoxFuture<'static, MockResponse> + Send + Sync>;

/// What an untyped resolver receives.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub params: Params,
    pub request: MockRequest,
}

/// What a typed resolver receives.
#[derive(Debug)]
pub struct ResolverInfo<P, B, R> {
    pub params: P,
    pub request: MockRequest,
    _types: PhantomData<fn() -> (B, R)>,
}

impl<P, B, R> ResolverInfo<P, B, R> {
    fn new(params: P, request: MockRequest) -> Self {
        Self {
            params,
            request,
            _types: PhantomData,
        }
    }

    /// JSON response with status 200.
    pub fn json(&self, body: R) -> StrictResponse<R> {
        StrictResponse::new(body, ResponseInit::default())
    }

    pub fn json_with(&self, body: R, init: ResponseInit) -> StrictResponse<R> {
        StrictResponse::new(body, init)
    }
}

impl<P, B: DeserializeOwned, R> ResolverInfo<P, B, R> {
    /// Decode the request body as the endpoint's body type.
    pub fn body(&self) -> Result<B, MockError> {
        self.request.json()
    }
}

#[derive(Clone)]
pub struct HttpHandler {
    id: Uuid,
    method: MethodFilter,
    pattern: PathPattern,
    resolver: Resolver,
}

impl HttpHandler {
    pub fn new<F, Fut>(method: impl Into<MethodFilter>, path: &str, resolver: F) -> Self
    where
        F: Fn(RequestInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MockResponse> + Send + 'static,
    {
        let handler = Self {
            id: Uuid::new_v4(),
            method: method.into(),
            pattern: PathPattern::parse(path),
            resolver: Arc::new(move |info: RequestInfo| resolver(info).boxed()),
        };
        tracing::debug!(id = %handler.id, method = %handler.method, path, "created mock handler");
        handler
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> MethodFilter {
        self.method
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    /// Captured params when this handler serves `request`.
    pub fn matches(&self, request: &MockRequest) -> Option<Params> {
        if !self.method.matches(request.method) {
            return None;
        }
        self.pattern.matches(&request.path)
    }

    pub fn resolve(&self, info: RequestInfo) -> BoxFuture<'static, MockResponse> {
        (self.resolver)(info)
    }
}

impl std::fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHandler")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Handler whose resolver works with typed params, body and result.
pub(crate) fn typed_handler<P, B, R, F, Fut>(method: MethodFilter, path: &str, resolver: F) -> HttpHandler
where
    P: DeserializeOwned + Send + 'static,
    B: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(ResolverInfo<P, B, R>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StrictResponse<R>, MockResponse>> + Send + 'static,
{
    HttpHandler::new(method, path, move |info: RequestInfo| {
        let params = match from_params::<P>(&info.params) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(error = %e, path = %info.request.path, "params did not fit handler");
                let response = MockError::InvalidParams(e.to_string()).into_mock_response();
                return future::ready(response).boxed();
            }
        };
        resolver(ResolverInfo::new(params, info.request))
            .map(|result| match result {
                Ok(strict) => strict.into_mock_response(),
                Err(response) => response,
            })
            .boxed()
    })
}

macro_rules! verb_handler {
    ($($(#[$doc:meta])* $name:ident => $method:expr;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<F, Fut>(path: &str, resolver: F) -> HttpHandler
            where
                F: Fn(RequestInfo) -> Fut + Send + Sync + 'static,
                Fut: Future<Output = MockResponse> + Send + 'static,
            {
                HttpHandler::new($method, path, resolver)
            }
        )*
    };
}

verb_handler! {
    /// Handler for every method.
    all => MethodFilter::All;
    get => HttpMethod::Get;
    post => HttpMethod::Post;
    put => HttpMethod::Put;
    patch => HttpMethod::Patch;
    delete => HttpMethod::Delete;
    head => HttpMethod::Head;
    options => HttpMethod::Options;
}
