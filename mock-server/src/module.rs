//! Mock capability for api endpoints, installed as an api module.
//!
//! # Design
//! Endpoint definitions opt in by carrying a [`MockOptions`] extension. The
//! [`MswModule`] runs after the core module for every endpoint and attaches
//! a `MockCapability` holding those options (or none) to the runtime
//! endpoint. [`ApiEndpointMock::mock`] reads the capability back.
//!
//! Two misuse errors, both fatal to the call:
//! - the module ran before the core module created the endpoint
//!   (`ApiError::ModuleOrder`, "core module should be before mswModule");
//! - `.mock` on an endpoint declared without options
//!   (`MockError::MissingMockOptions`).

use std::future::Future;
use std::sync::Arc;

use endpoint_core::{
    build_create_api, Api, ApiEndpoint, ApiError, ApiOptions, CoreModule, EndpointBuilder,
    EndpointDefinition, Module,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::MockError;
use crate::handler::{typed_handler, HttpHandler, ResolverInfo};
use crate::matcher::MethodFilter;
use crate::response::{MockResponse, StrictResponse};

/// Where the mock for an api endpoint is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOptions {
    pub path: String,
    pub method: MethodFilter,
}

impl MockOptions {
    pub fn new(method: impl Into<MethodFilter>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct MockCapability {
    options: Option<MockOptions>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MswModule;

impl MswModule {
    pub const NAME: &'static str = "mswModule";
}

impl Module for MswModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn inject_endpoint(
        &self,
        api: &mut Api,
        name: &str,
        definition: &EndpointDefinition,
    ) -> Result<(), ApiError> {
        let options = definition.extensions().get::<MockOptions>().cloned();
        let endpoint = api.endpoint_mut(name).ok_or(ApiError::ModuleOrder {
            required: CoreModule::NAME,
            module: Self::NAME,
        })?;
        tracing::debug!(endpoint = name, mocked = options.is_some(), "attach mock capability");
        endpoint.extensions_mut().insert(MockCapability { options });
        Ok(())
    }
}

/// `.mock` for endpoints of an api built with [`MswModule`].
pub trait ApiEndpointMock {
    /// Options the endpoint was declared with, if any.
    fn mock_options(&self) -> Option<&MockOptions>;

    fn mock<P, B, R, F, Fut>(&self, resolver: F) -> Result<HttpHandler, MockError>
    where
        P: DeserializeOwned + Send + 'static,
        B: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(ResolverInfo<P, B, R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StrictResponse<R>, MockResponse>> + Send + 'static;
}

impl ApiEndpointMock for ApiEndpoint {
    fn mock_options(&self) -> Option<&MockOptions> {
        self.extensions()
            .get::<MockCapability>()
            .and_then(|capability| capability.options.as_ref())
    }

    fn mock<P, B, R, F, Fut>(&self, resolver: F) -> Result<HttpHandler, MockError>
    where
        P: DeserializeOwned + Send + 'static,
        B: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(ResolverInfo<P, B, R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StrictResponse<R>, MockResponse>> + Send + 'static,
    {
        let capability = self
            .extensions()
            .get::<MockCapability>()
            .ok_or(MockError::ModuleNotInstalled)?;
        let options = capability
            .options
            .as_ref()
            .ok_or(MockError::MissingMockOptions)?;
        Ok(typed_handler(options.method, &options.path, resolver))
    }
}

/// Create an api with the core module followed by the mock module.
pub fn create_api<F, I, S>(options: ApiOptions, endpoints: F) -> Result<Api, ApiError>
where
    F: FnOnce(&EndpointBuilder) -> I,
    I: IntoIterator<Item = (S, EndpointDefinition)>,
    S: Into<String>,
{
    build_create_api(vec![Arc::new(CoreModule), Arc::new(MswModule)]).create_api(options, endpoints)
}
