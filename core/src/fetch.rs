//! Wire-request descriptors and the stateless base query that turns them
//! into `HttpRequest` values.
//!
//! # Design
//! `FetchArgs` is what a query adapter hands to the data-fetching side: a
//! url relative to the api's base url, the method, an optional JSON body,
//! extra headers and any further fields passed through untouched.
//!
//! `FetchBaseQuery` holds only a `base_url` and default headers and carries
//! no mutable state between calls. `build_request` produces an
//! `HttpRequest` and `parse_response` consumes an `HttpResponse`; the caller
//! executes the round-trip in between, keeping this crate free of I/O.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

const CONTENT_TYPE: &str = "content-type";
const APPLICATION_JSON: &str = "application/json";

/// Request descriptor produced by a query adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchArgs {
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Arbitrary options forwarded verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchArgs {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            headers: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` into the descriptor.
    pub fn json_body<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body =
            Some(serde_json::to_value(body).map_err(|e| ApiError::SerializationError(e.to_string()))?);
        Ok(self)
    }

    /// Apply `overrides` on top of these args. Present fields win; headers
    /// are appended after the existing ones.
    pub fn merge(mut self, overrides: FetchOverrides) -> Self {
        if let Some(url) = overrides.url {
            self.url = url;
        }
        if let Some(method) = overrides.method {
            self.method = method;
        }
        if overrides.body.is_some() {
            self.body = overrides.body;
        }
        self.headers.extend(overrides.headers);
        self.extra.extend(overrides.extra);
        self
    }
}

impl From<&str> for FetchArgs {
    fn from(url: &str) -> Self {
        FetchArgs::new(HttpMethod::Get, url)
    }
}

impl From<String> for FetchArgs {
    fn from(url: String) -> Self {
        FetchArgs::new(HttpMethod::Get, url)
    }
}

/// `FetchArgs` with every field optional, returned by a descriptor's
/// fetch-args customizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchOverrides {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Anything an endpoint definition's query function may return.
pub trait IntoFetchArgs {
    fn into_fetch_args(self) -> Result<FetchArgs, ApiError>;
}

impl IntoFetchArgs for FetchArgs {
    fn into_fetch_args(self) -> Result<FetchArgs, ApiError> {
        Ok(self)
    }
}

impl IntoFetchArgs for Result<FetchArgs, ApiError> {
    fn into_fetch_args(self) -> Result<FetchArgs, ApiError> {
        self
    }
}

impl IntoFetchArgs for String {
    fn into_fetch_args(self) -> Result<FetchArgs, ApiError> {
        Ok(self.into())
    }
}

impl IntoFetchArgs for &str {
    fn into_fetch_args(self) -> Result<FetchArgs, ApiError> {
        Ok(self.into())
    }
}

/// Synchronous, stateless base query.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct FetchBaseQuery {
    base_url: String,
    default_headers: Vec<(String, String)>,
}

impl FetchBaseQuery {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: Vec::new(),
        }
    }

    /// Header sent with every request, before any per-request headers.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_request(&self, args: &FetchArgs) -> Result<HttpRequest, ApiError> {
        let mut headers = self.default_headers.clone();
        headers.extend(args.headers.iter().cloned());

        let body = match &args.body {
            Some(value) => {
                let body = serde_json::to_string(value)
                    .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
                    headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
                }
                Some(body)
            }
            None => None,
        };

        let url = join_urls(&self.base_url, &args.url);
        tracing::trace!(method = %args.method, %url, "built request");

        Ok(HttpRequest {
            method: args.method,
            url,
            headers,
            body,
        })
    }

    /// Decode a 2xx JSON response. An empty body decodes as JSON `null`.
    pub fn parse_response<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response)?;
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

/// Join `base` and `url` with exactly one slash. Absolute urls are returned
/// unchanged.
pub fn join_urls(base: &str, url: &str) -> String {
    if base.is_empty() || url.contains("://") {
        return url.to_string();
    }
    if url.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
