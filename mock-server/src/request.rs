//! Intercepted requests as plain data.
//!
//! # Design
//! The server buffers the whole body before any handler runs, so resolvers
//! read it synchronously. Only the path takes part in matching; the query
//! string is kept for resolvers that want it.

use axum::body::Bytes;
use endpoint_core::{HttpMethod, HttpRequest};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::MockError;

/// Origin relative targets are resolved against.
const LOCAL_ORIGIN: &str = "http://localhost/";

#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl MockRequest {
    /// Request for `target`, which may be a path with a query string or an
    /// absolute url.
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query) = split_target(target);
        Self {
            method,
            path,
            query,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, MockError> {
        serde_json::from_slice(&self.body).map_err(|e| MockError::InvalidBody(e.to_string()))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl From<&HttpRequest> for MockRequest {
    fn from(request: &HttpRequest) -> Self {
        let mut mock = MockRequest::new(request.method, &request.url);
        mock.headers = request.headers.clone();
        if let Some(body) = &request.body {
            mock.body = Bytes::from(body.clone());
        }
        mock
    }
}

/// Path and query of a path or absolute url. The path comes back in its
/// percent-encoded wire form; the fragment is dropped.
pub(crate) fn split_target(target: &str) -> (String, Option<String>) {
    match Url::parse(LOCAL_ORIGIN).and_then(|base| base.join(target)) {
        Ok(url) => (url.path().to_string(), url.query().map(str::to_string)),
        Err(e) => {
            tracing::warn!(error = %e, raw = target, "unparsable request target");
            (target.to_string(), None)
        }
    }
}
