//! Mock responses.
//!
//! # Design
//! `MockResponse` is the untyped response every resolver ultimately yields.
//! `StrictResponse<R>` is a response whose body is known to be an `R`; the
//! typed adapters only accept those from a resolver's success path, so a
//! mock cannot answer with a body of the wrong shape. Error responses are
//! plain `MockResponse`s returned on the `Err` side.

use axum::body::{Body, Bytes};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::MockError;

const CONTENT_TYPE: &str = "content-type";

/// Status and headers of a response under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInit {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl Default for ResponseInit {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
        }
    }
}

impl ResponseInit {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl MockResponse {
    /// JSON response. A value that fails to serialize yields a 500 instead.
    pub fn json<T: Serialize + ?Sized>(value: &T, init: ResponseInit) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::with_content_type(init, "application/json", Bytes::from(body)),
            Err(e) => {
                tracing::error!(error = %e, "mock response body failed to serialize");
                MockError::Serialization(e.to_string()).into_mock_response()
            }
        }
    }

    pub fn text(body: impl Into<String>, init: ResponseInit) -> Self {
        Self::with_content_type(init, "text/plain", Bytes::from(body.into()))
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    fn with_content_type(init: ResponseInit, content_type: &str, body: Bytes) -> Self {
        let mut headers = init.headers;
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE)) {
            headers.push((CONTENT_TYPE.to_string(), content_type.to_string()));
        }
        Self {
            status: init.status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, MockError> {
        serde_json::from_slice(&self.body).map_err(|e| MockError::InvalidBody(e.to_string()))
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Body::from(self.body)).unwrap_or_else(|e| {
            tracing::error!(error = %e, "invalid mock response");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        })
    }
}

/// Response whose body is an `R`.
#[derive(Debug, Clone)]
pub struct StrictResponse<R> {
    body: R,
    init: ResponseInit,
}

impl<R> StrictResponse<R> {
    pub fn new(body: R, init: ResponseInit) -> Self {
        Self { body, init }
    }

    pub fn body(&self) -> &R {
        &self.body
    }

    pub fn status(&self) -> u16 {
        self.init.status
    }
}

impl<R: Serialize> StrictResponse<R> {
    pub fn into_mock_response(self) -> MockResponse {
        MockResponse::json(&self.body, self.init)
    }
}

impl MockError {
    /// Response the server sends when a handler fails before its resolver runs.
    pub fn into_mock_response(self) -> MockResponse {
        let status = match self {
            MockError::InvalidParams(_) | MockError::InvalidBody(_) => 400,
            _ => 500,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        match serde_json::to_vec(&body) {
            Ok(bytes) => MockResponse::with_content_type(
                ResponseInit::status(status),
                "application/json",
                Bytes::from(bytes),
            ),
            Err(_) => MockResponse::empty(status),
        }
    }
}
