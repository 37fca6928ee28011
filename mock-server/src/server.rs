//! The interception layer: an ordered handler list served over axum.
//!
//! # Design
//! Handlers live behind one `RwLock`. Registration prepends, so the newest
//! handler for a route wins; lookup walks the list front to back and the
//! first match serves the request. The matched handler is cloned out of the
//! lock before its resolver is awaited, so slow resolvers never block
//! registration.
//!
//! `handle` is usable in-process; `app` wraps it in an axum `Router` with a
//! single fallback route so every method and path reaches it.

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;
use endpoint_core::HttpMethod;
use http_body_util::LengthLimitError;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::UnhandledRequest;
use crate::handler::{HttpHandler, RequestInfo};
use crate::request::MockRequest;
use crate::response::{MockResponse, ResponseInit};

/// Largest request body the server buffers, matching axum's default limit.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

struct Inner {
    initial: Vec<HttpHandler>,
    handlers: RwLock<Vec<HttpHandler>>,
    on_unhandled: UnhandledRequest,
}

#[derive(Clone)]
pub struct MockServer {
    inner: Arc<Inner>,
}

impl MockServer {
    pub fn new(handlers: impl IntoIterator<Item = HttpHandler>) -> Self {
        Self::with_strategy(handlers, UnhandledRequest::default())
    }

    pub fn with_strategy(
        handlers: impl IntoIterator<Item = HttpHandler>,
        on_unhandled: UnhandledRequest,
    ) -> Self {
        let initial: Vec<HttpHandler> = handlers.into_iter().collect();
        Self {
            inner: Arc::new(Inner {
                handlers: RwLock::new(initial.clone()),
                initial,
                on_unhandled,
            }),
        }
    }

    /// Prepend `handlers`, keeping their relative order.
    pub async fn use_handlers(&self, handlers: impl IntoIterator<Item = HttpHandler>) {
        let mut added: Vec<HttpHandler> = handlers.into_iter().collect();
        for handler in &added {
            tracing::debug!(id = %handler.id(), method = %handler.method(), path = handler.path(), "use handler");
        }
        let mut current = self.inner.handlers.write().await;
        added.append(&mut current);
        *current = added;
    }

    /// Drop every handler added since construction.
    pub async fn reset_handlers(&self) {
        *self.inner.handlers.write().await = self.inner.initial.clone();
    }

    pub async fn list_handlers(&self) -> Vec<HttpHandler> {
        self.inner.handlers.read().await.clone()
    }

    /// Returns whether a handler with `id` was registered.
    pub async fn remove_handler(&self, id: Uuid) -> bool {
        let mut handlers = self.inner.handlers.write().await;
        let before = handlers.len();
        handlers.retain(|h| h.id() != id);
        handlers.len() != before
    }

    pub async fn handle(&self, request: MockRequest) -> MockResponse {
        let matched = {
            let handlers = self.inner.handlers.read().await;
            handlers
                .iter()
                .find_map(|h| h.matches(&request).map(|params| (h.clone(), params)))
        };

        match matched {
            Some((handler, params)) => {
                tracing::info!(
                    handler = %handler.id(),
                    method = %request.method,
                    path = %request.path,
                    "mocked request"
                );
                handler.resolve(RequestInfo { params, request }).await
            }
            None => self.unhandled(&request),
        }
    }

    fn unhandled(&self, request: &MockRequest) -> MockResponse {
        let message = format!("no mock handler for {} {}", request.method, request.path);
        match self.inner.on_unhandled {
            UnhandledRequest::Warn => {
                tracing::warn!(method = %request.method, path = %request.path, "unhandled request");
                MockResponse::json(&json!({ "error": message }), ResponseInit::status(404))
            }
            UnhandledRequest::Error => {
                tracing::error!(method = %request.method, path = %request.path, "unhandled request");
                MockResponse::json(&json!({ "error": message }), ResponseInit::status(500))
            }
        }
    }
}

impl std::fmt::Debug for MockServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockServer")
            .field("initial", &self.inner.initial.len())
            .field("on_unhandled", &self.inner.on_unhandled)
            .finish_non_exhaustive()
    }
}

pub fn app(server: MockServer) -> Router {
    Router::new().fallback(dispatch).with_state(server)
}

pub async fn run(listener: TcpListener, server: MockServer) -> Result<(), std::io::Error> {
    axum::serve(listener, app(server)).await
}

async fn dispatch(State(server): State<MockServer>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let Ok(method) = parts.method.as_str().parse::<HttpMethod>() else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            let too_large = e.into_inner().is::<LengthLimitError>();
            tracing::warn!(too_large, path = parts.uri.path(), "failed to read request body");
            return if too_large {
                StatusCode::PAYLOAD_TOO_LARGE.into_response()
            } else {
                StatusCode::BAD_REQUEST.into_response()
            };
        }
    };
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let request = MockRequest {
        method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers,
        body,
    };
    server.handle(request).await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{get, post};

    fn text(body: &'static str) -> HttpHandler {
        get("/pokemon", move |_| async move {
            MockResponse::text(body, ResponseInit::default())
        })
    }

    async fn body_of(server: &MockServer, method: HttpMethod, path: &str) -> (u16, String) {
        let response = server.handle(MockRequest::new(method, path)).await;
        (response.status(), String::from_utf8_lossy(response.body()).into_owned())
    }

    #[tokio::test]
    async fn newest_handler_wins() {
        let server = MockServer::new([text("initial")]);
        assert_eq!(body_of(&server, HttpMethod::Get, "/pokemon").await.1, "initial");

        server.use_handlers([text("override")]).await;
        assert_eq!(body_of(&server, HttpMethod::Get, "/pokemon").await.1, "override");
        assert_eq!(server.list_handlers().await.len(), 2);
    }

    #[tokio::test]
    async fn reset_restores_initial_handlers() {
        let server = MockServer::new([text("initial")]);
        server.use_handlers([text("override")]).await;
        server.reset_handlers().await;
        assert_eq!(body_of(&server, HttpMethod::Get, "/pokemon").await.1, "initial");
        assert_eq!(server.list_handlers().await.len(), 1);
    }

    #[tokio::test]
    async fn remove_by_id() {
        let extra = text("override");
        let id = extra.id();
        let server = MockServer::new([text("initial")]);
        server.use_handlers([extra]).await;
        assert!(server.remove_handler(id).await);
        assert!(!server.remove_handler(id).await);
        assert_eq!(body_of(&server, HttpMethod::Get, "/pokemon").await.1, "initial");
    }

    #[tokio::test]
    async fn unhandled_request_strategies() {
        let warn = MockServer::new([post("/pokemon", |_| async { MockResponse::empty(201) })]);
        assert_eq!(body_of(&warn, HttpMethod::Get, "/pokemon").await.0, 404);

        let error = MockServer::with_strategy(Vec::new(), UnhandledRequest::Error);
        let (status, body) = body_of(&error, HttpMethod::Get, "/pokemon").await;
        assert_eq!(status, 500);
        assert!(body.contains("no mock handler for GET /pokemon"));
    }
}
