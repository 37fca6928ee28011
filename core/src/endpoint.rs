//! Endpoint descriptors: one declaration of an HTTP operation from which
//! both the query adapter and the mock adapter are derived.
//!
//! # Design
//! `Endpoint<P, R, B>` stores only the method, the path template and an
//! optional fetch-args customizer. `P` is the path params record, `R` the
//! result type and `B` the request body type; none of them has a runtime
//! representation in the descriptor.
//!
//! Endpoints without a body use [`NoBody`], which has no values. An
//! `Arg<P, NoBody>` therefore can never carry a body, and `Arg::new` is the
//! only way to build one. For any other body type `Arg::with_body` is the
//! only constructor, so a bodied endpoint always gets its body.
//!
//! The token set of the path is extracted once in `Endpoint::new` and shared
//! by every clone of the descriptor.

use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};

use crate::error::ApiError;
use crate::fetch::{FetchArgs, FetchOverrides};
use crate::http::HttpMethod;
use crate::path::{apply_params, extract_params, to_params};

/// Body type of endpoints that take no request body. Has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoBody {}

impl Serialize for NoBody {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        match *self {}
    }
}

impl<'de> Deserialize<'de> for NoBody {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(de::Error::custom("endpoint declares no request body"))
    }
}

/// Argument of an endpoint's query adapter.
///
/// A body can be neither left out for a bodied endpoint nor given to a
/// bodiless one:
///
/// ```compile_fail
/// use endpoint_core::{Arg, NoParams};
///
/// let arg: Arg<NoParams, String> = Arg { params: NoParams {}, body: None };
/// ```
///
/// ```compile_fail
/// use endpoint_core::{Arg, NoParams};
///
/// let arg: Arg<NoParams, String> = Arg::new(NoParams {});
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Arg<P, B = NoBody> {
    params: P,
    body: Option<B>,
}

impl<P> Arg<P, NoBody> {
    pub fn new(params: P) -> Self {
        Self { params, body: None }
    }
}

impl<P, B> Arg<P, B> {
    pub fn with_body(params: P, body: B) -> Self {
        Self {
            params,
            body: Some(body),
        }
    }

    pub fn params(&self) -> &P {
        &self.params
    }

    /// Always `Some` unless `B` is [`NoBody`].
    pub fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }
}

impl<P> From<P> for Arg<P, NoBody> {
    fn from(params: P) -> Self {
        Arg::new(params)
    }
}

/// Type-level view of a descriptor.
pub trait EndpointTypes {
    type Params;
    type Result;
    type Body;
}

/// Query argument type of endpoint `E`.
pub type ArgOf<E> = Arg<<E as EndpointTypes>::Params, <E as EndpointTypes>::Body>;

/// Result type of endpoint `E`.
pub type ResultOf<E> = <E as EndpointTypes>::Result;

type FetchArgsFn<P> = Arc<dyn Fn(&P) -> FetchOverrides + Send + Sync>;

/// Immutable declaration of one HTTP endpoint.
pub struct Endpoint<P, R, B = NoBody> {
    method: HttpMethod,
    path: String,
    param_names: Arc<BTreeSet<String>>,
    fetch_args: Option<FetchArgsFn<P>>,
    _types: PhantomData<fn() -> (P, R, B)>,
}

impl<P, R, B> Endpoint<P, R, B> {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let param_names = extract_params(&path);
        tracing::debug!(%method, %path, ?param_names, "declared endpoint");
        Self {
            method,
            path,
            param_names: Arc::new(param_names),
            fetch_args: None,
            _types: PhantomData,
        }
    }

    /// Customize the produced `FetchArgs`. The url, method and body are
    /// filled in already; fields returned here are merged on top.
    pub fn with_fetch_args<F>(mut self, f: F) -> Self
    where
        F: Fn(&P) -> FetchOverrides + Send + Sync + 'static,
    {
        self.fetch_args = Some(Arc::new(f));
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Token names of the path template.
    pub fn param_names(&self) -> &BTreeSet<String> {
        &self.param_names
    }
}

impl<P, R, B> Endpoint<P, R, B>
where
    P: Serialize,
    B: Serialize,
{
    /// Build the wire-request descriptor for `arg`.
    ///
    /// Tokens missing from `arg.params` are left in the url untouched.
    pub fn query(&self, arg: &Arg<P, B>) -> Result<FetchArgs, ApiError> {
        let params = to_params(&arg.params)?;
        let mut args = FetchArgs::new(self.method, apply_params(&self.path, &params));
        if let Some(body) = &arg.body {
            args = args.json_body(body)?;
        }
        if let Some(customize) = &self.fetch_args {
            args = args.merge(customize(&arg.params));
        }
        tracing::debug!(method = %args.method, url = %args.url, "built fetch args");
        Ok(args)
    }
}

impl<P, R, B> EndpointTypes for Endpoint<P, R, B> {
    type Params = P;
    type Result = R;
    type Body = B;
}

impl<P, R, B> Clone for Endpoint<P, R, B> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            param_names: Arc::clone(&self.param_names),
            fetch_args: self.fetch_args.clone(),
            _types: PhantomData,
        }
    }
}

impl<P, R, B> fmt::Debug for Endpoint<P, R, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("param_names", &self.param_names)
            .field("customized", &self.fetch_args.is_some())
            .finish()
    }
}
