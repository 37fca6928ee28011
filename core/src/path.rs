//! Path templates: token extraction and parameter substitution.
//!
//! A path template such as `/pokemon/:name` carries zero or more tokens,
//! each a segment introduced by [`TOKEN_PREFIX`] and terminated by
//! [`PATH_SEPARATOR`]. The token set is what a descriptor's params record
//! must cover.
//!
//! # Known gaps
//! Substitution is a plain find-and-replace per key, longest key first so a
//! token is never clobbered by one whose name is its prefix (`:id` inside
//! `:idx`). A missing token is left
//! in place as literal `:token` text, a literal `:` in a non-token segment
//! cannot be escaped, and a value that itself contains `:other` may be
//! rewritten by a later key. None of these are checked at runtime.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

pub const TOKEN_PREFIX: char = ':';
pub const PATH_SEPARATOR: char = '/';

/// Untyped params record: token name to substituted value.
pub type Params = BTreeMap<String, String>;

/// Params type for paths without tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoParams {}

/// Token names of `path`, as a set.
pub fn extract_params(path: &str) -> BTreeSet<String> {
    path.split(PATH_SEPARATOR)
        .filter_map(|segment| segment.strip_prefix(TOKEN_PREFIX))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace every `:key` in `path` with the key's value.
pub fn apply_params(path: &str, params: &Params) -> String {
    let mut pairs: Vec<(&String, &String)> = params.iter().collect();
    pairs.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
    pairs.into_iter().fold(path.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{TOKEN_PREFIX}{key}"), value)
    })
}

/// Flatten a typed params value into a [`Params`] record.
///
/// Strings are kept as-is, numbers and booleans are rendered with
/// `to_string`, nulls are dropped. Nested values are rejected.
pub fn to_params<P: Serialize>(params: &P) -> Result<Params, ApiError> {
    let value =
        serde_json::to_value(params).map_err(|e| ApiError::InvalidParams(e.to_string()))?;
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Params::new()),
        other => {
            return Err(ApiError::InvalidParams(format!(
                "expected a record, got `{other}`"
            )))
        }
    };

    let mut out = Params::new();
    for (key, value) in map {
        let rendered = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => {
                return Err(ApiError::InvalidParams(format!(
                    "param `{key}` must be a scalar, got `{other}`"
                )))
            }
        };
        out.insert(key, rendered);
    }
    Ok(out)
}

/// Rebuild a typed params value from a [`Params`] record.
///
/// Every value is a string, so the fields of `P` must be strings too.
pub fn from_params<P: DeserializeOwned>(params: &Params) -> Result<P, ApiError> {
    let object = params
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect::<serde_json::Map<_, _>>();
    serde_json::from_value(Value::Object(object)).map_err(|e| ApiError::InvalidParams(e.to_string()))
}
