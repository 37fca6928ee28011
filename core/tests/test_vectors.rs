//! Verify the query adapter and base query against JSON test vectors stored
//! in `test-vectors/`.
//!
//! Each vector describes an endpoint declaration, the caller's params and
//! body, the expected `FetchArgs` and the expected `HttpRequest`. Comparing
//! parsed JSON (not raw strings) avoids false negatives from field ordering.

use endpoint_core::{
    apply_params, Arg, Endpoint, FetchArgs, FetchBaseQuery, FetchOverrides, HttpMethod, NoBody,
    Params,
};
use serde_json::Value;

/// Descriptor with an untyped params record and JSON result; `B` is `Value`
/// for cases with a body and `NoBody` otherwise.
type UntypedEndpoint<B> = Endpoint<Params, Value, B>;

/// Header templates are path-like strings, e.g. `":name"`, filled from params.
fn endpoint_for<B>(case: &Value) -> UntypedEndpoint<B> {
    let method: HttpMethod = serde_json::from_value(case["method"].clone()).unwrap();
    let endpoint = UntypedEndpoint::<B>::new(method, case["path"].as_str().unwrap());

    let Some(headers) = case.get("fetch_headers").and_then(Value::as_object) else {
        return endpoint;
    };
    let templates: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect();
    endpoint.with_fetch_args(move |params| {
        templates
            .iter()
            .fold(FetchOverrides::default(), |overrides, (name, template)| {
                overrides.header(name.clone(), apply_params(template, params))
            })
    })
}

fn headers_of(value: &Value) -> Vec<(String, String)> {
    serde_json::from_value(value.clone()).unwrap()
}

#[test]
fn query_test_vectors() {
    let raw = include_str!("../../test-vectors/query.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_query = FetchBaseQuery::new(vectors["base_url"].as_str().unwrap());

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let params: Params = serde_json::from_value(case["params"].clone()).unwrap();

        // Verify query adapter
        let args = match case.get("body") {
            Some(body) => {
                let endpoint = endpoint_for::<Value>(case);
                assert_eq!(endpoint.path(), case["path"].as_str().unwrap(), "{name}: path");
                endpoint.query(&Arg::with_body(params, body.clone())).unwrap()
            }
            None => {
                let endpoint = endpoint_for::<NoBody>(case);
                assert_eq!(endpoint.path(), case["path"].as_str().unwrap(), "{name}: path");
                endpoint.query(&Arg::new(params)).unwrap()
            }
        };
        let expected: FetchArgs =
            serde_json::from_value(case["expected_fetch_args"].clone()).unwrap();
        assert_eq!(args, expected, "{name}: fetch args");

        // Verify base query
        let req = base_query.build_request(&args).unwrap();
        let expected_req = &case["expected_request"];
        assert_eq!(req.method.as_str(), expected_req["method"].as_str().unwrap(), "{name}: method");
        assert_eq!(req.url, expected_req["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, headers_of(&expected_req["headers"]), "{name}: headers");

        let body = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str::<Value>(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected_req["body"], "{name}: body");
    }
}

#[test]
fn every_vector_path_token_is_declared() {
    let raw = include_str!("../../test-vectors/query.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let endpoint = endpoint_for::<NoBody>(case);
        let params: Params = serde_json::from_value(case["params"].clone()).unwrap();
        let url = endpoint.query(&Arg::new(params.clone())).unwrap().url;
        for token in endpoint.param_names() {
            let covered = params.contains_key(token);
            assert_eq!(
                !url.contains(&format!(":{token}")),
                covered,
                "{}: token `{token}`",
                case["name"]
            );
        }
    }
}
