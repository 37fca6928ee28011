//! Api builder with a pluggable module pipeline.
//!
//! # Design
//! An api is assembled from endpoint definitions by running every installed
//! [`Module`] over every definition, in module registration order. The
//! [`CoreModule`] creates the runtime [`ApiEndpoint`]; modules registered
//! after it may extend that endpoint with capabilities of their own.
//!
//! Definitions and runtime endpoints each carry an `http::Extensions` slot.
//! Definitions hold per-endpoint options a module reads (for example mock
//! metadata); runtime endpoints hold whatever a module attaches. Neither the
//! core types nor this pipeline need to know about those modules.
//!
//! Query functions are stored type-erased. `ApiEndpoint::initiate` checks
//! the argument type at runtime and fails with `ApiError::ArgumentType` on a
//! mismatch.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ::http::Extensions;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::endpoint::{Arg, Endpoint};
use crate::error::ApiError;
use crate::fetch::{FetchArgs, FetchBaseQuery, IntoFetchArgs};
use crate::http::{HttpRequest, HttpResponse};

type QueryFn = Arc<dyn Fn(&dyn Any) -> Option<Result<FetchArgs, ApiError>> + Send + Sync>;

/// Whether an endpoint reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Query,
    Mutation,
}

/// Declared endpoint, before any module has run over it.
#[derive(Clone)]
pub struct EndpointDefinition {
    kind: EndpointKind,
    arg_type: &'static str,
    result_type: &'static str,
    query: QueryFn,
    extensions: Extensions,
}

impl EndpointDefinition {
    fn new<R, A, T, F>(kind: EndpointKind, query: F) -> Self
    where
        R: 'static,
        A: 'static,
        T: IntoFetchArgs,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        let query: QueryFn = Arc::new(move |arg: &dyn Any| {
            arg.downcast_ref::<A>()
                .map(|arg| query(arg).into_fetch_args())
        });
        Self {
            kind,
            arg_type: type_name::<A>(),
            result_type: type_name::<R>(),
            query,
            extensions: Extensions::new(),
        }
    }

    /// Attach extension data read by modules.
    pub fn with_extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn arg_type(&self) -> &'static str {
        self.arg_type
    }

    pub fn result_type(&self) -> &'static str {
        self.result_type
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

impl fmt::Debug for EndpointDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointDefinition")
            .field("kind", &self.kind)
            .field("arg_type", &self.arg_type)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// Handed to the endpoints closure of `create_api`.
#[derive(Debug, Default)]
pub struct EndpointBuilder {
    _priv: (),
}

impl EndpointBuilder {
    pub fn query<R, A, T, F>(&self, query: F) -> EndpointDefinition
    where
        R: 'static,
        A: 'static,
        T: IntoFetchArgs,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        EndpointDefinition::new::<R, A, T, F>(EndpointKind::Query, query)
    }

    pub fn mutation<R, A, T, F>(&self, query: F) -> EndpointDefinition
    where
        R: 'static,
        A: 'static,
        T: IntoFetchArgs,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        EndpointDefinition::new::<R, A, T, F>(EndpointKind::Mutation, query)
    }

    /// Query definition backed by a standalone descriptor's query adapter.
    pub fn query_endpoint<P, R, B>(&self, endpoint: &Endpoint<P, R, B>) -> EndpointDefinition
    where
        P: Serialize + 'static,
        R: 'static,
        B: Serialize + 'static,
    {
        let endpoint = endpoint.clone();
        self.query::<R, Arg<P, B>, _, _>(move |arg| endpoint.query(arg))
    }

    /// Mutation definition backed by a standalone descriptor's query adapter.
    pub fn mutation_endpoint<P, R, B>(&self, endpoint: &Endpoint<P, R, B>) -> EndpointDefinition
    where
        P: Serialize + 'static,
        R: 'static,
        B: Serialize + 'static,
    {
        let endpoint = endpoint.clone();
        self.mutation::<R, Arg<P, B>, _, _>(move |arg| endpoint.query(arg))
    }
}

/// Runtime endpoint of an assembled api.
pub struct ApiEndpoint {
    name: String,
    kind: EndpointKind,
    arg_type: &'static str,
    result_type: &'static str,
    query: QueryFn,
    base_query: FetchBaseQuery,
    extensions: Extensions,
}

impl ApiEndpoint {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn result_type(&self) -> &'static str {
        self.result_type
    }

    /// Run the endpoint's query function. `A` must be the declared argument type.
    pub fn fetch_args<A: 'static>(&self, arg: &A) -> Result<FetchArgs, ApiError> {
        (self.query)(arg as &dyn Any).unwrap_or_else(|| {
            Err(ApiError::ArgumentType {
                endpoint: self.name.clone(),
                expected: self.arg_type,
            })
        })
    }

    /// Build the `HttpRequest` for `arg` against the api's base query.
    pub fn initiate<A: 'static>(&self, arg: &A) -> Result<HttpRequest, ApiError> {
        let args = self.fetch_args(arg)?;
        tracing::debug!(endpoint = %self.name, method = %args.method, url = %args.url, "initiate");
        self.base_query.build_request(&args)
    }

    pub fn parse<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        self.base_query.parse_response(response)
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

impl fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("arg_type", &self.arg_type)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}

/// A unit of the api builder pipeline.
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs once when the api is created, before any endpoint is injected.
    fn init(&self, _api: &mut Api) -> Result<(), ApiError> {
        Ok(())
    }

    /// Runs once per endpoint definition, after every earlier module's hook
    /// for the same endpoint.
    fn inject_endpoint(
        &self,
        api: &mut Api,
        name: &str,
        definition: &EndpointDefinition,
    ) -> Result<(), ApiError>;
}

/// Creates the runtime endpoint for each definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreModule;

impl CoreModule {
    pub const NAME: &'static str = "core";
}

impl Module for CoreModule {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn inject_endpoint(
        &self,
        api: &mut Api,
        name: &str,
        definition: &EndpointDefinition,
    ) -> Result<(), ApiError> {
        let endpoint = ApiEndpoint {
            name: name.to_string(),
            kind: definition.kind,
            arg_type: definition.arg_type,
            result_type: definition.result_type,
            query: Arc::clone(&definition.query),
            base_query: api.base_query.clone(),
            extensions: Extensions::new(),
        };
        api.endpoints.insert(name.to_string(), endpoint);
        Ok(())
    }
}

/// Options shared by every endpoint of an api.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub reducer_path: String,
    pub base_query: FetchBaseQuery,
}

impl ApiOptions {
    pub fn new(base_query: FetchBaseQuery) -> Self {
        Self {
            reducer_path: "api".to_string(),
            base_query,
        }
    }
}

/// Assembled api: the runtime endpoints plus the modules that built them.
pub struct Api {
    reducer_path: String,
    base_query: FetchBaseQuery,
    endpoints: BTreeMap<String, ApiEndpoint>,
    modules: Arc<[Arc<dyn Module>]>,
    extensions: Extensions,
}

impl Api {
    pub fn reducer_path(&self) -> &str {
        &self.reducer_path
    }

    pub fn base_query(&self) -> &FetchBaseQuery {
        &self.base_query
    }

    pub fn endpoint(&self, name: &str) -> Result<&ApiEndpoint, ApiError> {
        self.endpoints
            .get(name)
            .ok_or_else(|| ApiError::UnknownEndpoint(name.to_string()))
    }

    /// Mutable access for modules extending an endpoint.
    pub fn endpoint_mut(&mut self, name: &str) -> Option<&mut ApiEndpoint> {
        self.endpoints.get_mut(name)
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &ApiEndpoint> {
        self.endpoints.values()
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Api-wide state owned by modules.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Add endpoints after creation, running every module over each one.
    ///
    /// A name that is already defined is rejected unless `override_existing`
    /// is set.
    pub fn inject_endpoints<F, I, S>(&mut self, endpoints: F, override_existing: bool) -> Result<(), ApiError>
    where
        F: FnOnce(&EndpointBuilder) -> I,
        I: IntoIterator<Item = (S, EndpointDefinition)>,
        S: Into<String>,
    {
        let definitions = endpoints(&EndpointBuilder::default());
        self.inject(definitions, override_existing)
    }

    /// Run every module over `definitions`. The batch is all or nothing: on
    /// error, endpoints injected so far are removed and overridden ones are
    /// put back.
    fn inject<I, S>(&mut self, definitions: I, override_existing: bool) -> Result<(), ApiError>
    where
        I: IntoIterator<Item = (S, EndpointDefinition)>,
        S: Into<String>,
    {
        let modules = Arc::clone(&self.modules);
        let mut replaced: Vec<(String, Option<ApiEndpoint>)> = Vec::new();
        for (name, definition) in definitions {
            let name = name.into();
            if self.endpoints.contains_key(&name) && !override_existing {
                self.rollback(replaced);
                return Err(ApiError::DuplicateEndpoint(name));
            }
            let previous = self.endpoints.remove(&name);
            replaced.push((name.clone(), previous));
            for module in modules.iter() {
                tracing::trace!(module = module.name(), endpoint = %name, "inject endpoint");
                if let Err(e) = module.inject_endpoint(self, &name, &definition) {
                    tracing::debug!(module = module.name(), endpoint = %name, error = %e, "inject failed");
                    self.rollback(replaced);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn rollback(&mut self, replaced: Vec<(String, Option<ApiEndpoint>)>) {
        for (name, previous) in replaced.into_iter().rev() {
            match previous {
                Some(endpoint) => {
                    self.endpoints.insert(name, endpoint);
                }
                None => {
                    self.endpoints.remove(&name);
                }
            }
        }
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("reducer_path", &self.reducer_path)
            .field("base_query", &self.base_query)
            .field("endpoints", &self.endpoints.keys().collect::<Vec<_>>())
            .field("modules", &self.module_names())
            .finish()
    }
}

/// Creates apis with a fixed module pipeline.
#[derive(Clone)]
pub struct ApiFactory {
    modules: Arc<[Arc<dyn Module>]>,
}

impl ApiFactory {
    pub fn create_api<F, I, S>(&self, options: ApiOptions, endpoints: F) -> Result<Api, ApiError>
    where
        F: FnOnce(&EndpointBuilder) -> I,
        I: IntoIterator<Item = (S, EndpointDefinition)>,
        S: Into<String>,
    {
        let mut api = Api {
            reducer_path: options.reducer_path,
            base_query: options.base_query,
            endpoints: BTreeMap::new(),
            modules: Arc::clone(&self.modules),
            extensions: Extensions::new(),
        };
        for module in self.modules.iter() {
            module.init(&mut api)?;
        }
        api.inject(endpoints(&EndpointBuilder::default()), false)?;
        tracing::debug!(
            reducer_path = %api.reducer_path,
            endpoints = api.endpoints.len(),
            "created api"
        );
        Ok(api)
    }
}

/// Build a factory whose apis run `modules` in the given order.
pub fn build_create_api(modules: Vec<Arc<dyn Module>>) -> ApiFactory {
    ApiFactory {
        modules: modules.into(),
    }
}

/// Create an api with only the core module installed.
pub fn create_api<F, I, S>(options: ApiOptions, endpoints: F) -> Result<Api, ApiError>
where
    F: FnOnce(&EndpointBuilder) -> I,
    I: IntoIterator<Item = (S, EndpointDefinition)>,
    S: Into<String>,
{
    build_create_api(vec![Arc::new(CoreModule)]).create_api(options, endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Pokemon {
        id: u32,
        name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct ByName {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Tag(&'static str);

    /// Requires the core endpoint and copies the definition's tag onto it.
    struct TagModule;

    impl Module for TagModule {
        fn name(&self) -> &'static str {
            "tagModule"
        }

        fn inject_endpoint(
            &self,
            api: &mut Api,
            name: &str,
            definition: &EndpointDefinition,
        ) -> Result<(), ApiError> {
            let tag = definition.extensions().get::<Tag>().cloned();
            let endpoint = api.endpoint_mut(name).ok_or(ApiError::ModuleOrder {
                required: CoreModule::NAME,
                module: "tagModule",
            })?;
            if let Some(tag) = tag {
                endpoint.extensions_mut().insert(tag);
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    struct Reject;

    /// Fails for definitions carrying `Reject`.
    struct RejectModule;

    impl Module for RejectModule {
        fn name(&self) -> &'static str {
            "rejectModule"
        }

        fn inject_endpoint(
            &self,
            _api: &mut Api,
            name: &str,
            definition: &EndpointDefinition,
        ) -> Result<(), ApiError> {
            match definition.extensions().get::<Reject>() {
                Some(_) => Err(ApiError::InvalidParams(format!("{name} rejected"))),
                None => Ok(()),
            }
        }
    }

    fn options() -> ApiOptions {
        ApiOptions::new(FetchBaseQuery::new("https://pokeapi.co/api/v2/"))
    }

    fn pokemon_api() -> Api {
        create_api(options(), |builder| {
            vec![
                ("getPokemon", builder.query::<Vec<Pokemon>, (), _, _>(|_| "/pokemon")),
                (
                    "getPokemonByName",
                    builder.query::<Pokemon, String, _, _>(|name| format!("/pokemon/{name}")),
                ),
            ]
        })
        .unwrap()
    }

    #[test]
    fn core_module_creates_endpoints() {
        let api = pokemon_api();
        assert_eq!(api.reducer_path(), "api");
        assert_eq!(api.module_names(), vec!["core"]);
        let names: Vec<&str> = api.endpoints().map(|e| e.name()).collect();
        assert_eq!(names, vec!["getPokemon", "getPokemonByName"]);
        assert_eq!(
            api.endpoint("getPokemon").unwrap().kind(),
            EndpointKind::Query
        );
    }

    #[test]
    fn initiate_builds_request() {
        let api = pokemon_api();
        let req = api
            .endpoint("getPokemonByName")
            .unwrap()
            .initiate(&"bulbasaur".to_string())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://pokeapi.co/api/v2/pokemon/bulbasaur");
    }

    #[test]
    fn initiate_rejects_wrong_argument_type() {
        let api = pokemon_api();
        let err = api
            .endpoint("getPokemonByName")
            .unwrap()
            .initiate(&42u32)
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::ArgumentType { ref endpoint, expected } if endpoint == "getPokemonByName" && expected.ends_with("String")
        ));
    }

    #[test]
    fn unknown_endpoint_is_an_error() {
        let err = pokemon_api().endpoint("missing").unwrap_err();
        assert!(matches!(err, ApiError::UnknownEndpoint(name) if name == "missing"));
    }

    #[test]
    fn parse_decodes_result() {
        let api = pokemon_api();
        let pokemon: Pokemon = api
            .endpoint("getPokemonByName")
            .unwrap()
            .parse(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: r#"{"id":1,"name":"bulbasaur"}"#.to_string(),
            })
            .unwrap();
        assert_eq!(
            pokemon,
            Pokemon {
                id: 1,
                name: "bulbasaur".to_string()
            }
        );
    }

    #[test]
    fn descriptor_backs_definition() {
        let by_name = Endpoint::<ByName, Pokemon>::new(HttpMethod::Get, "/pokemon/:name");
        let api = create_api(options(), |builder| {
            [("getPokemonByName", builder.query_endpoint(&by_name))]
        })
        .unwrap();
        let arg = Arg::new(ByName {
            name: "bulbasaur".to_string(),
        });
        let req = api.endpoint("getPokemonByName").unwrap().initiate(&arg).unwrap();
        assert_eq!(req.url, "https://pokeapi.co/api/v2/pokemon/bulbasaur");
        assert!(req.body.is_none());
    }

    #[test]
    fn modules_run_in_registration_order() {
        let factory = build_create_api(vec![Arc::new(CoreModule), Arc::new(TagModule)]);
        let api = factory
            .create_api(options(), |builder| {
                vec![
                    (
                        "tagged",
                        builder
                            .query::<(), (), _, _>(|_| "/a")
                            .with_extension(Tag("a")),
                    ),
                    ("plain", builder.query::<(), (), _, _>(|_| "/b")),
                ]
            })
            .unwrap();
        assert_eq!(
            api.endpoint("tagged").unwrap().extensions().get::<Tag>(),
            Some(&Tag("a"))
        );
        assert!(api.endpoint("plain").unwrap().extensions().get::<Tag>().is_none());
    }

    #[test]
    fn dependent_module_before_core_fails() {
        let factory = build_create_api(vec![Arc::new(TagModule), Arc::new(CoreModule)]);
        let err = factory
            .create_api(options(), |builder| {
                [("getPokemon", builder.query::<(), (), _, _>(|_| "/pokemon"))]
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "core module should be before tagModule");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = create_api(options(), |builder| {
            vec![
                ("getPokemon", builder.query::<(), (), _, _>(|_| "/a")),
                ("getPokemon", builder.query::<(), (), _, _>(|_| "/b")),
            ]
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEndpoint(name) if name == "getPokemon"));
    }

    #[test]
    fn inject_endpoints_after_creation() {
        let mut api = pokemon_api();
        api.inject_endpoints(
            |builder| {
                [(
                    "deletePokemon",
                    builder.mutation::<(), String, _, _>(|name| {
                        FetchArgs::new(HttpMethod::Delete, format!("/pokemon/{name}"))
                    }),
                )]
            },
            false,
        )
        .unwrap();
        let endpoint = api.endpoint("deletePokemon").unwrap();
        assert_eq!(endpoint.kind(), EndpointKind::Mutation);
        let req = endpoint.initiate(&"mew".to_string()).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);

        let err = api
            .inject_endpoints(
                |builder| [("getPokemon", builder.query::<(), (), _, _>(|_| "/x"))],
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEndpoint(_)));

        api.inject_endpoints(
            |builder| [("getPokemon", builder.query::<(), (), _, _>(|_| "/x"))],
            true,
        )
        .unwrap();
        let req = api.endpoint("getPokemon").unwrap().initiate(&()).unwrap();
        assert_eq!(req.url, "https://pokeapi.co/api/v2/x");
    }

    #[test]
    fn failed_injection_leaves_api_unchanged() {
        let factory = build_create_api(vec![Arc::new(CoreModule), Arc::new(RejectModule)]);
        let mut api = factory
            .create_api(options(), |builder| {
                [("getPokemon", builder.query::<(), (), _, _>(|_| "/pokemon"))]
            })
            .unwrap();

        let err = api
            .inject_endpoints(
                |builder| {
                    vec![
                        ("getBerries", builder.query::<(), (), _, _>(|_| "/berries")),
                        (
                            "getPokemon",
                            builder
                                .query::<(), (), _, _>(|_| "/x")
                                .with_extension(Reject),
                        ),
                    ]
                },
                true,
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidParams(_)));

        assert!(matches!(
            api.endpoint("getBerries").unwrap_err(),
            ApiError::UnknownEndpoint(_)
        ));
        let req = api.endpoint("getPokemon").unwrap().initiate(&()).unwrap();
        assert_eq!(req.url, "https://pokeapi.co/api/v2/pokemon");
    }
}
