//! Pokemon demo: endpoint declarations and the mocks derived from them.
//!
//! Served by the binary and reused by the integration tests. State lives in
//! a shared map keyed by pokemon name.

use std::collections::BTreeMap;
use std::sync::Arc;

use endpoint_core::{Endpoint, FetchOverrides, HttpMethod, NoParams};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use crate::endpoint_ext::EndpointMock;
use crate::handler::HttpHandler;
use crate::response::{MockResponse, ResponseInit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
}

/// Partial update; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PokemonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByName {
    pub name: String,
}

pub type Db = Arc<RwLock<BTreeMap<String, Pokemon>>>;

#[derive(Debug, Clone)]
pub struct PokemonEndpoints {
    pub get_pokemon: Endpoint<NoParams, Vec<Pokemon>>,
    pub get_pokemon_by_name: Endpoint<ByName, Pokemon>,
    pub update_pokemon: Endpoint<ByName, Pokemon, PokemonPatch>,
}

impl PokemonEndpoints {
    pub fn new() -> Self {
        Self {
            get_pokemon: Endpoint::new(HttpMethod::Get, "/pokemon"),
            get_pokemon_by_name: Endpoint::new(HttpMethod::Get, "/pokemon/:name"),
            update_pokemon: Endpoint::new(HttpMethod::Patch, "/pokemon/:name").with_fetch_args(
                |params: &ByName| FetchOverrides::default().header("X-NAME", params.name.clone()),
            ),
        }
    }
}

impl Default for PokemonEndpoints {
    fn default() -> Self {
        Self::new()
    }
}

/// The first three pokedex entries.
pub fn seed() -> Db {
    let db: BTreeMap<String, Pokemon> = ["bulbasaur", "ivysaur", "venusaur"]
        .into_iter()
        .zip(1..)
        .map(|(name, id)| {
            (
                name.to_string(),
                Pokemon {
                    id,
                    name: name.to_string(),
                },
            )
        })
        .collect();
    Arc::new(RwLock::new(db))
}

fn error(status: u16, message: &str) -> MockResponse {
    MockResponse::json(&json!({ "error": message }), ResponseInit::status(status))
}

pub fn handlers(endpoints: &PokemonEndpoints, db: Db) -> Vec<HttpHandler> {
    let list_db = Arc::clone(&db);
    let list = endpoints.get_pokemon.mock(move |info| {
        let db = Arc::clone(&list_db);
        async move {
            let all: Vec<Pokemon> = db.read().await.values().cloned().collect();
            Ok(info.json(all))
        }
    });

    let get_db = Arc::clone(&db);
    let get_by_name = endpoints.get_pokemon_by_name.mock(move |info| {
        let db = Arc::clone(&get_db);
        async move {
            match db.read().await.get(&info.params.name) {
                Some(pokemon) => Ok(info.json(pokemon.clone())),
                None => Err(error(404, "not found")),
            }
        }
    });

    let update = endpoints.update_pokemon.mock(move |info| {
        let db = Arc::clone(&db);
        async move {
            let patch = match info.body() {
                Ok(patch) => patch,
                Err(e) => return Err(e.into_mock_response()),
            };
            if patch.name.as_deref() == Some("") {
                return Err(error(500, "failed"));
            }

            let mut pokemon = db.write().await;
            let Some(mut updated) = pokemon.remove(&info.params.name) else {
                return Err(error(404, "not found"));
            };
            if let Some(name) = patch.name {
                updated.name = name;
            }
            pokemon.insert(updated.name.clone(), updated.clone());
            Ok(info.json(updated))
        }
    });

    vec![list, get_by_name, update]
}
