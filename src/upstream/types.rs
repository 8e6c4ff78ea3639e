// Upstream API response types.
// Defines structs for deserializing the catalog API envelope.

use chrono::Utc;
use serde::Deserialize;

use crate::catalog::Item;

/// Top-level response wrapper: `{ "data": { "results": [...] } }`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub data: DataContainer,
}

/// Result container inside the envelope.
#[derive(Debug, Default, Deserialize)]
pub struct DataContainer {
    #[serde(default)]
    pub results: Vec<Character>,
}

/// A single result as returned by the upstream API.
#[derive(Debug, Clone, Deserialize)]
pub struct Character {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<Character> for Item {
    fn from(character: Character) -> Self {
        Item {
            id: character.id,
            name: character.name.unwrap_or_default(),
            description: character.description.unwrap_or_default(),
            fetched_at: Utc::now(),
        }
    }
}
