// Catalog API endpoint functions.
// Provides typed methods for fetching pages and single items.

use reqwest::Response;

use crate::catalog::Item;
use crate::error::{Error, Result};

use super::client::{CHARACTERS_PATH, CatalogClient};
use super::types::{Character, Envelope};

impl CatalogClient {
    /// Fetch one page of items starting at `offset`.
    pub async fn fetch_page(&self, offset: u64, limit: u32) -> Result<Vec<Item>> {
        let params = [("offset", offset.to_string()), ("limit", limit.to_string())];
        let response = self.get_signed(CHARACTERS_PATH, &params).await?;
        let results = decode_results(response, CHARACTERS_PATH).await?;
        Ok(results.into_iter().map(Item::from).collect())
    }

    /// Fetch a single item by id.
    pub async fn fetch_item(&self, id: u64) -> Result<Item> {
        let endpoint = format!("{}/{}", CHARACTERS_PATH, id);
        let response = self.get_signed(&endpoint, &[]).await?;
        let results = decode_results(response, &endpoint).await?;
        results
            .into_iter()
            .next()
            .map(Item::from)
            .ok_or(Error::NotFound(endpoint))
    }
}

/// Decode the envelope, treating an empty result list as not found.
async fn decode_results(response: Response, endpoint: &str) -> Result<Vec<Character>> {
    let body = response.text().await?;
    let envelope: Envelope = serde_json::from_str(&body)?;
    if envelope.data.results.is_empty() {
        return Err(Error::NotFound(endpoint.to_string()));
    }
    Ok(envelope.data.results)
}
