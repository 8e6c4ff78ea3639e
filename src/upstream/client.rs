// Catalog API HTTP client.
// Handles request signing, timeouts, and response status processing.

use std::time::Duration;

use md5::{Digest, Md5};
use reqwest::{Client, Response, StatusCode};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Path of the characters collection on the upstream API.
pub const CHARACTERS_PATH: &str = "/v1/public/characters";

/// Default timeout for a single upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request authentication parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Random per-request salt, sent as `ts`.
    pub ts: String,
    /// Hex digest of `ts ∥ private key ∥ public key`.
    pub hash: String,
}

/// Client for the upstream catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    public_key: String,
    private_key: String,
}

impl CatalogClient {
    /// Create a client. The timeout applies to this client only.
    pub fn new(
        base_url: &str,
        public_key: &str,
        private_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catalog-cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Upstream)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a fresh signature with a random salt.
    pub fn sign(&self) -> Signature {
        let ts = Uuid::new_v4().to_string();
        let hash = generate_hash(&ts, &self.public_key, &self.private_key);
        Signature { ts, hash }
    }

    /// Make a signed GET request with extra query parameters.
    pub async fn get_signed(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let signature = self.sign();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ts", signature.ts.as_str()),
                ("apikey", self.public_key.as_str()),
                ("hash", signature.hash.as_str()),
            ])
            .query(params)
            .send()
            .await
            .map_err(Error::Upstream)?;

        self.check_response(response).await
    }

    /// Check response status. Every non-200 status is reported as not found;
    /// the upstream body goes to the log only.
    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%status, url = %url, "upstream resource not found");
        } else {
            tracing::warn!(%status, url = %url, body = %body, "upstream request failed");
        }

        Err(Error::NotFound(url))
    }
}

/// Hex MD5 of `salt ∥ private key ∥ public key`, as the upstream API expects.
pub fn generate_hash(salt: &str, public_key: &str, private_key: &str) -> String {
    let digest = Md5::digest(format!("{}{}{}", salt, private_key, public_key).as_bytes());
    hex::encode(digest)
}
