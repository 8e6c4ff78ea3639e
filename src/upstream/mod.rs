// Upstream catalog API module.
// Provides the signed HTTP client and response types.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{CatalogClient, DEFAULT_TIMEOUT, Signature, generate_hash};
