// Read-through cache in front of a third-party catalog API.
// Serves pages of item ids and single items from a key-value store and refills it from upstream.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod upstream;

pub use error::{Error, ErrorKind, Result};
