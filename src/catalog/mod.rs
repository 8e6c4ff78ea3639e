// Catalog module: population engine and read-through coordinator.
// Ties the upstream client to the cache store.

pub mod populate;
pub mod read_through;
pub mod types;

pub use populate::{
    DEFAULT_BATCH_SIZE, Populate, PopulateOptions, Populator, WarmupReport,
};
pub use read_through::{ReadThrough, ReadThroughOptions};
pub use types::{Item, PageIds};
