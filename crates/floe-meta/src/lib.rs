#![forbid(unsafe_code)]
//! floe-meta: the metadata layer over the floe-core kernel.
//!
//! Schema evolution, the JSON wire formats for schemas and partition specs,
//! manifest header decoding, and the compare-and-swap metadata-store seam.
//! Everything here is synchronous; the store trait is the only boundary to
//! the outside world and its implementations live elsewhere.

pub mod error;
pub mod json;
pub mod manifest;
pub mod metadata;
pub mod update;

pub use error::{Error, Result};
pub use manifest::ManifestHeader;
pub use metadata::{MemoryStore, MetadataStore, TableMetadata};
pub use update::SchemaUpdate;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
