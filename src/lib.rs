#![forbid(unsafe_code)]
//! floe: the typed schema, expression, and partitioning core of a table
//! format, in two layers.
//!
//! - [`floe_core`] holds the pure kernel: the type lattice, schemas with
//!   stable field ids, typed literals, partition transforms, predicate
//!   expressions, and binding/projection between row space and partition
//!   space.
//! - [`floe_meta`] layers schema evolution, the JSON wire formats, manifest
//!   header decoding, and the metadata-store seam on top.
//!
//! This facade re-exports the common surface of both.

pub use floe_core;
pub use floe_meta;

pub use floe_core::prelude::*;
pub use floe_meta::{ManifestHeader, MemoryStore, MetadataStore, SchemaUpdate, TableMetadata};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
