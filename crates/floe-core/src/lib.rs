#![forbid(unsafe_code)]
//! floe-core: the pure kernel of the floe table format.
//!
//! This crate contains only immutable value types and pure functions: the
//! type lattice, schemas with stable field ids, typed literals and their
//! conversion lattice, partition transforms, predicate expressions, and the
//! binding/projection machinery between row space and partition space.
//! There is **no I/O** and **no async** here.
//!
//! Crates that use this:
//! - floe-meta: schema evolution, JSON wire formats, and the metadata-store
//!   seam are layered on top of these types.
//! - file codecs and table-level APIs are external; they consume schemas and
//!   projected predicates and supply row readers and metadata pointers.
//!
//! Finished values (schemas, expressions, literals, transforms, specs) are
//! immutable and safe to share across threads.

pub mod error;
pub mod evaluate;
pub mod expr;
pub mod literal;
pub mod partition;
pub mod prelude;
pub mod projections;
pub mod schema;
pub mod transform;
pub mod types;
pub mod visit;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
