//! Convenient re-exports of the most commonly used types.

pub use crate::error::{Error, Result};
pub use crate::expr::{
    always_false, always_true, and, equal, greater_than, greater_than_or_equal, is_null,
    less_than, less_than_or_equal, not, not_equal, not_null, or, BoundPredicate, BoundReference,
    Expression, NamedReference, Operation, UnboundPredicate,
};
pub use crate::literal::{Converted, Literal};
pub use crate::partition::{PartitionField, PartitionSpec, PartitionSpecBuilder};
pub use crate::schema::Schema;
pub use crate::transform::Transform;
pub use crate::types::{ListType, MapType, NestedField, StructType, Type};
