//! Partition specs: an ordered list of (source column, transform) pairs
//! producing the partition columns of a table.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::transform::Transform;
use crate::types::{NestedField, StructType};

/// Partition field ids are issued from a range disjoint from data-schema
/// field ids.
pub const PARTITION_DATA_ID_START: i32 = 1000;

/// One partition column: the source data field, the transform, and the
/// partition column name.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionField {
    pub source_id: i32,
    pub transform: Transform,
    pub name: String,
}

impl fmt::Display for PartitionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}({})", self.name, self.transform, self.source_id)
    }
}

/// An ordered list of partition fields over a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionSpec {
    spec_id: i32,
    schema: Arc<Schema>,
    fields: Vec<PartitionField>,
}

impl PartitionSpec {
    pub fn builder(schema: Arc<Schema>) -> PartitionSpecBuilder {
        PartitionSpecBuilder {
            schema,
            spec_id: 0,
            fields: Vec::new(),
        }
    }

    /// The empty spec: every file belongs to the same (sole) partition.
    pub fn unpartitioned(schema: Arc<Schema>) -> Self {
        Self {
            spec_id: 0,
            schema,
            fields: Vec::new(),
        }
    }

    pub fn spec_id(&self) -> i32 {
        self.spec_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn fields(&self) -> &[PartitionField] {
        &self.fields
    }

    pub fn is_unpartitioned(&self) -> bool {
        self.fields.is_empty()
    }

    /// Partition fields whose source is the given data field.
    pub fn fields_for_source(&self, source_id: i32) -> impl Iterator<Item = &PartitionField> {
        self.fields.iter().filter(move |f| f.source_id == source_id)
    }

    /// The struct type of partition tuples. Field ids come from the reserved
    /// partition range; the struct is an ordinary member of the type lattice.
    pub fn partition_type(&self) -> StructType {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let source = self
                    .schema
                    .find_type(field.source_id)
                    .unwrap_or_else(|| panic!("unknown source field id: {}", field.source_id));
                NestedField::optional(
                    PARTITION_DATA_ID_START + i as i32,
                    field.name.clone(),
                    field.transform.result_type(source),
                )
            })
            .collect();
        StructType::new(fields)
    }
}

/// Validating builder for partition specs.
pub struct PartitionSpecBuilder {
    schema: Arc<Schema>,
    spec_id: i32,
    fields: Vec<PartitionField>,
}

impl PartitionSpecBuilder {
    pub fn with_spec_id(mut self, spec_id: i32) -> Self {
        self.spec_id = spec_id;
        self
    }

    /// Add a partition field over the named source column.
    pub fn add(
        self,
        source_name: &str,
        target_name: impl Into<String>,
        transform: Transform,
    ) -> Result<Self> {
        let source = self
            .schema
            .find_field(source_name)
            .ok_or_else(|| {
                Error::validation(format!("Cannot find source column: {source_name}"))
            })?
            .clone();
        self.push(source, target_name.into(), transform)
    }

    /// Add a partition field over a source column identified by field id,
    /// as read from serialized specs.
    pub fn add_by_source_id(
        self,
        source_id: i32,
        target_name: impl Into<String>,
        transform: Transform,
    ) -> Result<Self> {
        let source = self
            .schema
            .find_field_by_id(source_id)
            .ok_or_else(|| {
                Error::validation(format!("Cannot find source column id: {source_id}"))
            })?
            .clone();
        self.push(source, target_name.into(), transform)
    }

    fn push(mut self, source: NestedField, target_name: String, transform: Transform) -> Result<Self> {
        if target_name.is_empty() {
            return Err(Error::validation("Partition field name cannot be empty"));
        }
        if self.fields.iter().any(|f| f.name == target_name) {
            return Err(Error::validation(format!(
                "Partition field name already used: {target_name}"
            )));
        }
        if !transform.can_transform(&source.field_type) {
            return Err(Error::validation(format!(
                "Cannot partition by {} on type {}: {}",
                transform, source.field_type, source.name
            )));
        }
        self.fields.push(PartitionField {
            source_id: source.id,
            transform,
            name: target_name,
        });
        Ok(self)
    }

    pub fn identity(self, source_name: &str) -> Result<Self> {
        self.add(source_name, source_name.to_string(), Transform::Identity)
    }

    pub fn bucket(self, source_name: &str, buckets: u32) -> Result<Self> {
        self.add(
            source_name,
            format!("{source_name}_bucket"),
            Transform::Bucket(buckets),
        )
    }

    pub fn truncate(self, source_name: &str, width: u32) -> Result<Self> {
        self.add(
            source_name,
            format!("{source_name}_trunc"),
            Transform::Truncate(width),
        )
    }

    pub fn year(self, source_name: &str) -> Result<Self> {
        self.add(source_name, format!("{source_name}_year"), Transform::Year)
    }

    pub fn month(self, source_name: &str) -> Result<Self> {
        self.add(source_name, format!("{source_name}_month"), Transform::Month)
    }

    pub fn day(self, source_name: &str) -> Result<Self> {
        self.add(source_name, format!("{source_name}_day"), Transform::Day)
    }

    pub fn hour(self, source_name: &str) -> Result<Self> {
        self.add(source_name, format!("{source_name}_hour"), Transform::Hour)
    }

    pub fn build(self) -> PartitionSpec {
        PartitionSpec {
            spec_id: self.spec_id,
            schema: self.schema,
            fields: self.fields,
        }
    }
}
