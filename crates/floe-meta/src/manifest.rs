//! Manifest header metadata.
//!
//! Manifest files are written by an external codec; their key/value header
//! carries the schema and partition spec the entries were written with.
//! This module decodes that header into core types.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use floe_core::partition::PartitionSpec;
use floe_core::schema::Schema;

use crate::error::{Error, Result};
use crate::json;

pub const SCHEMA_KEY: &str = "schema";
pub const PARTITION_SPEC_KEY: &str = "partition-spec";

/// The decoded header of one manifest file.
#[derive(Debug, Clone)]
pub struct ManifestHeader {
    pub schema: Arc<Schema>,
    pub spec: PartitionSpec,
}

impl ManifestHeader {
    /// Decode the `schema` and `partition-spec` entries of a manifest's
    /// key/value metadata.
    pub fn parse(metadata: &HashMap<String, String>) -> Result<Self> {
        let schema_json = metadata
            .get(SCHEMA_KEY)
            .ok_or_else(|| Error::json(format!("Manifest metadata is missing: {SCHEMA_KEY}")))?;
        let spec_json = metadata.get(PARTITION_SPEC_KEY).ok_or_else(|| {
            Error::json(format!("Manifest metadata is missing: {PARTITION_SPEC_KEY}"))
        })?;

        let schema = Arc::new(json::schema_from_json(schema_json)?);
        let spec = json::spec_from_json(schema.clone(), spec_json)?;
        debug!(
            columns = schema.columns().len(),
            partition_fields = spec.fields().len(),
            "decoded manifest header"
        );
        Ok(Self { schema, spec })
    }
}
