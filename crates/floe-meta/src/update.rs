//! Batched schema evolution.
//!
//! A `SchemaUpdate` accumulates deletes, renames/type updates, and additions
//! against a base schema, validating each edit when it is issued. New column
//! ids come from a monotone counter seeded with the table's last column id,
//! so ids are never reused — not even across deletes. `apply` materializes
//! the new schema; `commit` hands it to the metadata store's compare-and-swap.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use floe_core::schema::{reassign_type_ids, Schema};
use floe_core::types::{ListType, MapType, NestedField, StructType, Type};
use floe_core::visit::{visit_schema_custom, CustomOrderVisitor, FieldFutures, VisitFuture};

use crate::error::{Error, Result};
use crate::metadata::{MetadataStore, TableMetadata};

const TABLE_ROOT_ID: i32 = -1;

/// Schema evolution builder. Failed edits leave the builder untouched, so a
/// caller may continue issuing edits after an error.
pub struct SchemaUpdate {
    schema: Arc<Schema>,
    base: Option<TableMetadata>,
    deletes: HashSet<i32>,
    updates: HashMap<i32, NestedField>,
    adds: HashMap<i32, Vec<NestedField>>,
    last_column_id: i32,
}

impl SchemaUpdate {
    pub fn new(schema: Arc<Schema>, last_column_id: i32) -> Self {
        Self {
            schema,
            base: None,
            deletes: HashSet::new(),
            updates: HashMap::new(),
            adds: HashMap::new(),
            last_column_id,
        }
    }

    /// Start an update against the store's current metadata; `commit` will
    /// compare-and-swap against that base.
    pub fn for_store(store: &dyn MetadataStore) -> Self {
        let base = store.current();
        let mut update = Self::new(base.schema().clone(), base.last_column_id());
        update.base = Some(base);
        update
    }

    /// Add an optional top-level column. The name must not be dotted; use
    /// [`SchemaUpdate::add_column_to`] to add inside a struct.
    pub fn add_column(&mut self, name: &str, field_type: Type) -> Result<&mut Self> {
        if name.contains('.') {
            return Err(Error::validation(format!(
                "Cannot add column with ambiguous name: {name}; use add_column_to(parent, name, type)"
            )));
        }
        self.add_to_parent(None, name, field_type)
    }

    /// Add an optional column under the named parent struct. List and map
    /// parents resolve to their element and value structs.
    pub fn add_column_to(
        &mut self,
        parent: &str,
        name: &str,
        field_type: Type,
    ) -> Result<&mut Self> {
        self.add_to_parent(Some(parent), name, field_type)
    }

    fn add_to_parent(
        &mut self,
        parent: Option<&str>,
        name: &str,
        field_type: Type,
    ) -> Result<&mut Self> {
        let parent_id = match parent {
            Some(parent_name) => {
                let found = self.schema.find_field(parent_name).ok_or_else(|| {
                    Error::validation(format!("Cannot find parent struct: {parent_name}"))
                })?;
                let parent_field = match &found.field_type {
                    // Fields are added to the element struct of a list and
                    // the value struct of a map.
                    Type::List(list) => list.element_field(),
                    Type::Map(map) => map.value_field(),
                    _ => found.clone(),
                };
                if !parent_field.field_type.is_struct() {
                    return Err(Error::validation(format!(
                        "Cannot add to non-struct column: {parent_name}: {}",
                        parent_field.field_type
                    )));
                }
                if self.deletes.contains(&parent_field.id) {
                    return Err(Error::validation(format!(
                        "Cannot add to a column that will be deleted: {parent_name}"
                    )));
                }
                if self
                    .schema
                    .find_field(&format!("{parent_name}.{name}"))
                    .is_some()
                {
                    return Err(Error::validation(format!(
                        "Cannot add column, name already exists: {parent_name}.{name}"
                    )));
                }
                parent_field.id
            }
            None => {
                if self.schema.find_field(name).is_some() {
                    return Err(Error::validation(format!(
                        "Cannot add column, name already exists: {name}"
                    )));
                }
                TABLE_ROOT_ID
            }
        };

        // The new column takes the next id; ids nested inside its type are
        // reassigned from the same counter before the type is stored.
        let new_id = self.assign_new_column_id();
        let mut last_column_id = self.last_column_id;
        let mut next_id = || {
            last_column_id += 1;
            last_column_id
        };
        let reassigned = reassign_type_ids(&field_type, &mut next_id);
        self.last_column_id = last_column_id;

        self.adds
            .entry(parent_id)
            .or_default()
            .push(NestedField::optional(new_id, name, reassigned));
        Ok(self)
    }

    pub fn delete_column(&mut self, name: &str) -> Result<&mut Self> {
        let field_id = self
            .schema
            .find_field(name)
            .ok_or_else(|| Error::validation(format!("Cannot delete missing column: {name}")))?
            .id;
        if self.adds.contains_key(&field_id) {
            return Err(Error::validation(format!(
                "Cannot delete a column that has additions: {name}"
            )));
        }
        if self.updates.contains_key(&field_id) {
            return Err(Error::validation(format!(
                "Cannot delete a column that has updates: {name}"
            )));
        }
        self.deletes.insert(field_id);
        Ok(self)
    }

    pub fn rename_column(&mut self, name: &str, new_name: &str) -> Result<&mut Self> {
        let field = self
            .schema
            .find_field(name)
            .ok_or_else(|| Error::validation(format!("Cannot rename missing column: {name}")))?
            .clone();
        if self.deletes.contains(&field.id) {
            return Err(Error::validation(format!(
                "Cannot rename a column that will be deleted: {}",
                field.name
            )));
        }
        // Merge with a pending type update so one record carries both.
        let field_type = self
            .updates
            .get(&field.id)
            .map(|update| update.field_type.clone())
            .unwrap_or(field.field_type);
        self.updates
            .insert(field.id, NestedField::required(field.id, new_name, field_type));
        Ok(self)
    }

    /// Update a column to a wider primitive type. Legal promotions are
    /// int to long, float to double, and decimal precision widening at the
    /// same scale; updating to the current type is a no-op.
    pub fn update_column(&mut self, name: &str, new_type: Type) -> Result<&mut Self> {
        let field = self
            .schema
            .find_field(name)
            .ok_or_else(|| Error::validation(format!("Cannot update missing column: {name}")))?
            .clone();
        if self.deletes.contains(&field.id) {
            return Err(Error::validation(format!(
                "Cannot update a column that will be deleted: {}",
                field.name
            )));
        }
        if !is_promotion_allowed(&field.field_type, &new_type) {
            return Err(Error::validation(format!(
                "Cannot change column type: {name}: {} -> {}",
                field.field_type, new_type
            )));
        }
        // Merge with a pending rename.
        let record_name = self
            .updates
            .get(&field.id)
            .map(|update| update.name.clone())
            .unwrap_or(field.name);
        self.updates
            .insert(field.id, NestedField::required(field.id, record_name, new_type));
        Ok(self)
    }

    /// The result of applying all pending changes to the base schema. Does
    /// not touch the store.
    pub fn apply(&self) -> Schema {
        debug!(
            deletes = self.deletes.len(),
            updates = self.updates.len(),
            adds = self.adds.values().map(Vec::len).sum::<usize>(),
            "applying schema changes"
        );
        let mut changes = ApplyChanges {
            deletes: &self.deletes,
            updates: &self.updates,
            adds: &self.adds,
        };
        match visit_schema_custom(&self.schema, &mut changes) {
            Some(Type::Struct(st)) => Schema::new(st.fields),
            _ => unreachable!("schema root cannot be deleted"),
        }
    }

    pub fn last_column_id(&self) -> i32 {
        self.last_column_id
    }

    /// Apply the pending changes and compare-and-swap the store's metadata
    /// pointer. On [`Error::CommitConflict`], rebuild against the new base
    /// and retry.
    pub fn commit(&self, store: &dyn MetadataStore) -> Result<TableMetadata> {
        let base = self.base.clone().ok_or_else(|| {
            Error::validation("Cannot commit an update that was not started from a store")
        })?;
        let update = base.update_schema(self.apply(), self.last_column_id);
        store.commit(&base, update.clone())?;
        debug!(
            version = update.version(),
            last_column_id = update.last_column_id(),
            "committed schema update"
        );
        Ok(update)
    }

    fn assign_new_column_id(&mut self) -> i32 {
        self.last_column_id += 1;
        self.last_column_id
    }
}

fn is_promotion_allowed(current: &Type, new_type: &Type) -> bool {
    // A promotion must not change partitioning results for existing specs.
    if current == new_type {
        return true;
    }
    match (current, new_type) {
        (Type::Int, Type::Long) => true,
        (Type::Float, Type::Double) => true,
        (
            Type::Decimal {
                precision: from_precision,
                scale: from_scale,
            },
            Type::Decimal {
                precision: to_precision,
                scale: to_scale,
            },
        ) => from_scale == to_scale && from_precision <= to_precision,
        _ => false,
    }
}

/// Reconstructs the schema tree with pending changes applied. A deleted
/// field yields no output; a struct that loses every field stays as an
/// empty struct; deleting a list's element or a map's value is malformed
/// and panics.
struct ApplyChanges<'a> {
    deletes: &'a HashSet<i32>,
    updates: &'a HashMap<i32, NestedField>,
    adds: &'a HashMap<i32, Vec<NestedField>>,
}

impl CustomOrderVisitor for ApplyChanges<'_> {
    type Output = Option<Type>;

    fn schema(&mut self, _schema: &Schema, result: VisitFuture<'_>) -> Option<Type> {
        let root = result
            .invoke(self)
            .unwrap_or_else(|| unreachable!("schema root cannot be deleted"));
        match self.adds.get(&TABLE_ROOT_ID) {
            Some(new_columns) => Some(add_fields(root.as_struct(), new_columns)),
            None => Some(root),
        }
    }

    fn r#struct(&mut self, st: &StructType, fields: FieldFutures<'_>) -> Option<Type> {
        let mut new_fields = Vec::with_capacity(st.fields.len());
        for (field, future) in st.fields.iter().zip(fields) {
            let Some(field_type) = future.invoke(self) else {
                continue;
            };
            let name = self
                .updates
                .get(&field.id)
                .map(|update| update.name.clone())
                .unwrap_or_else(|| field.name.clone());
            new_fields.push(NestedField {
                id: field.id,
                name,
                optional: field.optional,
                field_type,
            });
        }
        Some(Type::Struct(StructType::new(new_fields)))
    }

    fn field(&mut self, field: &NestedField, result: VisitFuture<'_>) -> Option<Type> {
        // Edits were validated not to conflict when they were issued.
        if self.deletes.contains(&field.id) {
            return None;
        }
        if let Some(update) = self.updates.get(&field.id) {
            if update.field_type != field.field_type {
                // Type updates are primitive promotions; renames are applied
                // by the enclosing struct.
                return Some(update.field_type.clone());
            }
        }
        let result = result.invoke(self);
        if let Some(new_fields) = self.adds.get(&field.id) {
            let field_type = result.unwrap_or_else(|| {
                unreachable!("field with additions cannot be deleted")
            });
            return Some(add_fields(field_type.as_struct(), new_fields));
        }
        result
    }

    fn list(&mut self, list: &ListType, element: VisitFuture<'_>) -> Option<Type> {
        // Route the element through `field` so deletes, updates, and adds
        // apply to it like any other field.
        let element_type = self
            .field(&list.element_field(), element)
            .unwrap_or_else(|| {
                panic!("Cannot delete element type from list: {}", list.element_id)
            });
        Some(if element_type == *list.element_type {
            Type::List(list.clone())
        } else if list.element_optional {
            Type::List(ListType::of_optional(list.element_id, element_type))
        } else {
            Type::List(ListType::of_required(list.element_id, element_type))
        })
    }

    fn map(&mut self, map: &MapType, value: VisitFuture<'_>) -> Option<Type> {
        let value_type = self.field(&map.value_field(), value).unwrap_or_else(|| {
            panic!("Cannot delete value type from map: {}", map.value_id)
        });
        Some(if value_type == *map.value_type {
            Type::Map(map.clone())
        } else if map.value_optional {
            Type::Map(MapType::of_optional(
                map.key_id,
                map.value_id,
                (*map.key_type).clone(),
                value_type,
            ))
        } else {
            Type::Map(MapType::of_required(
                map.key_id,
                map.value_id,
                (*map.key_type).clone(),
                value_type,
            ))
        })
    }

    fn primitive(&mut self, primitive: &Type) -> Option<Type> {
        Some(primitive.clone())
    }
}

fn add_fields(st: &StructType, adds: &[NestedField]) -> Type {
    let mut fields = st.fields.clone();
    fields.extend(adds.iter().cloned());
    Type::Struct(StructType::new(fields))
}
