//! Schemas: an immutable struct tree with unique field ids plus derived
//! name and id indexes.
//!
//! Dotted names address nesting (`a.b`); list elements register under
//! `<parent>.element` and map keys/values under `.key` / `.value`. Fields
//! inside a container's element or value keep the container's path as their
//! prefix, without an `element`/`value` segment.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::types::{ListType, MapType, NestedField, StructType, Type};
use crate::visit::{
    visit_schema, visit_type, visit_type_custom, CustomOrderVisitor, FieldFutures, SchemaVisitor,
    VisitFuture,
};

/// An immutable schema: a struct type plus name and id indexes and optional
/// name aliases. Every field id in the tree appears in the id index exactly
/// once; constructing a schema with duplicate ids panics.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Type,
    aliases: Option<HashMap<String, i32>>,
    name_to_id: HashMap<String, i32>,
    id_to_field: HashMap<i32, NestedField>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        // Indexes are derived; the tree and aliases are the identity.
        self.root == other.root && self.aliases == other.aliases
    }
}

impl Schema {
    pub fn new(fields: Vec<NestedField>) -> Self {
        Self::with_aliases(fields, None)
    }

    pub fn with_aliases(fields: Vec<NestedField>, aliases: Option<HashMap<String, i32>>) -> Self {
        let root = Type::Struct(StructType::new(fields));
        let mut indexer = Indexer::default();
        visit_type(&root, &mut indexer);
        Self {
            root,
            aliases,
            name_to_id: indexer.by_name,
            id_to_field: indexer.by_id,
        }
    }

    pub fn as_struct(&self) -> &StructType {
        self.root.as_struct()
    }

    /// The root struct viewed as a `Type`, for traversal.
    pub fn root_type(&self) -> &Type {
        &self.root
    }

    pub fn columns(&self) -> &[NestedField] {
        &self.as_struct().fields
    }

    pub fn aliases(&self) -> Option<&HashMap<String, i32>> {
        self.aliases.as_ref()
    }

    /// Resolve a (possibly dotted) column name to its field, consulting the
    /// main name index first and aliases second.
    pub fn find_field(&self, name: &str) -> Option<&NestedField> {
        if let Some(id) = self.name_to_id.get(name) {
            return self.id_to_field.get(id);
        }
        if let Some(aliases) = &self.aliases {
            if let Some(id) = aliases.get(name) {
                return self.id_to_field.get(id);
            }
        }
        None
    }

    pub fn find_field_by_id(&self, id: i32) -> Option<&NestedField> {
        self.id_to_field.get(&id)
    }

    pub fn find_type(&self, id: i32) -> Option<&Type> {
        self.id_to_field.get(&id).map(|f| &f.field_type)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Builds the name and id indexes in a single pre-order traversal.
#[derive(Default)]
struct Indexer {
    names: Vec<String>,
    by_name: HashMap<String, i32>,
    by_id: HashMap<i32, NestedField>,
}

impl Indexer {
    fn add(&mut self, short_name: &str, field: NestedField) {
        let path = if self.names.is_empty() {
            short_name.to_string()
        } else {
            format!("{}.{}", self.names.join("."), short_name)
        };
        self.by_name.insert(path, field.id);
        if self.by_id.insert(field.id, field).is_some() {
            panic!("duplicate field id in schema: {}", self.names.join("."));
        }
    }
}

impl SchemaVisitor for Indexer {
    type Output = ();

    fn before_field(&mut self, field: &NestedField) {
        self.names.push(field.name.clone());
    }

    fn after_field(&mut self, _field: &NestedField) {
        self.names.pop();
    }

    fn r#struct(&mut self, st: &StructType, _results: Vec<()>) {
        for field in &st.fields {
            self.add(&field.name, field.clone());
        }
    }

    fn list(&mut self, list: &ListType, _element_result: ()) {
        self.add("element", list.element_field());
    }

    fn map(&mut self, map: &MapType, _value_result: ()) {
        self.add("key", map.key_field());
        self.add("value", map.value_field());
    }

    fn primitive(&mut self, _primitive: &Type) {}
}

/// Index a struct type by dotted name.
pub fn index_by_name(st: &StructType) -> HashMap<String, i32> {
    let mut indexer = Indexer::default();
    visit_type(&Type::Struct(st.clone()), &mut indexer);
    indexer.by_name
}

/// Index a struct type by field id.
pub fn index_by_id(st: &StructType) -> HashMap<i32, NestedField> {
    let mut indexer = Indexer::default();
    visit_type(&Type::Struct(st.clone()), &mut indexer);
    indexer.by_id
}

struct GetProjectedIds {
    ids: HashSet<i32>,
}

impl SchemaVisitor for GetProjectedIds {
    type Output = ();

    fn r#struct(&mut self, st: &StructType, _results: Vec<()>) {
        for field in &st.fields {
            self.ids.insert(field.id);
        }
    }

    fn list(&mut self, list: &ListType, _element_result: ()) {
        self.ids.insert(list.element_id);
    }

    fn map(&mut self, map: &MapType, _value_result: ()) {
        self.ids.insert(map.key_id);
        self.ids.insert(map.value_id);
    }

    fn primitive(&mut self, _primitive: &Type) {}
}

/// The set of all field ids appearing in the schema, including list element
/// and map key/value ids.
pub fn get_projected_ids(schema: &Schema) -> HashSet<i32> {
    let mut visitor = GetProjectedIds {
        ids: HashSet::new(),
    };
    visit_schema(schema, &mut visitor);
    visitor.ids
}

struct PruneColumns<'a> {
    ids: &'a HashSet<i32>,
}

impl SchemaVisitor for PruneColumns<'_> {
    type Output = Option<Type>;

    fn r#struct(&mut self, st: &StructType, field_results: Vec<Option<Type>>) -> Option<Type> {
        let mut selected = Vec::new();
        for (field, result) in st.fields.iter().zip(field_results) {
            if let Some(pruned) = result {
                if pruned == field.field_type {
                    selected.push(field.clone());
                } else {
                    selected.push(NestedField {
                        id: field.id,
                        name: field.name.clone(),
                        optional: field.optional,
                        field_type: pruned,
                    });
                }
            }
        }
        if selected.is_empty() {
            None
        } else {
            Some(Type::Struct(StructType::new(selected)))
        }
    }

    fn field(&mut self, field: &NestedField, result: Option<Type>) -> Option<Type> {
        if self.ids.contains(&field.id) {
            // Selecting a field keeps its whole subtree.
            Some(field.field_type.clone())
        } else {
            result
        }
    }

    fn list(&mut self, list: &ListType, element_result: Option<Type>) -> Option<Type> {
        if self.ids.contains(&list.element_id) {
            return Some(Type::List(list.clone()));
        }
        element_result.map(|element| {
            if element == *list.element_type {
                Type::List(list.clone())
            } else if list.element_optional {
                Type::List(ListType::of_optional(list.element_id, element))
            } else {
                Type::List(ListType::of_required(list.element_id, element))
            }
        })
    }

    fn map(&mut self, map: &MapType, value_result: Option<Type>) -> Option<Type> {
        if self.ids.contains(&map.value_id) || self.ids.contains(&map.key_id) {
            return Some(Type::Map(map.clone()));
        }
        value_result.map(|value| {
            if value == *map.value_type {
                Type::Map(map.clone())
            } else if map.value_optional {
                Type::Map(MapType::of_optional(
                    map.key_id,
                    map.value_id,
                    (*map.key_type).clone(),
                    value,
                ))
            } else {
                Type::Map(MapType::of_required(
                    map.key_id,
                    map.value_id,
                    (*map.key_type).clone(),
                    value,
                ))
            }
        })
    }

    fn primitive(&mut self, _primitive: &Type) -> Option<Type> {
        None
    }
}

/// Prune `schema` to the transitive closure of the requested ids. Field
/// order is preserved; containers survive while any descendant survives; a
/// struct with no surviving fields is omitted; aliases are kept.
pub fn select(schema: &Schema, ids: &HashSet<i32>) -> Schema {
    let mut visitor = PruneColumns { ids };
    let result = visit_schema(schema, &mut visitor);
    let aliases = schema.aliases().cloned();
    match result {
        Some(Type::Struct(st)) => Schema::with_aliases(st.fields, aliases),
        _ => Schema::with_aliases(Vec::new(), aliases),
    }
}

/// Select every field id except the given ones.
pub fn select_not(schema: &Schema, ids: &HashSet<i32>) -> Schema {
    let keep: HashSet<i32> = get_projected_ids(schema)
        .difference(ids)
        .copied()
        .collect();
    select(schema, &keep)
}

/// Concatenate the columns of two schemas.
pub fn join(left: &Schema, right: &Schema) -> Schema {
    let mut fields = left.columns().to_vec();
    fields.extend_from_slice(right.columns());
    Schema::new(fields)
}

struct ReassignIds<'a> {
    next_id: &'a mut dyn FnMut() -> i32,
}

impl CustomOrderVisitor for ReassignIds<'_> {
    type Output = Type;

    fn r#struct(&mut self, st: &StructType, fields: FieldFutures<'_>) -> Type {
        // Children are renumbered before their parents: evaluate every field
        // type first, then assign this struct's field ids in order.
        let types: Vec<Type> = fields.map(|future| future.invoke(self)).collect();
        let new_fields = st
            .fields
            .iter()
            .zip(types)
            .map(|(field, field_type)| NestedField {
                id: (self.next_id)(),
                name: field.name.clone(),
                optional: field.optional,
                field_type,
            })
            .collect();
        Type::Struct(StructType::new(new_fields))
    }

    fn list(&mut self, list: &ListType, element: VisitFuture<'_>) -> Type {
        let element_type = element.invoke(self);
        let element_id = (self.next_id)();
        if list.element_optional {
            Type::List(ListType::of_optional(element_id, element_type))
        } else {
            Type::List(ListType::of_required(element_id, element_type))
        }
    }

    fn map(&mut self, map: &MapType, value: VisitFuture<'_>) -> Type {
        let value_type = value.invoke(self);
        let key_id = (self.next_id)();
        let value_id = (self.next_id)();
        if map.value_optional {
            Type::Map(MapType::of_optional(
                key_id,
                value_id,
                (*map.key_type).clone(),
                value_type,
            ))
        } else {
            Type::Map(MapType::of_required(
                key_id,
                value_id,
                (*map.key_type).clone(),
                value_type,
            ))
        }
    }

    fn primitive(&mut self, primitive: &Type) -> Type {
        primitive.clone()
    }
}

/// Re-id a type bottom-up with a caller-provided id generator.
pub fn reassign_type_ids(field_type: &Type, next_id: &mut dyn FnMut() -> i32) -> Type {
    let mut visitor = ReassignIds { next_id };
    visit_type_custom(field_type, &mut visitor)
}

/// Re-id a whole schema bottom-up with a caller-provided id generator.
pub fn reassign_ids(schema: &Schema, next_id: &mut dyn FnMut() -> i32) -> Schema {
    match reassign_type_ids(schema.root_type(), next_id) {
        Type::Struct(st) => Schema::new(st.fields),
        _ => unreachable!("schema root must reassign to a struct"),
    }
}
