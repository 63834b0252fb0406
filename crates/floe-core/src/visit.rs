//! Schema traversal.
//!
//! Two flavours. The pre-order visitor walks the tree in a fixed order and
//! hands each node its children's results; `before_field`/`after_field`
//! hooks let visitors maintain a field-name stack. The custom-order visitor
//! hands each node one-shot thunks instead, so the visitor decides when (and
//! whether) children are traversed; this is what post-order work like id
//! reassignment builds on.
//!
//! Traversal recurses on the schema tree, so stack use is bounded by nesting
//! depth. Schemas nested deeper than a few hundred levels are out of scope.

use crate::schema::Schema;
use crate::types::{ListType, MapType, NestedField, StructType, Type};

/// Pre-order visitor. List and map traversal recurses into the element and
/// value types only; map keys are treated as fixed.
pub trait SchemaVisitor {
    type Output;

    /// Called before recursing into a field's type; pairs with `after_field`.
    fn before_field(&mut self, _field: &NestedField) {}
    fn after_field(&mut self, _field: &NestedField) {}

    fn schema(&mut self, _schema: &Schema, struct_result: Self::Output) -> Self::Output {
        struct_result
    }

    fn r#struct(&mut self, st: &StructType, field_results: Vec<Self::Output>) -> Self::Output;

    fn field(&mut self, _field: &NestedField, result: Self::Output) -> Self::Output {
        result
    }

    fn list(&mut self, _list: &ListType, element_result: Self::Output) -> Self::Output {
        element_result
    }

    fn map(&mut self, _map: &MapType, value_result: Self::Output) -> Self::Output {
        value_result
    }

    fn primitive(&mut self, primitive: &Type) -> Self::Output;
}

pub fn visit_schema<V: SchemaVisitor>(schema: &Schema, visitor: &mut V) -> V::Output {
    let result = visit_type(schema.root_type(), visitor);
    visitor.schema(schema, result)
}

pub fn visit_type<V: SchemaVisitor>(field_type: &Type, visitor: &mut V) -> V::Output {
    match field_type {
        Type::Struct(st) => {
            let mut results = Vec::with_capacity(st.fields.len());
            for field in &st.fields {
                visitor.before_field(field);
                let result = visit_type(&field.field_type, visitor);
                visitor.after_field(field);
                results.push(visitor.field(field, result));
            }
            visitor.r#struct(st, results)
        }
        Type::List(list) => {
            let result = visit_type(&list.element_type, visitor);
            visitor.list(list, result)
        }
        Type::Map(map) => {
            let result = visit_type(&map.value_type, visitor);
            visitor.map(map, result)
        }
        primitive => visitor.primitive(primitive),
    }
}

/// A one-shot thunk that traverses a type when invoked. Move semantics
/// guarantee it runs at most once.
pub struct VisitFuture<'a> {
    field_type: &'a Type,
}

impl<'a> VisitFuture<'a> {
    pub fn invoke<V: CustomOrderVisitor>(self, visitor: &mut V) -> V::Output {
        visit_type_custom(self.field_type, visitor)
    }
}

/// A one-shot thunk that visits a field (and, through the field callback,
/// its type) when invoked.
pub struct VisitFieldFuture<'a> {
    field: &'a NestedField,
}

impl<'a> VisitFieldFuture<'a> {
    pub fn invoke<V: CustomOrderVisitor>(self, visitor: &mut V) -> V::Output {
        visitor.field(
            self.field,
            VisitFuture {
                field_type: &self.field.field_type,
            },
        )
    }
}

/// Lazy sequence of field thunks handed to `CustomOrderVisitor::struct`.
pub struct FieldFutures<'a> {
    fields: std::slice::Iter<'a, NestedField>,
}

impl<'a> Iterator for FieldFutures<'a> {
    type Item = VisitFieldFuture<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fields.next().map(|field| VisitFieldFuture { field })
    }
}

/// Visitor over thunks: each callback decides when child traversal happens,
/// enabling post-order traversals and subtree skipping.
pub trait CustomOrderVisitor: Sized {
    type Output;

    fn schema(&mut self, _schema: &Schema, result: VisitFuture<'_>) -> Self::Output {
        result.invoke(self)
    }

    fn r#struct(&mut self, st: &StructType, fields: FieldFutures<'_>) -> Self::Output;

    fn field(&mut self, _field: &NestedField, result: VisitFuture<'_>) -> Self::Output {
        result.invoke(self)
    }

    fn list(&mut self, list: &ListType, element: VisitFuture<'_>) -> Self::Output;

    fn map(&mut self, map: &MapType, value: VisitFuture<'_>) -> Self::Output;

    fn primitive(&mut self, primitive: &Type) -> Self::Output;
}

pub fn visit_schema_custom<V: CustomOrderVisitor>(schema: &Schema, visitor: &mut V) -> V::Output {
    visitor.schema(
        schema,
        VisitFuture {
            field_type: schema.root_type(),
        },
    )
}

pub fn visit_type_custom<V: CustomOrderVisitor>(field_type: &Type, visitor: &mut V) -> V::Output {
    match field_type {
        Type::Struct(st) => visitor.r#struct(
            st,
            FieldFutures {
                fields: st.fields.iter(),
            },
        ),
        Type::List(list) => visitor.list(
            list,
            VisitFuture {
                field_type: &list.element_type,
            },
        ),
        Type::Map(map) => visitor.map(
            map,
            VisitFuture {
                field_type: &map.value_type,
            },
        ),
        primitive => visitor.primitive(primitive),
    }
}
