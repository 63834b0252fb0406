//! JSON wire formats for schemas and partition specs.
//!
//! A schema serializes as `{"type":"struct","fields":[...]}` where each
//! field is `{"id":..,"name":..,"required":..,"type":..}`. A type is a
//! primitive keyword (`"int"`, `"timestamptz"`, `"fixed[16]"`,
//! `"decimal(9,2)"`), a list object, a map object, or a nested struct. A
//! partition spec serializes as `{"spec-id":..,"fields":[...]}` with each
//! field carrying `name`, `transform`, and `source-id`.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use floe_core::partition::PartitionSpec;
use floe_core::schema::Schema;
use floe_core::transform::Transform;
use floe_core::types::{ListType, MapType, NestedField, StructType, Type};

use crate::error::{Error, Result};

pub fn schema_to_json(schema: &Schema) -> String {
    type_to_value(schema.root_type()).to_string()
}

pub fn schema_from_json(s: &str) -> Result<Schema> {
    let value: Value = serde_json::from_str(s)?;
    match type_from_value(&value)? {
        Type::Struct(st) => Ok(Schema::new(st.fields)),
        other => Err(Error::json(format!(
            "Cannot parse schema from non-struct type: {other}"
        ))),
    }
}

pub fn type_to_value(field_type: &Type) -> Value {
    match field_type {
        Type::Struct(st) => {
            let fields: Vec<Value> = st
                .fields
                .iter()
                .map(|field| {
                    json!({
                        "id": field.id,
                        "name": field.name,
                        "required": field.is_required(),
                        "type": type_to_value(&field.field_type),
                    })
                })
                .collect();
            json!({ "type": "struct", "fields": fields })
        }
        Type::List(list) => json!({
            "type": "list",
            "element-id": list.element_id,
            "element": type_to_value(&list.element_type),
            "element-required": !list.element_optional,
        }),
        Type::Map(map) => json!({
            "type": "map",
            "key-id": map.key_id,
            "key": type_to_value(&map.key_type),
            "value-id": map.value_id,
            "value": type_to_value(&map.value_type),
            "value-required": !map.value_optional,
        }),
        primitive => Value::String(primitive.to_string()),
    }
}

pub fn type_from_value(value: &Value) -> Result<Type> {
    match value {
        Value::String(keyword) => primitive_from_keyword(keyword),
        Value::Object(object) => match get_str(object, "type")? {
            "struct" => struct_from_object(object),
            "list" => list_from_object(object),
            "map" => map_from_object(object),
            other => Err(Error::json(format!("Unknown nested type: {other}"))),
        },
        other => Err(Error::json(format!("Cannot parse type from: {other}"))),
    }
}

fn primitive_from_keyword(keyword: &str) -> Result<Type> {
    let primitive = match keyword {
        "boolean" => Type::Boolean,
        "int" => Type::Int,
        "long" => Type::Long,
        "float" => Type::Float,
        "double" => Type::Double,
        "date" => Type::Date,
        "time" => Type::Time,
        "timestamp" => Type::timestamp(),
        "timestamptz" => Type::timestamptz(),
        "string" => Type::String,
        "uuid" => Type::Uuid,
        "binary" => Type::Binary,
        other => {
            if let Some(len) = other
                .strip_prefix("fixed[")
                .and_then(|rest| rest.strip_suffix(']'))
            {
                let len: usize = len
                    .parse()
                    .map_err(|_| Error::json(format!("Invalid fixed length: {other}")))?;
                return Ok(Type::Fixed(len));
            }
            if let Some(params) = other
                .strip_prefix("decimal(")
                .and_then(|rest| rest.strip_suffix(')'))
            {
                let mut parts = params.splitn(2, ',').map(str::trim);
                let precision = parts.next().and_then(|p| p.parse::<u32>().ok());
                let scale = parts.next().and_then(|s| s.parse::<u32>().ok());
                return match (precision, scale) {
                    (Some(precision), Some(scale)) => Ok(Type::Decimal { precision, scale }),
                    _ => Err(Error::json(format!("Invalid decimal type: {other}"))),
                };
            }
            return Err(Error::json(format!("Unknown primitive type: {other}")));
        }
    };
    Ok(primitive)
}

fn struct_from_object(object: &Map<String, Value>) -> Result<Type> {
    let fields = object
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::json("Struct type is missing its fields array"))?;
    let mut parsed = Vec::with_capacity(fields.len());
    for field in fields {
        let field = field
            .as_object()
            .ok_or_else(|| Error::json(format!("Cannot parse field from: {field}")))?;
        let id = get_i32(field, "id")?;
        let name = get_str(field, "name")?.to_string();
        let required = field
            .get("required")
            .and_then(Value::as_bool)
            .ok_or_else(|| Error::json(format!("Field '{name}' is missing: required")))?;
        let field_type = type_from_value(
            field
                .get("type")
                .ok_or_else(|| Error::json(format!("Field '{name}' is missing: type")))?,
        )?;
        parsed.push(NestedField {
            id,
            name,
            optional: !required,
            field_type,
        });
    }
    Ok(Type::Struct(StructType::new(parsed)))
}

fn list_from_object(object: &Map<String, Value>) -> Result<Type> {
    let element_id = get_i32(object, "element-id")?;
    let element_required = object
        .get("element-required")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::json("List type is missing: element-required"))?;
    let element_type = type_from_value(
        object
            .get("element")
            .ok_or_else(|| Error::json("List type is missing: element"))?,
    )?;
    Ok(Type::List(if element_required {
        ListType::of_required(element_id, element_type)
    } else {
        ListType::of_optional(element_id, element_type)
    }))
}

fn map_from_object(object: &Map<String, Value>) -> Result<Type> {
    let key_id = get_i32(object, "key-id")?;
    let value_id = get_i32(object, "value-id")?;
    let value_required = object
        .get("value-required")
        .and_then(Value::as_bool)
        .ok_or_else(|| Error::json("Map type is missing: value-required"))?;
    let key_type = type_from_value(
        object
            .get("key")
            .ok_or_else(|| Error::json("Map type is missing: key"))?,
    )?;
    let value_type = type_from_value(
        object
            .get("value")
            .ok_or_else(|| Error::json("Map type is missing: value"))?,
    )?;
    Ok(Type::Map(if value_required {
        MapType::of_required(key_id, value_id, key_type, value_type)
    } else {
        MapType::of_optional(key_id, value_id, key_type, value_type)
    }))
}

pub fn spec_to_json(spec: &PartitionSpec) -> String {
    let fields: Vec<Value> = spec
        .fields()
        .iter()
        .map(|field| {
            json!({
                "name": field.name,
                "transform": field.transform.to_string(),
                "source-id": field.source_id,
            })
        })
        .collect();
    json!({ "spec-id": spec.spec_id(), "fields": fields }).to_string()
}

/// Parse a partition spec serialized by [`spec_to_json`], resolving source
/// ids against the given schema.
pub fn spec_from_json(schema: Arc<Schema>, s: &str) -> Result<PartitionSpec> {
    let value: Value = serde_json::from_str(s)?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::json(format!("Cannot parse partition spec from: {value}")))?;
    let spec_id = get_i32(object, "spec-id")?;
    let fields = object
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::json("Partition spec is missing its fields array"))?;

    let mut builder = PartitionSpec::builder(schema).with_spec_id(spec_id);
    for field in fields {
        let field = field
            .as_object()
            .ok_or_else(|| Error::json(format!("Cannot parse partition field from: {field}")))?;
        let name = get_str(field, "name")?.to_string();
        let transform = Transform::from_str(get_str(field, "transform")?)?;
        let source_id = get_i32(field, "source-id")?;
        builder = builder.add_by_source_id(source_id, name, transform)?;
    }
    Ok(builder.build())
}

fn get_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::json(format!("Missing string field: {key}")))
}

fn get_i32(object: &Map<String, Value>, key: &str) -> Result<i32> {
    object
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| Error::json(format!("Missing int field: {key}")))
}
