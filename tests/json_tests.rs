//! Schema and partition-spec JSON wire format tests, plus manifest header
//! decoding.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use floe_core::schema::Schema;
use floe_core::transform::Transform;
use floe_core::types::{ListType, MapType, NestedField, StructType, Type};
use floe_meta::json::{schema_from_json, schema_to_json, spec_from_json, spec_to_json};
use floe_meta::manifest::{ManifestHeader, PARTITION_SPEC_KEY, SCHEMA_KEY};
use floe_core::partition::PartitionSpec;

fn full_schema() -> Schema {
    Schema::new(vec![
        NestedField::required(1, "id", Type::Long),
        NestedField::optional(2, "data", Type::String),
        NestedField::required(3, "price", Type::Decimal { precision: 9, scale: 2 }),
        NestedField::optional(4, "digest", Type::Fixed(16)),
        NestedField::optional(5, "created", Type::timestamptz()),
        NestedField::optional(6, "updated", Type::timestamp()),
        NestedField::optional(
            7,
            "prefs",
            Type::Struct(StructType::new(vec![
                NestedField::required(8, "volume", Type::Int),
                NestedField::optional(9, "muted", Type::Boolean),
            ])),
        ),
        NestedField::optional(
            10,
            "tags",
            Type::List(ListType::of_required(11, Type::String)),
        ),
        NestedField::optional(
            12,
            "props",
            Type::Map(MapType::of_optional(13, 14, Type::String, Type::Double)),
        ),
    ])
}

#[test]
fn test_schema_json_roundtrip() {
    let schema = full_schema();
    let parsed = schema_from_json(&schema_to_json(&schema)).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn test_schema_json_shape() {
    let schema = Schema::new(vec![
        NestedField::required(1, "id", Type::Long),
        NestedField::optional(2, "data", Type::String),
    ]);
    let value: serde_json::Value = serde_json::from_str(&schema_to_json(&schema)).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "struct",
            "fields": [
                {"id": 1, "name": "id", "required": true, "type": "long"},
                {"id": 2, "name": "data", "required": false, "type": "string"},
            ],
        })
    );
}

#[test]
fn test_primitive_keywords() {
    let cases = vec![
        ("boolean", Type::Boolean),
        ("int", Type::Int),
        ("long", Type::Long),
        ("float", Type::Float),
        ("double", Type::Double),
        ("date", Type::Date),
        ("time", Type::Time),
        ("timestamp", Type::timestamp()),
        ("timestamptz", Type::timestamptz()),
        ("string", Type::String),
        ("uuid", Type::Uuid),
        ("binary", Type::Binary),
        ("fixed[16]", Type::Fixed(16)),
        ("decimal(9,2)", Type::Decimal { precision: 9, scale: 2 }),
    ];
    for (keyword, expected) in cases {
        let schema_json = format!(
            r#"{{"type":"struct","fields":[{{"id":1,"name":"c","required":true,"type":"{keyword}"}}]}}"#
        );
        let parsed = schema_from_json(&schema_json).unwrap();
        assert_eq!(
            parsed.columns()[0].field_type, expected,
            "keyword {keyword} should parse"
        );
        // And the serializer writes the same keyword back.
        assert!(
            schema_to_json(&parsed).contains(keyword),
            "serializer should emit {keyword}"
        );
    }
}

#[test]
fn test_decimal_keyword_tolerates_spaces() {
    let schema_json = r#"{"type":"struct","fields":[{"id":1,"name":"d","required":true,"type":"decimal(9, 2)"}]}"#;
    let parsed = schema_from_json(schema_json).unwrap();
    assert_eq!(
        parsed.columns()[0].field_type,
        Type::Decimal { precision: 9, scale: 2 }
    );
}

#[test]
fn test_malformed_schema_json() {
    assert!(schema_from_json("not json").is_err());
    assert!(schema_from_json(r#""int""#).is_err());
    assert!(schema_from_json(r#"{"type":"struct"}"#).is_err());
    assert!(
        schema_from_json(
            r#"{"type":"struct","fields":[{"id":1,"name":"c","required":true,"type":"int32"}]}"#
        )
        .is_err(),
        "unknown keywords must be rejected"
    );
    assert!(
        schema_from_json(
            r#"{"type":"struct","fields":[{"name":"c","required":true,"type":"int"}]}"#
        )
        .is_err(),
        "fields without ids must be rejected"
    );
}

#[test]
fn test_partition_spec_json_roundtrip() {
    let schema = Arc::new(full_schema());
    let spec = PartitionSpec::builder(schema.clone())
        .with_spec_id(3)
        .bucket("id", 16)
        .unwrap()
        .truncate("data", 4)
        .unwrap()
        .day("created")
        .unwrap()
        .build();

    let serialized = spec_to_json(&spec);
    let parsed = spec_from_json(schema, &serialized).unwrap();
    assert_eq!(parsed, spec);
}

#[test]
fn test_partition_spec_json_shape() {
    let schema = Arc::new(full_schema());
    let spec = PartitionSpec::builder(schema)
        .with_spec_id(0)
        .bucket("id", 16)
        .unwrap()
        .build();
    let value: serde_json::Value = serde_json::from_str(&spec_to_json(&spec)).unwrap();
    assert_eq!(
        value,
        json!({
            "spec-id": 0,
            "fields": [
                {"name": "id_bucket", "transform": "bucket[16]", "source-id": 1},
            ],
        })
    );
}

#[test]
fn test_partition_spec_json_validates_sources() {
    let schema = Arc::new(full_schema());
    let unknown_source =
        r#"{"spec-id":0,"fields":[{"name":"x","transform":"identity","source-id":99}]}"#;
    assert!(spec_from_json(schema.clone(), unknown_source).is_err());
    let bad_transform =
        r#"{"spec-id":0,"fields":[{"name":"x","transform":"bucket[oops]","source-id":1}]}"#;
    assert!(spec_from_json(schema, bad_transform).is_err());
}

#[test]
fn test_manifest_header_parse() {
    let schema = Arc::new(full_schema());
    let spec = PartitionSpec::builder(schema.clone())
        .with_spec_id(1)
        .bucket("id", 16)
        .unwrap()
        .build();

    let mut metadata = HashMap::new();
    metadata.insert(SCHEMA_KEY.to_string(), schema_to_json(&schema));
    metadata.insert(PARTITION_SPEC_KEY.to_string(), spec_to_json(&spec));

    let header = ManifestHeader::parse(&metadata).unwrap();
    assert_eq!(*header.schema, *schema);
    assert_eq!(header.spec.spec_id(), 1);
    assert_eq!(header.spec.fields().len(), 1);
    assert_eq!(header.spec.fields()[0].transform, Transform::Bucket(16));

    metadata.remove(PARTITION_SPEC_KEY);
    assert!(ManifestHeader::parse(&metadata).is_err());
}
