//! Inclusive and strict projection tests: row-space predicates pushed
//! through partition transforms into partition-space predicates.

use std::sync::Arc;

use floe_core::expr::{
    always_false, always_true, and, equal, greater_than, greater_than_or_equal, less_than,
    not, not_equal, Expression, Operation, UnboundPredicate,
};
use floe_core::literal::Literal;
use floe_core::partition::PartitionSpec;
use floe_core::projections::{inclusive, strict};
use floe_core::schema::Schema;
use floe_core::transform::Transform;
use floe_core::types::{NestedField, Type};

fn id_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![NestedField::required(1, "id", Type::Long)]))
}

fn bucket_spec(schema: Arc<Schema>) -> PartitionSpec {
    PartitionSpec::builder(schema)
        .bucket("id", 16)
        .unwrap()
        .build()
}

fn unbound(expr: Expression) -> UnboundPredicate {
    match expr {
        Expression::Unbound(p) => p,
        other => panic!("expected an unbound predicate, got {:?}", other),
    }
}

fn bucket16(v: i64) -> Literal {
    Transform::Bucket(16).apply(&Literal::from(v))
}

#[test]
fn test_inclusive_bucket_projects_eq() {
    let spec = bucket_spec(id_schema());
    let projected = unbound(inclusive(&spec).project(&equal("id", 17i64)).unwrap());
    assert_eq!(projected.op, Operation::Eq);
    assert_eq!(projected.reference.name, "id_bucket");
    assert_eq!(projected.literal, Some(bucket16(17)));
}

#[test]
fn test_inclusive_bucket_cannot_project_ranges() {
    let spec = bucket_spec(id_schema());
    for expr in [
        less_than("id", 17i64),
        greater_than("id", 17i64),
        greater_than_or_equal("id", 17i64),
        not_equal("id", 17i64),
    ] {
        assert_eq!(
            inclusive(&spec).project(&expr).unwrap(),
            always_true(),
            "no inclusive projection for {:?}",
            expr
        );
    }
}

#[test]
fn test_strict_bucket_projects_not_eq() {
    let spec = bucket_spec(id_schema());
    let projected = unbound(strict(&spec).project(&not_equal("id", 17i64)).unwrap());
    assert_eq!(projected.op, Operation::NotEq);
    assert_eq!(projected.reference.name, "id_bucket");
    assert_eq!(projected.literal, Some(bucket16(17)));
}

#[test]
fn test_strict_bucket_cannot_project_eq_or_ranges() {
    let spec = bucket_spec(id_schema());
    for expr in [
        equal("id", 17i64),
        less_than("id", 17i64),
        greater_than("id", 17i64),
    ] {
        assert_eq!(
            strict(&spec).project(&expr).unwrap(),
            always_false(),
            "no strict projection for {:?}",
            expr
        );
    }
}

#[test]
fn test_projection_recurses_with_folding() {
    let spec = bucket_spec(id_schema());
    // The range side of the conjunction projects to True and folds away.
    let expr = and(equal("id", 17i64), less_than("id", 100i64));
    let projected = unbound(inclusive(&spec).project(&expr).unwrap());
    assert_eq!(projected.op, Operation::Eq);
    assert_eq!(projected.literal, Some(bucket16(17)));

    // For strict mode the equality side is False, absorbing the And.
    assert_eq!(strict(&spec).project(&expr).unwrap(), always_false());
}

#[test]
fn test_projection_rewrites_not_before_projecting() {
    let spec = bucket_spec(id_schema());
    let expr = not(equal("id", 17i64));
    let projected = unbound(strict(&spec).project(&expr).unwrap());
    assert_eq!(projected.op, Operation::NotEq);
    assert_eq!(projected.literal, Some(bucket16(17)));
}

#[test]
fn test_identity_projects_any_predicate() {
    let schema = id_schema();
    let spec = PartitionSpec::builder(schema)
        .identity("id")
        .unwrap()
        .build();
    let projected = unbound(inclusive(&spec).project(&less_than("id", 17i64)).unwrap());
    assert_eq!(projected.op, Operation::Lt);
    assert_eq!(projected.reference.name, "id");
    assert_eq!(projected.literal, Some(Literal::Long(17)));

    let projected = unbound(strict(&spec).project(&less_than("id", 17i64)).unwrap());
    assert_eq!(projected.op, Operation::Lt);
}

#[test]
fn test_truncate_projection_directions() {
    let schema = Arc::new(Schema::new(vec![NestedField::required(
        1,
        "v",
        Type::Int,
    )]));
    let spec = PartitionSpec::builder(schema)
        .truncate("v", 10)
        .unwrap()
        .build();

    // Inclusive: ranges loosen to include the boundary partition.
    let projected = unbound(inclusive(&spec).project(&less_than("v", 17i32)).unwrap());
    assert_eq!(projected.op, Operation::LtEq);
    assert_eq!(projected.literal, Some(Literal::Int(10)));
    let projected = unbound(
        inclusive(&spec)
            .project(&greater_than("v", 17i32))
            .unwrap(),
    );
    assert_eq!(projected.op, Operation::GtEq);
    assert_eq!(projected.literal, Some(Literal::Int(10)));
    let projected = unbound(inclusive(&spec).project(&equal("v", 17i32)).unwrap());
    assert_eq!(projected.op, Operation::Eq);
    assert_eq!(projected.literal, Some(Literal::Int(10)));

    // Strict: ranges tighten to exclude the boundary partition.
    let projected = unbound(strict(&spec).project(&less_than("v", 17i32)).unwrap());
    assert_eq!(projected.op, Operation::Lt);
    assert_eq!(projected.literal, Some(Literal::Int(10)));
    let projected = unbound(strict(&spec).project(&not_equal("v", 17i32)).unwrap());
    assert_eq!(projected.op, Operation::NotEq);
    assert_eq!(projected.literal, Some(Literal::Int(10)));
    assert_eq!(
        strict(&spec).project(&equal("v", 17i32)).unwrap(),
        always_false()
    );
}

#[test]
fn test_temporal_projection() {
    let schema = Arc::new(Schema::new(vec![NestedField::required(
        1,
        "ts",
        Type::timestamptz(),
    )]));
    let spec = PartitionSpec::builder(schema).day("ts").unwrap().build();

    // 2017-11-16T22:31:08 falls on day 17486.
    let micros = 1_510_871_468_000_000i64;
    let expr = greater_than_or_equal("ts", Literal::Timestamp(micros));
    let projected = unbound(inclusive(&spec).project(&expr).unwrap());
    assert_eq!(projected.op, Operation::GtEq);
    assert_eq!(projected.reference.name, "ts_day");
    assert_eq!(projected.literal, Some(Literal::Int(17486)));

    let projected = unbound(strict(&spec).project(&expr).unwrap());
    assert_eq!(projected.op, Operation::Gt);
    assert_eq!(projected.literal, Some(Literal::Int(17486)));
}

#[test]
fn test_unrelated_columns_project_to_safe_constants() {
    let schema = Arc::new(Schema::new(vec![
        NestedField::required(1, "id", Type::Long),
        NestedField::optional(2, "name", Type::String),
    ]));
    let spec = PartitionSpec::builder(schema).bucket("id", 16).unwrap().build();
    let expr = equal("name", "alice");
    assert_eq!(inclusive(&spec).project(&expr).unwrap(), always_true());
    assert_eq!(strict(&spec).project(&expr).unwrap(), always_false());
}

#[test]
fn test_projected_expression_binds_against_partition_type() {
    let spec = bucket_spec(id_schema());
    let projected = inclusive(&spec).project(&equal("id", 17i64)).unwrap();
    let partition_type = spec.partition_type();
    // Partition field ids come from the reserved range.
    assert_eq!(partition_type.fields[0].id, 1000);
    assert_eq!(partition_type.fields[0].field_type, Type::Int);
    match projected.bind(&partition_type).unwrap() {
        Expression::Bound(p) => {
            assert_eq!(p.reference.field_id, 1000);
            assert_eq!(p.literal, Some(bucket16(17)));
        }
        other => panic!("expected bound partition predicate, got {:?}", other),
    }
}
