//! Schema indexing, selection, and visitor invariant tests.

use std::collections::{HashMap, HashSet};

use floe_core::schema::{
    get_projected_ids, index_by_id, index_by_name, join, reassign_ids, select, select_not, Schema,
};
use floe_core::types::{ListType, MapType, NestedField, StructType, Type};
use floe_core::visit::{visit_schema, SchemaVisitor};

/// struct<
///   1: id required long,
///   2: data optional string,
///   3: prefs optional struct<4: volume required int, 5: muted optional boolean>,
///   6: tags optional list<7: element string>,
///   8: props optional map<9: key string, 10: value optional int>,
/// >
fn nested_schema() -> Schema {
    Schema::new(vec![
        NestedField::required(1, "id", Type::Long),
        NestedField::optional(2, "data", Type::String),
        NestedField::optional(
            3,
            "prefs",
            Type::Struct(StructType::new(vec![
                NestedField::required(4, "volume", Type::Int),
                NestedField::optional(5, "muted", Type::Boolean),
            ])),
        ),
        NestedField::optional(6, "tags", Type::List(ListType::of_required(7, Type::String))),
        NestedField::optional(
            8,
            "props",
            Type::Map(MapType::of_optional(9, 10, Type::String, Type::Int)),
        ),
    ])
}

#[test]
fn test_find_field_by_dotted_name() {
    let schema = nested_schema();
    assert_eq!(schema.find_field("id").map(|f| f.id), Some(1));
    assert_eq!(schema.find_field("prefs").map(|f| f.id), Some(3));
    assert_eq!(schema.find_field("prefs.volume").map(|f| f.id), Some(4));
    assert_eq!(schema.find_field("prefs.muted").map(|f| f.id), Some(5));
    assert_eq!(schema.find_field("tags.element").map(|f| f.id), Some(7));
    assert_eq!(schema.find_field("props.key").map(|f| f.id), Some(9));
    assert_eq!(schema.find_field("props.value").map(|f| f.id), Some(10));
    assert_eq!(schema.find_field("nope"), None);
    assert_eq!(schema.find_field("prefs.nope"), None);
}

#[test]
fn test_find_field_consults_aliases() {
    let aliases: HashMap<String, i32> = [("identifier".to_string(), 1)].into_iter().collect();
    let schema = Schema::with_aliases(
        vec![NestedField::required(1, "id", Type::Long)],
        Some(aliases),
    );
    assert_eq!(schema.find_field("identifier").map(|f| f.id), Some(1));
    assert_eq!(schema.find_field("id").map(|f| f.id), Some(1));
}

#[test]
fn test_find_by_id_covers_container_interiors() {
    let schema = nested_schema();
    assert_eq!(schema.find_field_by_id(4).map(|f| f.name.as_str()), Some("volume"));
    assert_eq!(schema.find_field_by_id(7).map(|f| f.name.as_str()), Some("element"));
    assert_eq!(schema.find_field_by_id(9).map(|f| f.name.as_str()), Some("key"));
    assert_eq!(schema.find_field_by_id(10).map(|f| f.name.as_str()), Some("value"));
    assert_eq!(schema.find_type(7), Some(&Type::String));
}

#[test]
#[should_panic(expected = "duplicate field id")]
fn test_duplicate_ids_panic() {
    Schema::new(vec![
        NestedField::required(1, "a", Type::Int),
        NestedField::required(1, "b", Type::Int),
    ]);
}

#[test]
fn test_projected_ids_match_id_index() {
    let schema = nested_schema();
    let projected = get_projected_ids(&schema);
    let expected: HashSet<i32> = (1..=10).collect();
    assert_eq!(projected, expected);

    let by_id = index_by_id(schema.as_struct());
    let indexed: HashSet<i32> = by_id.keys().copied().collect();
    assert_eq!(indexed, projected);
}

#[test]
fn test_projected_ids_match_visited_ids() {
    struct CollectIds {
        ids: HashSet<i32>,
    }
    impl SchemaVisitor for CollectIds {
        type Output = ();
        fn r#struct(&mut self, st: &StructType, _results: Vec<()>) {
            for field in &st.fields {
                self.ids.insert(field.id);
            }
        }
        fn list(&mut self, list: &ListType, _element: ()) {
            self.ids.insert(list.element_id);
        }
        fn map(&mut self, map: &MapType, _value: ()) {
            self.ids.insert(map.key_id);
            self.ids.insert(map.value_id);
        }
        fn primitive(&mut self, _primitive: &Type) {}
    }

    let schema = nested_schema();
    let mut collector = CollectIds { ids: HashSet::new() };
    visit_schema(&schema, &mut collector);
    assert_eq!(collector.ids, get_projected_ids(&schema));
}

#[test]
fn test_index_by_name_registers_interior_names() {
    let schema = nested_schema();
    let by_name = index_by_name(schema.as_struct());
    assert_eq!(by_name.get("prefs.volume"), Some(&4));
    assert_eq!(by_name.get("tags.element"), Some(&7));
    assert_eq!(by_name.get("props.key"), Some(&9));
    assert_eq!(by_name.get("props.value"), Some(&10));
}

#[test]
fn test_select_keeps_whole_subtree_of_selected_ids() {
    let schema = nested_schema();
    let selected = select(&schema, &[1, 3].into_iter().collect());
    assert_eq!(selected.columns().len(), 2);
    assert_eq!(selected.columns()[0].id, 1);
    // Selecting the struct keeps both of its fields.
    assert_eq!(selected.find_field("prefs.volume").map(|f| f.id), Some(4));
    assert_eq!(selected.find_field("prefs.muted").map(|f| f.id), Some(5));
}

#[test]
fn test_select_retains_containers_of_selected_descendants() {
    let schema = nested_schema();
    let selected = select(&schema, &[5].into_iter().collect());
    // prefs survives with only the selected child.
    assert_eq!(selected.columns().len(), 1);
    assert_eq!(selected.columns()[0].id, 3);
    assert_eq!(selected.find_field("prefs.muted").map(|f| f.id), Some(5));
    assert_eq!(selected.find_field("prefs.volume"), None);
}

#[test]
fn test_select_preserves_field_order() {
    let schema = nested_schema();
    let selected = select(&schema, &[6, 2, 1].into_iter().collect());
    let ids: Vec<i32> = selected.columns().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 2, 6]);
}

#[test]
fn test_select_nothing_yields_empty_schema() {
    let schema = nested_schema();
    let selected = select(&schema, &HashSet::new());
    assert!(selected.columns().is_empty());
}

#[test]
fn test_select_keeps_aliases() {
    let aliases: HashMap<String, i32> = [("identifier".to_string(), 1)].into_iter().collect();
    let schema = Schema::with_aliases(
        vec![
            NestedField::required(1, "id", Type::Long),
            NestedField::optional(2, "data", Type::String),
        ],
        Some(aliases.clone()),
    );
    let selected = select(&schema, &[1].into_iter().collect());
    assert_eq!(selected.aliases(), Some(&aliases));
}

#[test]
fn test_select_not_inverts_selection() {
    let schema = nested_schema();
    let selected = select_not(&schema, &[2].into_iter().collect());
    assert!(selected.find_field("data").is_none());
    assert!(selected.find_field("id").is_some());
    assert!(selected.find_field("prefs.volume").is_some());
    assert!(selected.find_field("props.value").is_some());
}

#[test]
fn test_join_concatenates_columns() {
    let left = Schema::new(vec![NestedField::required(1, "id", Type::Long)]);
    let right = Schema::new(vec![NestedField::optional(2, "data", Type::String)]);
    let joined = join(&left, &right);
    let ids: Vec<i32> = joined.columns().iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_reassign_ids_is_post_order() {
    // struct<10: a int, 20: b struct<30: c int>> renumbered from 0:
    // children first, then this struct's fields in order.
    let schema = Schema::new(vec![
        NestedField::required(10, "a", Type::Int),
        NestedField::optional(
            20,
            "b",
            Type::Struct(StructType::new(vec![NestedField::required(
                30,
                "c",
                Type::Int,
            )])),
        ),
    ]);
    let mut next = 0;
    let reassigned = reassign_ids(&schema, &mut || {
        next += 1;
        next
    });
    assert_eq!(reassigned.find_field("b.c").map(|f| f.id), Some(1));
    assert_eq!(reassigned.find_field("a").map(|f| f.id), Some(2));
    assert_eq!(reassigned.find_field("b").map(|f| f.id), Some(3));
    // The id space is still duplicate-free and dense.
    assert_eq!(
        get_projected_ids(&reassigned),
        (1..=3).collect::<HashSet<i32>>()
    );
}

#[test]
fn test_reassign_ids_renumbers_container_interiors() {
    let schema = Schema::new(vec![NestedField::optional(
        9,
        "tags",
        Type::List(ListType::of_required(11, Type::String)),
    )]);
    let mut next = 0;
    let reassigned = reassign_ids(&schema, &mut || {
        next += 1;
        next
    });
    assert_eq!(reassigned.find_field("tags.element").map(|f| f.id), Some(1));
    assert_eq!(reassigned.find_field("tags").map(|f| f.id), Some(2));
}
