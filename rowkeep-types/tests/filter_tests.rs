use proptest::prelude::*;
use rowkeep_types::{is_empty_reference, is_reserved, is_truthy, values_equal, Filter, Item};
use serde_json::{json, Value};

fn make_item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ── Filter ────────────────────────────────────────────────────────

#[test]
fn empty_filter_matches_everything() {
    let filter = Filter::new();
    assert!(filter.is_empty());
    assert!(filter.matches(&make_item(json!({}))));
    assert!(filter.matches(&make_item(json!({"a": 1}))));
}

#[test]
fn filter_is_a_conjunction() {
    let filter = Filter::new()
        .where_eq("type", "User")
        .where_eq("name", "Ann");
    assert!(filter.matches(&make_item(json!({"type": "User", "name": "Ann", "age": 3}))));
    assert!(!filter.matches(&make_item(json!({"type": "User", "name": "Bob"}))));
    assert!(!filter.matches(&make_item(json!({"type": "Team", "name": "Ann"}))));
}

#[test]
fn filter_requires_key_presence() {
    let filter = Filter::new().where_eq("name", Value::Null);
    assert!(filter.matches(&make_item(json!({"name": null}))));
    assert!(!filter.matches(&make_item(json!({}))));
}

#[test]
fn filter_is_exact_not_partial() {
    let filter = Filter::new().where_eq("name", "An");
    assert!(!filter.matches(&make_item(json!({"name": "Ann"}))));
}

#[test]
fn numbers_match_by_value() {
    let filter = Filter::new().where_eq("age", 41);
    assert!(filter.matches(&make_item(json!({"age": 41.0}))));
    assert!(filter.matches(&make_item(json!({"age": 41}))));
    assert!(!filter.matches(&make_item(json!({"age": 41.5}))));
    assert!(!filter.matches(&make_item(json!({"age": "41"}))));

    let nested = Filter::new().where_eq("dims", json!([1, 2.0]));
    assert!(nested.matches(&make_item(json!({"dims": [1.0, 2]}))));
}

#[test]
fn values_equal_separates_kinds() {
    assert!(values_equal(&json!(0), &json!(0.0)));
    assert!(values_equal(&json!(u64::MAX), &json!(u64::MAX)));
    assert!(!values_equal(&json!(-1), &json!(u64::MAX)));
    assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    assert!(!values_equal(&json!(null), &json!(0)));
}

#[test]
fn by_id_constrains_id() {
    let filter = Filter::by_id("mgr-1");
    assert_eq!(filter.get("id"), Some(&json!("mgr-1")));
    assert_eq!(filter.len(), 1);
}

#[test]
fn with_type_overrides_existing_type_clause() {
    let filter = Filter::new().where_eq("type", "Team").with_type("User");
    assert_eq!(filter.get("type"), Some(&json!("User")));
    assert_eq!(filter.len(), 1);
}

#[test]
fn filter_from_item() {
    let filter = Filter::from(make_item(json!({"a": 1, "b": "x"})));
    assert_eq!(filter.len(), 2);
    assert!(filter.matches(&make_item(json!({"a": 1, "b": "x", "c": false}))));
}

#[test]
fn filter_from_iterator() {
    let filter: Filter = vec![("a", json!(1)), ("b", json!(true))].into_iter().collect();
    assert_eq!(filter.len(), 2);
}

#[test]
fn filter_serializes_as_object() {
    let filter = Filter::new().where_eq("name", "Ann");
    assert_eq!(serde_json::to_value(&filter).unwrap(), json!({"name": "Ann"}));
}

// ── Truthiness ────────────────────────────────────────────────────

#[test]
fn falsy_values() {
    for v in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
        assert!(!is_truthy(&v), "{v} should be falsy");
    }
}

#[test]
fn truthy_values() {
    for v in [json!(true), json!(1), json!(-2.5), json!("x"), json!([]), json!({})] {
        assert!(is_truthy(&v), "{v} should be truthy");
    }
}

#[test]
fn empty_reference_values() {
    assert!(is_empty_reference(&json!(null)));
    assert!(is_empty_reference(&json!("")));
    assert!(!is_empty_reference(&json!("mgr-1")));
    assert!(!is_empty_reference(&json!(0)));
}

#[test]
fn reserved_attribute_names() {
    for name in ["id", "type", "createdAt", "modifiedAt", "_version"] {
        assert!(is_reserved(name));
    }
    assert!(!is_reserved("name"));
    assert!(!is_reserved("version"));
}

// ── Properties ────────────────────────────────────────────────────

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn item_strategy() -> impl Strategy<Value = Item> {
    prop::collection::btree_map("[a-e]", scalar_strategy(), 0..5)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    /// A filter built from an item always matches that item.
    #[test]
    fn filter_from_item_matches_itself(item in item_strategy()) {
        prop_assert!(Filter::from(item.clone()).matches(&item));
    }

    /// Adding a clause never widens the set of matching items.
    #[test]
    fn extra_clause_only_narrows(
        item in item_strategy(),
        key in "[a-e]",
        value in scalar_strategy(),
    ) {
        let base = Filter::from(item.clone());
        let narrowed = base.clone().where_eq(key, value);
        if narrowed.matches(&item) {
            prop_assert!(base.matches(&item));
        }
    }

    /// Non-empty strings are truthy, and a string is falsy only when empty.
    #[test]
    fn string_truthiness(s in ".{0,16}") {
        prop_assert_eq!(is_truthy(&Value::from(s.clone())), !s.is_empty());
    }
}
