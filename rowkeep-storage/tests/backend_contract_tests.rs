//! Behaviour every `TableBackend` must share, run against each implementation.

use rowkeep_storage::{Condition, DuckTable, MemoryTable, StorageError, TableBackend};
use rowkeep_types::{Filter, Item};
use serde_json::{json, Value};

fn make_item(value: Value) -> Item {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn backends() -> Vec<Box<dyn TableBackend>> {
    vec![
        Box::new(MemoryTable::new("records")),
        Box::new(DuckTable::open_in_memory("records").unwrap()),
    ]
}

async fn seed(table: &dyn TableBackend) {
    table
        .put(make_item(json!({"id": "b", "type": "User", "name": "Bob", "age": 40})))
        .await
        .unwrap();
    table
        .put(make_item(json!({"id": "a", "type": "User", "name": "Ann", "age": 30})))
        .await
        .unwrap();
    table
        .put(make_item(json!({"id": "c", "type": "Team", "name": "Ann"})))
        .await
        .unwrap();
}

fn ids(items: &[Item]) -> Vec<&str> {
    items.iter().map(|i| i["id"].as_str().unwrap()).collect()
}

// ── scan ─────────────────────────────────────────────────────────

#[tokio::test]
async fn full_scan_returns_rows_in_id_order() {
    for table in backends() {
        seed(table.as_ref()).await;
        let rows = table.scan(None).await.unwrap();
        assert_eq!(ids(&rows), vec!["a", "b", "c"]);
    }
}

#[tokio::test]
async fn scan_empty_table() {
    for table in backends() {
        assert!(table.scan(None).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn scan_filter_is_conjunction() {
    for table in backends() {
        seed(table.as_ref()).await;
        let filter = Filter::new().with_type("User").where_eq("name", "Ann");
        let rows = table.scan(Some(&filter)).await.unwrap();
        assert_eq!(ids(&rows), vec!["a"]);
    }
}

#[tokio::test]
async fn scan_filter_by_id() {
    for table in backends() {
        seed(table.as_ref()).await;
        let rows = table.scan(Some(&Filter::by_id("c"))).await.unwrap();
        assert_eq!(ids(&rows), vec!["c"]);
        assert!(table.scan(Some(&Filter::by_id("zzz"))).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn scan_filter_on_non_string_values() {
    for table in backends() {
        seed(table.as_ref()).await;
        let rows = table.scan(Some(&Filter::new().where_eq("age", 40))).await.unwrap();
        assert_eq!(ids(&rows), vec!["b"]);
    }
}

#[tokio::test]
async fn scan_filter_matches_numbers_by_value() {
    for table in backends() {
        table
            .put(make_item(json!({"id": "f", "type": "User", "age": 41.0})))
            .await
            .unwrap();
        let rows = table.scan(Some(&Filter::new().where_eq("age", 41))).await.unwrap();
        assert_eq!(ids(&rows), vec!["f"]);
        let rows = table.scan(Some(&Filter::new().where_eq("age", 41.5))).await.unwrap();
        assert!(rows.is_empty());
    }
}

#[tokio::test]
async fn empty_filter_is_full_scan() {
    for table in backends() {
        seed(table.as_ref()).await;
        assert_eq!(table.scan(Some(&Filter::new())).await.unwrap().len(), 3);
    }
}

// ── put ──────────────────────────────────────────────────────────

#[tokio::test]
async fn put_replaces_existing_row() {
    for table in backends() {
        seed(table.as_ref()).await;
        table
            .put(make_item(json!({"id": "a", "type": "User", "name": "Anna"})))
            .await
            .unwrap();
        let rows = table.scan(Some(&Filter::by_id("a"))).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Anna"));
        assert!(!rows[0].contains_key("age"));
    }
}

#[tokio::test]
async fn put_requires_string_id() {
    for table in backends() {
        let missing = table.put(make_item(json!({"name": "x"}))).await;
        assert!(matches!(missing, Err(StorageError::InvalidData(_))));
        let numeric = table.put(make_item(json!({"id": 5}))).await;
        assert!(matches!(numeric, Err(StorageError::InvalidData(_))));
        let empty = table.put(make_item(json!({"id": ""}))).await;
        assert!(matches!(empty, Err(StorageError::InvalidData(_))));
    }
}

#[tokio::test]
async fn put_preserves_nested_values() {
    for table in backends() {
        let item = make_item(json!({"id": "n", "tags": ["x", "y"], "meta": {"k": [1, 2]}}));
        table.put(item.clone()).await.unwrap();
        let rows = table.scan(None).await.unwrap();
        assert_eq!(rows, vec![item]);
    }
}

// ── update ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_attributes() {
    for table in backends() {
        seed(table.as_ref()).await;
        let row = table
            .update("a", make_item(json!({"age": 31, "city": "Oslo"})), None)
            .await
            .unwrap();
        assert_eq!(row["name"], json!("Ann"));
        assert_eq!(row["age"], json!(31));
        assert_eq!(row["city"], json!("Oslo"));

        let stored = table.scan(Some(&Filter::by_id("a"))).await.unwrap();
        assert_eq!(stored[0], row);
    }
}

#[tokio::test]
async fn update_never_changes_id() {
    for table in backends() {
        seed(table.as_ref()).await;
        let row = table
            .update("a", make_item(json!({"id": "hijack"})), None)
            .await
            .unwrap();
        assert_eq!(row["id"], json!("a"));
        assert!(table.scan(Some(&Filter::by_id("hijack"))).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
    for table in backends() {
        let err = table.update("nope", Item::new(), None).await.unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }
}

#[tokio::test]
async fn update_with_satisfied_condition() {
    for table in backends() {
        seed(table.as_ref()).await;
        let cond = Condition::equals("age", 30);
        let row = table
            .update("a", make_item(json!({"age": 31})), Some(&cond))
            .await
            .unwrap();
        assert_eq!(row["age"], json!(31));
    }
}

#[tokio::test]
async fn update_condition_compares_numbers_by_value() {
    for table in backends() {
        seed(table.as_ref()).await;
        let cond = Condition::equals("age", 30.0);
        let row = table
            .update("a", make_item(json!({"age": 31})), Some(&cond))
            .await
            .unwrap();
        assert_eq!(row["age"], json!(31));
    }
}

#[tokio::test]
async fn update_with_failed_condition_leaves_row() {
    for table in backends() {
        seed(table.as_ref()).await;
        let cond = Condition::equals("age", 99);
        let err = table
            .update("a", make_item(json!({"age": 31})), Some(&cond))
            .await
            .unwrap_err();
        assert!(err.is_condition_failed(), "{err}");
        let stored = table.scan(Some(&Filter::by_id("a"))).await.unwrap();
        assert_eq!(stored[0]["age"], json!(30));
    }
}

#[tokio::test]
async fn update_absent_condition() {
    for table in backends() {
        seed(table.as_ref()).await;
        let cond = Condition::absent("version");
        table
            .update("a", make_item(json!({"version": 1})), Some(&cond))
            .await
            .unwrap();
        let err = table
            .update("a", make_item(json!({"version": 2})), Some(&cond))
            .await
            .unwrap_err();
        assert!(err.is_condition_failed());
    }
}

#[tokio::test]
async fn update_missing_row_with_condition_fails_condition() {
    for table in backends() {
        let cond = Condition::absent("version");
        let err = table.update("nope", Item::new(), Some(&cond)).await.unwrap_err();
        assert!(err.is_condition_failed(), "{err}");
    }
}

// ── delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_row() {
    for table in backends() {
        seed(table.as_ref()).await;
        table.delete("a", None).await.unwrap();
        assert!(table.scan(Some(&Filter::by_id("a"))).await.unwrap().is_empty());
        assert_eq!(table.scan(None).await.unwrap().len(), 2);
    }
}

#[tokio::test]
async fn delete_with_id_condition() {
    for table in backends() {
        seed(table.as_ref()).await;
        let cond = Condition::equals("id", "a");
        table.delete("a", Some(&cond)).await.unwrap();
        let again = table.delete("a", Some(&cond)).await.unwrap_err();
        assert!(again.is_condition_failed(), "{again}");
    }
}

#[tokio::test]
async fn delete_missing_without_condition_is_not_found() {
    for table in backends() {
        let err = table.delete("ghost", None).await.unwrap_err();
        assert!(err.is_not_found());
    }
}

#[tokio::test]
async fn table_name_is_reported() {
    for table in backends() {
        assert_eq!(table.table_name(), "records");
    }
}
