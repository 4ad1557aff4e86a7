use bson::doc;
use docbridge::{Bridge, BridgeError, MemoryStore};

fn catalog_bridge() -> Bridge<MemoryStore> {
    let store = MemoryStore::new();
    store.seed(
        "catalog",
        vec![doc! {
            "_id": "c1",
            "name": "widget",
            "price": 4.5,
            "stocked": true,
            "tags": ["a", "b"],
            "dims": {"w": 2, "h": 3},
            "variants": [{"sku": "w-1"}, {"sku": "w-2"}],
        }],
    );
    Bridge::new(store)
}

fn project(bridge: &Bridge<MemoryStore>, fields: &[&str]) -> docbridge::ResultEntry {
    let mut rows = bridge
        .execute_with(
            "catalog.findOne({})",
            &[],
            fields.iter().map(|f| (*f).to_string()).collect(),
        )
        .unwrap();
    assert!(rows.has_next());
    rows.next_entry().unwrap()
}

#[test]
fn scalar_fields_resolve_from_document_rows() {
    let bridge = catalog_bridge();
    let entry = project(
        &bridge,
        &["result.name", "result.price", "result.stocked", "result._id"],
    );
    assert_eq!(entry.get("result.name"), Some("widget"));
    assert_eq!(entry.get("result.price"), Some("4.5"));
    assert_eq!(entry.get("result.stocked"), Some("true"));
    assert_eq!(entry.get("result._id"), Some("c1"));
}

#[test]
fn nested_objects_and_array_indexes_resolve() {
    let bridge = catalog_bridge();
    let entry = project(&bridge, &["result.dims.w", "result.tags[1]", "result.variants[0].sku"]);
    assert_eq!(entry.get("result.dims.w"), Some("2"));
    assert_eq!(entry.get("result.tags[1]"), Some("b"));
    assert_eq!(entry.get("result.variants[0].sku"), Some("w-1"));
}

#[test]
fn bare_alias_binds_the_whole_row() {
    let bridge = catalog_bridge();
    let entry = project(&bridge, &["result"]);
    let raw = entry.get("result").unwrap();
    let v: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(v["name"], "widget");
}

#[test]
fn foreign_rooted_paths_stay_unresolved() {
    let bridge = catalog_bridge();
    let entry = project(&bridge, &["other.name", "result.name"]);
    assert_eq!(entry.get("other.name"), None);
    assert_eq!(entry.get("result.name"), Some("widget"));
    let columns: Vec<&str> = entry.iter().map(|(name, _)| name).collect();
    assert_eq!(columns, ["other.name", "result.name"]);
}

#[test]
fn unresolvable_paths_fail_the_row() {
    let bridge = catalog_bridge();
    for path in
        ["result.missing", "result.tags[9]", "result.dims", "result.tags[x]", "result.name.deep"]
    {
        let mut rows = bridge
            .execute_with("catalog.findOne({})", &[], vec![path.to_string()])
            .unwrap();
        assert!(rows.has_next(), "path {path}");
        let err = rows.next_entry().unwrap_err();
        assert!(matches!(err, BridgeError::DataExtraction(_)), "path {path}");
    }
}

#[test]
fn extraction_failure_aborts_the_rest_of_the_stream() {
    let store = MemoryStore::new();
    store.seed(
        "mixed",
        vec![doc! {"_id": "m1", "other": 1}, doc! {"_id": "m2", "name": "ok"}],
    );
    let bridge = Bridge::new(store);
    let mut rows = bridge
        .execute_with("mixed.find({})", &[], vec!["result.name".to_string()])
        .unwrap();
    assert!(rows.has_next());
    assert!(rows.next_entry().is_err());
    // the second row would resolve, but the set is already dead
    assert!(!rows.has_next());
    assert!(matches!(rows.next_entry(), Err(BridgeError::NoResult)));
}

#[test]
fn count_and_exists_rows_bind_only_the_alias_column() {
    let bridge = catalog_bridge();
    let mut rows = bridge
        .execute_with(
            "catalog.count()",
            &[],
            vec!["result".to_string(), "result.name".to_string()],
        )
        .unwrap();
    assert!(rows.has_next());
    let entry = rows.next_entry().unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.get("result"), Some("1"));
}
