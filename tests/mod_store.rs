use bson::doc;
use docbridge::{CollectionHandle as _, DocumentStore as _, MemoryStore, UpdateOptions};

fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.seed(
        "crew",
        vec![
            doc! {"_id": "a", "name": "alice", "age": 30, "rank": {"level": 2}},
            doc! {"_id": "b", "name": "bob", "age": 40, "rank": {"level": 5}},
            doc! {"_id": "c", "name": "carol", "age": 35},
        ],
    );
    store
}

#[test]
fn comparison_operators_match_across_numeric_types() {
    let store = seeded();
    let crew = store.collection("crew");
    assert_eq!(crew.count_documents(Some(&doc! {"age": {"$gt": 30}})).unwrap(), 2);
    assert_eq!(crew.count_documents(Some(&doc! {"age": {"$gte": 30.0}})).unwrap(), 3);
    assert_eq!(crew.count_documents(Some(&doc! {"age": {"$lt": 35}})).unwrap(), 1);
    assert_eq!(crew.count_documents(Some(&doc! {"age": {"$ne": 40}})).unwrap(), 2);
    assert_eq!(crew.count_documents(Some(&doc! {"age": {"$eq": 35}})).unwrap(), 1);
}

#[test]
fn set_membership_and_existence() {
    let store = seeded();
    let crew = store.collection("crew");
    assert_eq!(
        crew.count_documents(Some(&doc! {"name": {"$in": ["alice", "zed"]}})).unwrap(),
        1
    );
    assert_eq!(
        crew.count_documents(Some(&doc! {"name": {"$nin": ["alice", "bob"]}})).unwrap(),
        1
    );
    assert_eq!(
        crew.count_documents(Some(&doc! {"rank": {"$exists": true}})).unwrap(),
        2
    );
    assert_eq!(
        crew.count_documents(Some(&doc! {"rank": {"$exists": false}})).unwrap(),
        1
    );
}

#[test]
fn logical_operators_combine_clauses() {
    let store = seeded();
    let crew = store.collection("crew");
    let both = doc! {"$and": [{"age": {"$gt": 20}}, {"age": {"$lt": 36}}]};
    assert_eq!(crew.count_documents(Some(&both)).unwrap(), 2);
    let either = doc! {"$or": [{"name": "alice"}, {"name": "bob"}]};
    assert_eq!(crew.count_documents(Some(&either)).unwrap(), 2);
    let neither = doc! {"$nor": [{"name": "alice"}, {"name": "bob"}]};
    assert_eq!(crew.count_documents(Some(&neither)).unwrap(), 1);
}

#[test]
fn dotted_paths_reach_into_subdocuments() {
    let store = seeded();
    let crew = store.collection("crew");
    assert_eq!(
        crew.count_documents(Some(&doc! {"rank.level": {"$gte": 5}})).unwrap(),
        1
    );
}

#[test]
fn modifier_set_inc_unset() {
    let store = seeded();
    let crew = store.collection("crew");
    let report = crew
        .update_one(
            &doc! {"_id": "a"},
            &doc! {"$set": {"name": "ALICE"}, "$inc": {"age": 1}, "$unset": {"rank": 1}},
            UpdateOptions::default(),
        )
        .unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(report.modified, 1);
    assert!(!report.upserted);
    let doc = crew.find_one(&doc! {"_id": "a"}).unwrap().unwrap();
    assert_eq!(doc.get_str("name").unwrap(), "ALICE");
    assert_eq!(doc.get_i64("age").unwrap(), 31);
    assert!(!doc.contains_key("rank"));
}

#[test]
fn plain_modifier_replaces_but_keeps_the_id() {
    let store = seeded();
    let crew = store.collection("crew");
    crew.update_one(&doc! {"_id": "b"}, &doc! {"name": "rebuilt"}, UpdateOptions::default())
        .unwrap();
    let doc = crew.find_one(&doc! {"name": "rebuilt"}).unwrap().unwrap();
    assert_eq!(doc.get_str("_id").unwrap(), "b");
    assert!(!doc.contains_key("age"));
}

#[test]
fn upsert_seeds_from_equality_filter() {
    let store = seeded();
    let crew = store.collection("crew");
    let report = crew
        .update_one(
            &doc! {"name": "dave", "age": {"$gt": 10}},
            &doc! {"$set": {"rank": {"level": 1}}},
            UpdateOptions { upsert: true },
        )
        .unwrap();
    assert_eq!(report.matched, 0);
    assert!(report.upserted);
    let doc = crew.find_one(&doc! {"name": "dave"}).unwrap().unwrap();
    // operator clauses do not seed fields
    assert!(!doc.contains_key("age"));
    assert_eq!(doc.get_document("rank").unwrap().get_i32("level").unwrap(), 1);
    assert!(doc.contains_key("_id"));
}

#[test]
fn delete_many_reports_the_removed_count() {
    let store = seeded();
    let crew = store.collection("crew");
    let report = crew.delete_many(&doc! {"age": {"$lte": 35}}).unwrap();
    assert_eq!(report.deleted, 2);
    assert_eq!(crew.count_documents(None).unwrap(), 1);
}

#[test]
fn cursors_snapshot_at_call_time() {
    let store = seeded();
    let crew = store.collection("crew");
    let mut cursor = crew.find(&doc! {}).unwrap();
    crew.insert_one(doc! {"name": "late"}).unwrap();
    let mut seen = 0;
    while cursor.try_next().unwrap().is_some() {
        seen += 1;
    }
    assert_eq!(seen, 3);
}

#[test]
fn collection_names_come_back_sorted() {
    let store = MemoryStore::new();
    store.seed("zoo", vec![doc! {"n": 1}]);
    store.seed("alpha", vec![doc! {"n": 2}]);
    store.create_collection("mid").unwrap();
    assert_eq!(store.list_collection_names().unwrap(), ["alpha", "mid", "zoo"]);
}

#[test]
fn clones_share_the_same_data() {
    let store = MemoryStore::new();
    let twin = store.clone();
    store.seed("shared", vec![doc! {"n": 1}]);
    assert_eq!(twin.collection("shared").count_documents(None).unwrap(), 1);
}
