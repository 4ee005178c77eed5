//! Integration tests for record persistence and queries.

use docgraph_store::IndexSpec;
use docgraph_testkit::prelude::*;
use serde_json::json;

fn ctx() -> SaveContext {
    SaveContext::new()
}

fn extended_people(db: &TestDatabase) -> Vec<ExtendedIdentity> {
    let collection = db.collection::<ExtendedIdentity>();
    collection
        .ensure_collection()
        .expect("Failed to create collection");

    [
        ("alice", "xxx", "nnn"),
        ("bob", "zzz", "mmm"),
        ("cecil", "yyy", "lll"),
        ("david", "yyy", "mmm"),
    ]
    .into_iter()
    .map(|(name, extra, text)| {
        let mut record = ExtendedIdentity::new(name);
        record.extra = Some(extra.to_string());
        record.sub = Some(SubModel {
            text: text.to_string(),
        });
        collection
            .save(&mut record, &ctx())
            .expect("Failed to save record");
        record
    })
    .collect()
}

fn sorted_names(db: &TestDatabase, sort: Sort) -> Vec<String> {
    db.collection::<ExtendedIdentity>()
        .find(&FindOptions::new().sort(sort))
        .unwrap()
        .to_list()
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect()
}

#[test]
fn save_assigns_key_and_rev() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();

    let mut alice = Identity::new("Alice");
    assert!(!alice.is_persisted());
    identities.save(&mut alice, &ctx()).unwrap();

    assert!(alice.is_persisted());
    let key = alice.key().unwrap().to_string();
    assert_eq!(key.len(), 36);

    let loaded = identities.load(&key).unwrap();
    assert_eq!(loaded, alice);
    assert_eq!(
        db.identifier(&alice),
        Some(format!("{}/{}", identities.name(), key))
    );
}

#[test]
fn store_assigns_keys_without_generator() {
    let db = TestDatabase::plain();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();

    let mut alice = Identity::new("Alice");
    identities.save(&mut alice, &ctx()).unwrap();
    assert!(alice.key().is_some());
    assert_eq!(identities.name(), "identities");
}

#[test]
fn user_supplied_key_is_kept() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();

    let mut alice = Identity::new("Alice");
    alice.meta = DocumentMeta::with_key("alice");
    identities.save(&mut alice, &ctx()).unwrap();
    assert_eq!(alice.key(), Some("alice"));
    assert_eq!(identities.load("alice").unwrap().name, "Alice");
}

#[test]
fn save_updates_existing_record() {
    let (db, mut records) = scenarios::identities(&["Alice"]);
    let identities = db.collection::<Identity>();
    let alice = &mut records[0];
    let first_rev = alice.rev().to_string();

    alice.name = "Alicia".into();
    identities.save(alice, &ctx()).unwrap();

    assert_ne!(alice.rev(), first_rev);
    assert_eq!(identities.count().unwrap(), 1);
    assert_eq!(identities.load(alice.key().unwrap()).unwrap().name, "Alicia");
}

#[test]
fn stale_revision_is_rejected() {
    let (db, mut records) = scenarios::identities(&["Alice"]);
    let identities = db.collection::<Identity>();
    let mut stale = records[0].clone();

    records[0].name = "Alicia".into();
    identities.save(&mut records[0], &ctx()).unwrap();

    stale.name = "Ali".into();
    let err = identities.save(&mut stale, &ctx()).unwrap_err();
    assert_eq!(err.store_code(), Some(docgraph_store::codes::CONFLICT));
}

#[test]
fn unique_constraint_then_retry() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();
    identities
        .ensure_index(&IndexSpec::unique(["name"]))
        .unwrap();

    let mut alice = Identity::new("Alice");
    identities.save(&mut alice, &ctx()).unwrap();

    let mut clone = Identity::new("Alice");
    let err = identities.save(&mut clone, &ctx()).unwrap_err();
    assert!(matches!(err, CoreError::UniqueConstraint { .. }));
    assert!(!clone.is_persisted());

    clone.name = "Alice 2".into();
    identities.save(&mut clone, &ctx()).unwrap();
    assert!(clone.is_persisted());
    assert_eq!(identities.count().unwrap(), 2);
}

#[test]
fn delete_record() {
    let (db, records) = scenarios::identities(&["Alice"]);
    let identities = db.collection::<Identity>();
    let alice = &records[0];

    assert!(identities.delete(alice, false).unwrap());
    assert!(matches!(
        identities.load(alice.key().unwrap()),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(matches!(
        identities.delete(alice, false),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(!identities.delete(alice, true).unwrap());
}

#[test]
fn delete_unsaved_record() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();

    let transient = Identity::new("Ghost");
    assert!(!identities.delete(&transient, true).unwrap());
    assert!(matches!(
        identities.delete(&transient, false),
        Err(CoreError::ModelNotFound { .. })
    ));
}

#[test]
fn reload_picks_up_changes() {
    let (db, mut records) = scenarios::identities(&["Alice"]);
    let identities = db.collection::<Identity>();
    let mut other = identities.load(records[0].key().unwrap()).unwrap();

    other.name = "Changed".into();
    identities.save(&mut other, &ctx()).unwrap();

    identities.reload(&mut records[0]).unwrap();
    assert_eq!(records[0].name, "Changed");
    assert_eq!(records[0].rev(), other.rev());
}

#[test]
fn before_save_reads_context() {
    let db = TestDatabase::new();
    let collection = db.collection::<ExtendedIdentity>();
    collection.ensure_collection().unwrap();

    let mut record = ExtendedIdentity::new("Alice");
    record.extra = Some("original".into());
    collection.save(&mut record, &ctx()).unwrap();
    assert_eq!(record.extra.as_deref(), Some("original"));

    let override_ctx = SaveContext::new().with("override_extra", "overridden");
    collection.save(&mut record, &override_ctx).unwrap();
    assert_eq!(record.extra.as_deref(), Some("overridden"));

    let stored = collection.load(record.key().unwrap()).unwrap();
    assert_eq!(stored.extra.as_deref(), Some("overridden"));
}

#[test]
fn save_stamps_times() {
    let db = TestDatabase::new();
    let collection = db.collection::<ExtendedIdentity>();
    collection.ensure_collection().unwrap();

    let mut record = ExtendedIdentity::new("Alice");
    collection.save(&mut record, &ctx()).unwrap();
    let created = record.times.time_created.unwrap();
    assert_eq!(record.times.time_updated, Some(created));

    record.times.time_updated = Some(0);
    collection.save(&mut record, &ctx()).unwrap();
    let stored = collection.load(record.key().unwrap()).unwrap();
    assert_eq!(stored.times.time_created, Some(created));
    assert!(stored.times.time_updated.unwrap() >= created);

    let raw = db
        .store()
        .get(collection.name(), record.key().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(raw.get("time_created"), Some(&json!(created)));
}

#[test]
fn nested_values_round_trip() {
    let db = TestDatabase::new();
    let collection = db.collection::<ExtendedIdentity>();
    collection.ensure_collection().unwrap();

    let mut record = ExtendedIdentity::new("Alice");
    record.sub = Some(SubModel {
        text: "nested".into(),
    });
    collection.save(&mut record, &ctx()).unwrap();

    let found = collection
        .find_one(Filters::new().eq("sub.text", "nested"), Sort::new(), true)
        .unwrap();
    assert_eq!(found, record);
}

#[test]
fn delete_collection() {
    let (db, _) = scenarios::identities(&["Alice"]);
    let identities = db.collection::<Identity>();

    assert!(identities.delete_collection(false).unwrap());
    assert!(matches!(
        identities.count(),
        Err(CoreError::DataSourceNotFound { .. })
    ));
    assert!(matches!(
        identities.delete_collection(false),
        Err(CoreError::DataSourceNotFound { .. })
    ));
    assert!(!identities.delete_collection(true).unwrap());
}

#[test]
fn truncate_collection() {
    let (db, _) = scenarios::identities(&["Alice", "Bob"]);
    let identities = db.collection::<Identity>();

    assert!(identities.truncate_collection(false).unwrap());
    assert_eq!(identities.count().unwrap(), 0);

    identities.delete_collection(false).unwrap();
    assert!(!identities.truncate_collection(true).unwrap());
    assert!(matches!(
        identities.truncate_collection(false),
        Err(CoreError::DataSourceNotFound { .. })
    ));
}

#[test]
fn edges_link_records() {
    let (db, records) = scenarios::identities(&["Alice", "Bob"]);
    let links = db.collection::<Link>();
    links.ensure_collection().unwrap();
    let (alice, bob) = (&records[0], &records[1]);

    let mut link = Link::new(Endpoint::to(alice), Endpoint::to(bob), "friend");
    links.save(&mut link, &ctx()).unwrap();
    assert!(link.is_persisted());

    let stored = links.load(link.key().unwrap()).unwrap();
    assert_eq!(stored.edge.from.key().as_deref(), alice.key());
    assert_eq!(stored.edge.to.key().as_deref(), bob.key());
    assert_eq!(stored.link_type, "friend");
    assert_eq!(stored.edge.from.resolve(db.names()), db.identifier(alice));

    let found = links
        .find_one(
            Filters::new()
                .eq("_from", Endpoint::to(alice))
                .eq("_to", Operand::record(bob)),
            Sort::new(),
            true,
        )
        .unwrap();
    assert_eq!(found.key(), link.key());

    let none = links.find_one(
        Filters::new().eq("_from", Endpoint::to(bob)),
        Sort::new(),
        false,
    );
    assert!(matches!(none, Err(CoreError::ModelNotFound { .. })));
}

#[test]
fn edge_endpoints_may_be_raw_ids() {
    let (db, records) = scenarios::identities(&["Alice", "Bob"]);
    let links = db.collection::<Link>();
    links.ensure_collection().unwrap();

    let from = db.identifier(&records[0]).unwrap();
    let to = db.identifier(&records[1]).unwrap();
    let mut link = Link::new(from.as_str(), to.clone(), "colleague");
    links.save(&mut link, &ctx()).unwrap();

    let stored = links.load(link.key().unwrap()).unwrap();
    assert_eq!(stored.edge.to.resolve(db.names()), Some(to));
}

#[test]
fn edge_with_unsaved_endpoint_is_rejected() {
    let (db, records) = scenarios::identities(&["Alice"]);
    let links = db.collection::<Link>();
    links.ensure_collection().unwrap();

    let ghost = Identity::new("Ghost");
    let mut link = Link::new(Endpoint::to(&records[0]), Endpoint::to(&ghost), "friend");
    let err = links.save(&mut link, &ctx()).unwrap_err();
    assert!(matches!(err, CoreError::ModelNotFound { .. }));
    assert_eq!(links.count().unwrap(), 0);
}

#[test]
fn sort_single_key_descending() {
    let db = TestDatabase::new();
    extended_people(&db);
    assert_eq!(
        sorted_names(&db, Sort::new().desc("name")),
        ["david", "cecil", "bob", "alice"]
    );
}

#[test]
fn sort_multiple_keys() {
    let db = TestDatabase::new();
    extended_people(&db);
    assert_eq!(
        sorted_names(&db, Sort::new().by("extra", "desc").by("name", "Asc")),
        ["bob", "cecil", "david", "alice"]
    );
}

#[test]
fn sort_nested_path() {
    let db = TestDatabase::new();
    extended_people(&db);
    let sort: Sort = [("sub.text", "ASC"), ("extra", "ASC")].into_iter().collect();
    assert_eq!(sorted_names(&db, sort), ["cecil", "david", "bob", "alice"]);
}

#[test]
fn invalid_sort_direction_fails_before_query() {
    let db = TestDatabase::new();
    extended_people(&db);
    let err = db
        .collection::<ExtendedIdentity>()
        .find(&FindOptions::new().sort(Sort::new().by("name", "sideways")))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidSortDirection { .. }));
}

#[test]
fn find_one_with_sort() {
    let db = TestDatabase::new();
    extended_people(&db);
    let collection = db.collection::<ExtendedIdentity>();

    let first = collection
        .find_one(
            Filters::new().eq("extra", "yyy"),
            Sort::new().asc("sub.text"),
            false,
        )
        .unwrap();
    assert_eq!(first.name, "cecil");

    let last = collection
        .find_one(
            Filters::new().eq("extra", "yyy"),
            Sort::new().desc("sub.text"),
            false,
        )
        .unwrap();
    assert_eq!(last.name, "david");
}

#[test]
fn find_one_multiple_matches() {
    let db = TestDatabase::new();
    extended_people(&db);
    let collection = db.collection::<ExtendedIdentity>();

    let err = collection
        .find_one(Filters::new().eq("extra", "yyy"), Sort::new(), true)
        .unwrap_err();
    assert!(matches!(err, CoreError::MultipleModelsFound { .. }));

    let any = collection
        .find_one(Filters::new().eq("extra", "yyy"), Sort::new(), false)
        .unwrap();
    assert_eq!(any.extra.as_deref(), Some("yyy"));
}

#[test]
fn find_with_comparisons() {
    let (db, records) = scenarios::identities(&["Alice", "Bob", "Cecil"]);
    let identities = db.collection::<Identity>();

    let names = |filters: Filters| -> Vec<String> {
        identities
            .find(&FindOptions::new().filters(filters).sort(Sort::new().asc("name")))
            .unwrap()
            .to_list()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect()
    };

    assert_eq!(names(Filters::new().op("name", ">", "Alice")), ["Bob", "Cecil"]);
    assert_eq!(
        names(Filters::new().op("name", ">=", "Bob").op("name", "<", "Cecil")),
        ["Bob"]
    );
    assert_eq!(
        names(Filters::new().op("_id", "!=", Operand::record(&records[0]))),
        ["Bob", "Cecil"]
    );
    assert_eq!(
        names(Filters::new().op("name", "IN", json!(["Alice", "Cecil"]))),
        ["Alice", "Cecil"]
    );
    assert_eq!(names(Filters::new().op("name", "LIKE", "%e%")), ["Alice", "Cecil"]);
}

#[test]
fn literal_then_operator_on_same_field() {
    let (db, _) = scenarios::identities(&["Alice", "Bob"]);
    let found = db
        .collection::<Identity>()
        .find(&FindOptions::new().filters(Filters::new().eq("name", "Bob").op("name", "!=", "Alice")))
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Bob");
}

#[test]
fn repeated_operator_keeps_last_operand() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();
    identities
        .save(&mut Identity::with_data("A", json!({ "tags": ["x"] })), &ctx())
        .unwrap();
    identities
        .save(&mut Identity::with_data("B", json!({ "tags": ["x", "y"] })), &ctx())
        .unwrap();

    let filters = Filters::new()
        .op("data.tags", "ANY ==", "x")
        .op("data.tags", "ANY ==", "y");
    let found = identities
        .find(&FindOptions::new().filters(filters))
        .unwrap()
        .to_list()
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "B");
}

#[test]
fn unsupported_operator_fails_before_query() {
    let (db, _) = scenarios::identities(&["Alice"]);
    let err = db
        .collection::<Identity>()
        .find(&FindOptions::new().filters(Filters::new().op("name", "~~", "A")))
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedOperator { .. }));
}

#[test]
fn offset_requires_limit() {
    let (db, _) = scenarios::identities(&["Alice"]);
    let err = db
        .collection::<Identity>()
        .find(&FindOptions::new().offset(1))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidQuery { .. }));
}

#[test]
fn all_with_limit_and_skip() {
    let (db, _) = scenarios::identities(&["Alice", "Bob", "Cecil", "David"]);
    let identities = db.collection::<Identity>();

    assert_eq!(identities.all(None, None).unwrap().len(), 4);
    assert_eq!(identities.all(Some(2), None).unwrap().len(), 2);
    assert_eq!(identities.all(Some(10), Some(3)).unwrap().len(), 1);
    assert_eq!(identities.all(None, Some(1)).unwrap().len(), 3);
    assert_eq!(db.store.open_cursors(), 0);
}

#[test]
fn keys_ids_and_get_many() {
    let (db, records) = scenarios::identities(&["Alice", "Bob"]);
    let identities = db.collection::<Identity>();

    let mut keys = identities.keys().unwrap();
    keys.sort();
    let mut expected: Vec<String> = records
        .iter()
        .map(|r| r.key().unwrap().to_string())
        .collect();
    expected.sort();
    assert_eq!(keys, expected);

    let ids = identities.ids().unwrap();
    assert!(ids
        .iter()
        .all(|id| id.starts_with(&format!("{}/", identities.name()))));

    let mut wanted = expected.clone();
    wanted.push("missing".into());
    let loaded = identities.get_many(&wanted).unwrap();
    assert_eq!(loaded.len(), 2);
}

#[test]
fn insert_many_assigns_headers() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();

    let mut records = vec![Identity::new("Alice"), Identity::new("Bob")];
    identities.insert_many(&mut records, &ctx()).unwrap();

    assert!(records.iter().all(|r| r.is_persisted()));
    assert_eq!(identities.count().unwrap(), 2);
}

#[test]
fn insert_many_reports_unique_violation() {
    let db = TestDatabase::new();
    let identities = db.collection::<Identity>();
    identities.ensure_collection().unwrap();
    identities
        .ensure_index(&IndexSpec::unique(["name"]))
        .unwrap();

    let mut records = vec![Identity::new("Alice"), Identity::new("Alice")];
    let err = identities.insert_many(&mut records, &ctx()).unwrap_err();
    assert!(matches!(err, CoreError::UniqueConstraint { .. }));
    assert_eq!(identities.count().unwrap(), 1);

    // The stored record is in sync with the store and can be saved again.
    assert!(records[0].is_persisted());
    assert!(!records[1].is_persisted());
    records[0].name = "Alice Liddell".into();
    identities.save(&mut records[0], &ctx()).unwrap();
    assert_eq!(identities.count().unwrap(), 1);

    identities.save(&mut records[1], &ctx()).unwrap();
    assert_eq!(identities.count().unwrap(), 2);
}
