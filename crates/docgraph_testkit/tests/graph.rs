//! Integration tests for named graphs.

use docgraph_store::{codes, IndexSpec};
use docgraph_testkit::prelude::*;
use parking_lot::RwLock;
use std::sync::Arc;

fn ctx() -> SaveContext {
    SaveContext::new()
}

#[test]
fn ensure_is_idempotent() {
    let db = TestDatabase::new();
    let graph = db.graph::<RelationGraph>();
    assert!(!graph.exists().unwrap());

    graph.ensure().unwrap();
    graph.ensure().unwrap();
    assert!(graph.exists().unwrap());

    let people = db.collection::<Person>();
    let relations = db.collection::<Relation>();
    assert!(db.store().has_collection(people.name()).unwrap());
    assert!(db.store().has_collection(relations.name()).unwrap());

    let definition = graph.definition();
    assert_eq!(definition.edge_definitions.len(), 1);
    assert_eq!(definition.edge_definitions[0].edge_collection, relations.name());
}

#[test]
fn save_through_graph() {
    let (db, mut people) = scenarios::people_graph(&["Alice", "Bob"]);
    let graph = db.graph::<RelationGraph>();
    let persons = db.collection::<Person>();

    people[0].name = "Alice in Wonderland".into();
    graph.save(&mut people[0], &ctx()).unwrap();
    persons.reload(&mut people[0]).unwrap();
    assert_eq!(people[0].name, "Alice in Wonderland");

    let mut ab = Relation::new(Endpoint::to(&people[0]), Endpoint::to(&people[1]), "BFF");
    graph.save(&mut ab, &ctx()).unwrap();
    assert!(ab.key().is_some());
    assert!(ab.is_persisted());

    ab.kind = "BF".into();
    graph.save(&mut ab, &ctx()).unwrap();
    db.collection::<Relation>().reload(&mut ab).unwrap();
    assert_eq!(ab.kind, "BF");
}

#[test]
fn shared_endpoints_resolve_at_save_time() {
    let db = TestDatabase::new();
    let graph = db.graph::<RelationGraph>();
    graph.ensure().unwrap();

    let alice = Arc::new(RwLock::new(Person::new("Alice")));
    let bob = Arc::new(RwLock::new(Person::new("Bob")));
    let mut ab = Relation::new(Endpoint::shared(&alice), Endpoint::shared(&bob), "BFF");
    assert!(matches!(
        graph.save(&mut ab, &ctx()),
        Err(CoreError::ModelNotFound { .. })
    ));

    graph.save(&mut *alice.write(), &ctx()).unwrap();
    graph.save(&mut *bob.write(), &ctx()).unwrap();
    graph.save(&mut ab, &ctx()).unwrap();

    let stored = db.collection::<Relation>().load(ab.key().unwrap()).unwrap();
    assert_eq!(stored.edge.from.key(), alice.read().key().map(str::to_string));
    assert_eq!(stored.edge.to.key(), bob.read().key().map(str::to_string));
}

#[test]
fn save_through_graph_with_missing_vertex() {
    let (db, people) = scenarios::people_graph(&["Alice", "Bob", "Cecil"]);
    let graph = db.graph::<RelationGraph>();
    let persons = db.collection::<Person>();
    let (alice, bob, cecil) = (&people[0], &people[1], &people[2]);

    let bob_id = db.identifier(bob).unwrap();
    assert!(persons.delete(bob, false).unwrap());
    let mut ab = Relation::new(Endpoint::to(alice), bob_id, "BFF");
    assert!(matches!(
        graph.save(&mut ab, &ctx()),
        Err(CoreError::ModelNotFound { .. })
    ));

    let mut ac = Relation::new(Endpoint::to(alice), Endpoint::to(cecil), "BFF");
    graph.save(&mut ac, &ctx()).unwrap();
    assert!(persons.delete(cecil, false).unwrap());
    assert!(matches!(
        graph.save(&mut ac, &ctx()),
        Err(CoreError::ModelNotFound { .. })
    ));
}

#[test]
fn save_foreign_vertex_through_graph() {
    let db = TestDatabase::new();
    let graph = db.graph::<RelationGraph>();
    graph.ensure().unwrap();
    db.collection::<Identity>().ensure_collection().unwrap();

    let err = graph
        .save(&mut Identity::new("Stranger"), &ctx())
        .unwrap_err();
    assert_eq!(err.store_code(), Some(codes::GRAPH_VERTEX_COLLECTION_NOT_USED));
}

#[test]
fn unique_constraint_through_graph() {
    let db = TestDatabase::new();
    let graph = db.graph::<RelationGraph>();
    graph.ensure().unwrap();
    let persons = db.collection::<Person>();
    persons.ensure_index(&IndexSpec::unique(["name"])).unwrap();

    let key = uuid::Uuid::new_v4().to_string();
    let mut person = Person::new("John Doe");
    person.meta = DocumentMeta::with_key(key.clone());
    graph.save(&mut person, &ctx()).unwrap();
    assert!(person.is_persisted());
    assert_eq!(persons.load(&key).unwrap().key(), Some(key.as_str()));

    let mut person_2 = Person::new("Jane Doe");
    person_2.meta = DocumentMeta::with_key(key.clone());
    assert!(matches!(
        graph.save(&mut person_2, &ctx()),
        Err(CoreError::UniqueConstraint { .. })
    ));

    person_2.meta.key = None;
    persons.save(&mut person_2, &ctx()).unwrap();
    assert_ne!(person_2.key(), Some(key.as_str()));

    let mut person_3 = Person::new("Jane Doe");
    assert!(matches!(
        graph.save(&mut person_3, &ctx()),
        Err(CoreError::UniqueConstraint { .. })
    ));

    person_3.name = "Jane Jr. Doe".into();
    graph.save(&mut person_3, &ctx()).unwrap();

    person_3.name = "Jane Doe".into();
    assert!(matches!(
        graph.save(&mut person_3, &ctx()),
        Err(CoreError::UniqueConstraint { .. })
    ));
}

#[test]
fn deletion_through_graph() {
    let db = TestDatabase::new();
    let primary = db.graph::<RelationGraph>();
    let secondary = db.graph::<SecondaryRelationGraph>();
    primary.ensure().unwrap();
    secondary.ensure().unwrap();

    let persons = db.collection::<Person>();
    let relations = db.collection::<Relation>();
    let secondary_relations = db.collection::<SecondaryRelation>();

    let mut alice = Person::new("Alice");
    let mut bob = Person::new("Bob");
    let mut malory = Person::new("Malory");
    for person in [&mut alice, &mut bob, &mut malory] {
        persons.save(person, &ctx()).unwrap();
    }

    let mut ab = Relation::new(Endpoint::to(&alice), Endpoint::to(&bob), "BFF");
    relations.save(&mut ab, &ctx()).unwrap();
    let mut am = Relation::new(Endpoint::to(&alice), Endpoint::to(&malory), "hates");
    relations.save(&mut am, &ctx()).unwrap();

    let mut ab2 = SecondaryRelation::new(Endpoint::to(&alice), Endpoint::to(&bob), "knows");
    secondary_relations.save(&mut ab2, &ctx()).unwrap();
    let mut am2 = SecondaryRelation::new(Endpoint::to(&alice), Endpoint::to(&malory), "hates");
    secondary_relations.save(&mut am2, &ctx()).unwrap();

    // A plain delete leaves the edges behind.
    assert!(persons.delete(&malory, false).unwrap());
    relations.reload(&mut am).unwrap();
    secondary_relations.reload(&mut am2).unwrap();

    assert!(primary.delete(&am, false).unwrap());
    assert!(secondary.delete(&am2, false).unwrap());
    assert!(!primary.delete(&am, true).unwrap());
    assert!(!secondary.delete(&am2, true).unwrap());

    // Deleting through a graph removes incident edges in every graph.
    assert!(primary.delete(&bob, false).unwrap());
    assert!(matches!(
        relations.reload(&mut ab),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(matches!(
        secondary_relations.reload(&mut ab2),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(matches!(
        primary.delete(&ab, false),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(matches!(
        secondary.delete(&ab2, false),
        Err(CoreError::ModelNotFound { .. })
    ));
    assert!(!primary.delete(&ab, true).unwrap());
    assert!(!secondary.delete(&ab2, true).unwrap());

    assert!(!primary.delete(&bob, true).unwrap());
    assert!(matches!(
        primary.delete(&bob, false),
        Err(CoreError::ModelNotFound { .. })
    ));

    assert_eq!(persons.count().unwrap(), 1);
    assert_eq!(relations.count().unwrap(), 0);
    assert_eq!(secondary_relations.count().unwrap(), 0);
}

#[test]
fn explicit_vertex_and_edge_deletion() {
    let (db, people) = scenarios::people_graph(&["Alice", "Bob"]);
    let graph = db.graph::<RelationGraph>();

    let mut ab = Relation::new(Endpoint::to(&people[0]), Endpoint::to(&people[1]), "BFF");
    graph.save(&mut ab, &ctx()).unwrap();

    assert!(graph.delete_edge(&ab, false).unwrap());
    assert!(graph.delete_vertex(&people[0], false).unwrap());
    assert_eq!(db.collection::<Person>().count().unwrap(), 1);
}

#[test]
fn drop_graph() {
    let db = TestDatabase::new();
    let graph = db.graph::<RelationGraph>();
    graph.ensure().unwrap();
    let people = db.collection::<Person>().name().to_string();
    let relations = db.collection::<Relation>().name().to_string();

    assert!(graph.drop_graph(false, false).unwrap());
    assert!(matches!(
        graph.drop_graph(false, false),
        Err(CoreError::GraphNotFound { .. })
    ));
    assert!(!graph.drop_graph(true, false).unwrap());
    assert!(db.store().has_collection(&people).unwrap());
    assert!(db.store().has_collection(&relations).unwrap());

    graph.ensure().unwrap();
    assert!(graph.drop_graph(false, true).unwrap());
    assert!(matches!(
        graph.drop_graph(false, false),
        Err(CoreError::GraphNotFound { .. })
    ));
    assert!(!db.store().has_collection(&people).unwrap());
    assert!(!db.store().has_collection(&relations).unwrap());
}

#[test]
fn drop_graph_keeps_shared_collections() {
    let db = TestDatabase::new();
    db.graph::<RelationGraph>().ensure().unwrap();
    db.graph::<SecondaryRelationGraph>().ensure().unwrap();

    assert!(db.graph::<RelationGraph>().drop_graph(false, true).unwrap());
    assert!(db
        .store()
        .has_collection(db.collection::<Person>().name())
        .unwrap());
    assert!(!db
        .store()
        .has_collection(db.collection::<Relation>().name())
        .unwrap());
}
