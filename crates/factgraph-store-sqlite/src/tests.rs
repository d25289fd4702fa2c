//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::Utc;
use factgraph_core::{
  Error as CoreError,
  event::{ChannelEventSink, EventName},
  fact::{
    AccessMode, Direction, FactAclEntry, FactBinding, FactComment, FactEntity, FactType,
    ObjectFactBinding, RETRACTION_FACT_TYPE_ID,
  },
  index::{FactDocument, FactIndex},
  provenance::{Organization, Reference, Source},
  retract::{RetractFactRequest, RetractFactService},
  security::{Function, Grant, Session, SessionSecurityContext},
  store::FactStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_fact(access_mode: AccessMode, bindings: Vec<FactBinding>) -> FactEntity {
  let now = Utc::now();
  FactEntity {
    id: Uuid::new_v4(),
    type_id: Uuid::new_v4(),
    value: "evil.example.com".into(),
    organization_id: Uuid::new_v4(),
    source_id: Uuid::new_v4(),
    access_mode,
    bindings,
    in_reference_to_id: None,
    timestamp: now,
    last_seen_timestamp: now,
  }
}

// ─── Facts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_and_get_fact() {
  let s = store().await;
  let fact = new_fact(
    AccessMode::RoleBased,
    vec![
      FactBinding { object_id: Uuid::new_v4(), direction: Direction::FactIsSource },
      FactBinding { object_id: Uuid::new_v4(), direction: Direction::FactIsDestination },
    ],
  );

  let saved = s.save_fact(fact.clone()).await.unwrap();
  assert_eq!(saved, fact);

  let fetched = s.get_fact(fact.id).await.unwrap().unwrap();
  assert_eq!(fetched, fact);
}

#[tokio::test]
async fn get_fact_missing_returns_none() {
  let s = store().await;
  assert!(s.get_fact(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn fact_reference_roundtrip() {
  let s = store().await;
  let original = s.save_fact(new_fact(AccessMode::Public, vec![])).await.unwrap();

  let mut referring = new_fact(AccessMode::Explicit, vec![]);
  referring.in_reference_to_id = Some(original.id);
  s.save_fact(referring.clone()).await.unwrap();

  let fetched = s.get_fact(referring.id).await.unwrap().unwrap();
  assert_eq!(fetched.in_reference_to_id, Some(original.id));
  assert_eq!(fetched.access_mode, AccessMode::Explicit);
}

#[tokio::test]
async fn duplicate_fact_id_is_rejected() {
  let s = store().await;
  let fact = new_fact(AccessMode::Public, vec![]);
  s.save_fact(fact.clone()).await.unwrap();
  assert!(s.save_fact(fact).await.is_err());
}

// ─── Bindings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn object_fact_bindings_by_object() {
  let s = store().await;
  let object_id = Uuid::new_v4();
  let first = s.save_fact(new_fact(AccessMode::Public, vec![])).await.unwrap();
  let second = s.save_fact(new_fact(AccessMode::Public, vec![])).await.unwrap();

  for (fact, direction) in [(&first, Direction::FactIsSource), (&second, Direction::None)] {
    s.save_object_fact_binding(ObjectFactBinding {
      object_id,
      fact_id: fact.id,
      direction,
    })
    .await
    .unwrap();
  }

  let mut bound = s.fetch_object_fact_bindings(object_id).await.unwrap();
  bound.sort_by_key(|b| b.fact_id == second.id);
  assert_eq!(bound.len(), 2);
  assert_eq!(bound[0].fact_id, first.id);
  assert_eq!(bound[0].direction, Direction::FactIsSource);
  assert_eq!(bound[1].fact_id, second.id);
  assert_eq!(bound[1].direction, Direction::None);

  assert!(s.fetch_object_fact_bindings(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn rebinding_same_object_replaces_direction() {
  let s = store().await;
  let object_id = Uuid::new_v4();
  let fact = s.save_fact(new_fact(AccessMode::Public, vec![])).await.unwrap();

  for direction in [Direction::FactIsSource, Direction::BiDirectional] {
    s.save_object_fact_binding(ObjectFactBinding { object_id, fact_id: fact.id, direction })
      .await
      .unwrap();
  }

  let bound = s.fetch_object_fact_bindings(object_id).await.unwrap();
  assert_eq!(bound.len(), 1);
  assert_eq!(bound[0].direction, Direction::BiDirectional);
}

// ─── Types and provenance ────────────────────────────────────────────────────

#[tokio::test]
async fn fact_type_save_is_idempotent() {
  let s = store().await;
  assert!(s.get_fact_type(RETRACTION_FACT_TYPE_ID).await.unwrap().is_none());

  let saved = s.save_fact_type(FactType::retraction()).await.unwrap();
  let again = s.save_fact_type(FactType::retraction()).await.unwrap();
  assert_eq!(saved, again);
  assert_eq!(
    s.get_fact_type(RETRACTION_FACT_TYPE_ID).await.unwrap(),
    Some(FactType::retraction())
  );
}

#[tokio::test]
async fn fact_type_name_taken_by_other_id_is_rejected() {
  let s = store().await;
  s.save_fact_type(FactType { id: Uuid::new_v4(), name: "Retraction".into() })
    .await
    .unwrap();

  let err = s.save_fact_type(FactType::retraction()).await.unwrap_err();

  assert!(matches!(err, crate::Error::NameTaken { table: "fact_types", .. }));
  assert!(s.get_fact_type(RETRACTION_FACT_TYPE_ID).await.unwrap().is_none());
}

#[tokio::test]
async fn organizations_and_sources_by_id_and_name() {
  let s = store().await;
  let org = Organization { id: Uuid::new_v4(), name: "Acme CERT".into() };
  let source = Source { id: Uuid::new_v4(), name: "Sandbox".into() };
  s.save_organization(org.clone()).await.unwrap();
  s.save_source(source.clone()).await.unwrap();

  assert_eq!(s.find_organization(Reference::Id(org.id)).await.unwrap(), Some(org.clone()));
  assert_eq!(
    s.find_organization(Reference::Name("Acme CERT".into())).await.unwrap(),
    Some(org.clone())
  );
  assert_eq!(s.find_source(Reference::Name("Sandbox".into())).await.unwrap(), Some(source));
  assert!(s.find_source(Reference::Name("Acme CERT".into())).await.unwrap().is_none());

  // Re-seeding keeps the stored row.
  let renamed = Organization { id: org.id, name: "Renamed".into() };
  assert_eq!(s.save_organization(renamed).await.unwrap(), org);

  let impostor = Source { id: Uuid::new_v4(), name: "Sandbox".into() };
  assert!(s.save_source(impostor).await.is_err());
}

// ─── ACL and comments ────────────────────────────────────────────────────────

#[tokio::test]
async fn acl_and_comments_roundtrip() {
  let s = store().await;
  let fact = s.save_fact(new_fact(AccessMode::Explicit, vec![])).await.unwrap();
  let granter = Uuid::new_v4();

  let subjects = [Uuid::new_v4(), Uuid::new_v4()];
  for subject_id in subjects {
    s.save_fact_acl_entry(FactAclEntry {
      id: Uuid::new_v4(),
      fact_id: fact.id,
      subject_id,
      source_id: granter,
      timestamp: Utc::now(),
    })
    .await
    .unwrap();
  }

  let acl = s.fetch_fact_acl(fact.id).await.unwrap();
  assert_eq!(acl.iter().map(|e| e.subject_id).collect::<Vec<_>>(), subjects);
  assert!(acl.iter().all(|e| e.source_id == granter));

  let duplicate = FactAclEntry {
    id:         Uuid::new_v4(),
    fact_id:    fact.id,
    subject_id: subjects[0],
    source_id:  granter,
    timestamp:  Utc::now(),
  };
  assert!(s.save_fact_acl_entry(duplicate).await.is_err());

  let comment = FactComment {
    id:        Uuid::new_v4(),
    fact_id:   fact.id,
    source_id: granter,
    comment:   "false positive".into(),
    timestamp: Utc::now(),
  };
  s.save_fact_comment(comment.clone()).await.unwrap();
  assert_eq!(s.fetch_fact_comments(fact.id).await.unwrap(), vec![comment]);
}

// ─── Index ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn index_documents_are_replaced() {
  let s = store().await;
  let fact = new_fact(AccessMode::Public, vec![]);
  let fact_type = FactType { id: fact.type_id, name: "resolvesTo".into() };
  let mut document = FactDocument::new(&fact, &fact_type, &[]);

  assert!(s.get_fact_document(fact.id).await.unwrap().is_none());

  s.index_fact(document.clone()).await.unwrap();
  assert_eq!(s.get_fact_document(fact.id).await.unwrap(), Some(document.clone()));

  document.retracted = true;
  s.index_fact(document.clone()).await.unwrap();
  assert_eq!(s.get_fact_document(fact.id).await.unwrap(), Some(document));
}

// ─── Retraction end to end ───────────────────────────────────────────────────

#[tokio::test]
async fn retraction_through_sqlite() {
  let s = Arc::new(store().await);
  let (sink, mut events) = ChannelEventSink::new();
  let service = RetractFactService::new(s.clone(), s.clone(), Arc::new(sink));

  let object_id = Uuid::new_v4();
  let original = s
    .save_fact(new_fact(
      AccessMode::RoleBased,
      vec![FactBinding { object_id, direction: Direction::FactIsDestination }],
    ))
    .await
    .unwrap();
  let original_type = FactType { id: original.type_id, name: "resolvesTo".into() };
  s.index_fact(FactDocument::new(&original, &original_type, &[]))
    .await
    .unwrap();

  let user = Uuid::new_v4();
  let ctx = SessionSecurityContext::new(
    Some(Session {
      user_id:         user,
      organization_id: original.organization_id,
      grants:          vec![Grant {
        organization_id: original.organization_id,
        functions:       vec![Function::ViewFactObjects, Function::AddFactObjects],
      }],
    }),
    s.clone(),
  );

  let mut request = RetractFactRequest::new(original.id);
  request.access_mode = Some(AccessMode::Explicit);
  request.comment = Some("domain expired".into());
  let retraction = service.handle(&ctx, request).await.unwrap();

  let stored = s.get_fact(retraction.id).await.unwrap().unwrap();
  assert_eq!(stored.in_reference_to_id, Some(original.id));
  assert_eq!(stored.type_id, RETRACTION_FACT_TYPE_ID);
  assert_eq!(stored.bindings, vec![FactBinding { object_id, direction: Direction::None }]);

  let bound = s.fetch_object_fact_bindings(object_id).await.unwrap();
  assert_eq!(bound.len(), 1);
  assert_eq!(bound[0].fact_id, retraction.id);
  assert_eq!(bound[0].direction, Direction::None);

  let acl = s.fetch_fact_acl(retraction.id).await.unwrap();
  assert_eq!(acl.iter().map(|e| e.subject_id).collect::<Vec<_>>(), vec![user]);
  assert_eq!(s.fetch_fact_comments(retraction.id).await.unwrap().len(), 1);

  let original_doc = s.get_fact_document(original.id).await.unwrap().unwrap();
  assert!(original_doc.retracted);
  assert_eq!(original_doc.type_name, "resolvesTo");

  let retraction_doc = s.get_fact_document(retraction.id).await.unwrap().unwrap();
  assert!(!retraction_doc.retracted);
  assert_eq!(retraction_doc.acl, vec![user]);
  assert_eq!(retraction_doc.type_name, "Retraction");

  let event = events.recv().await.unwrap();
  assert_eq!(event.name, EventName::FactRetracted);
  assert_eq!(event.access_mode, AccessMode::Explicit);
}

#[tokio::test]
async fn retraction_of_self_bound_fact() {
  let s = Arc::new(store().await);
  let (sink, mut events) = ChannelEventSink::new();
  let service = RetractFactService::new(s.clone(), s.clone(), Arc::new(sink));

  let object_id = Uuid::new_v4();
  let original = s
    .save_fact(new_fact(
      AccessMode::Public,
      vec![
        FactBinding { object_id, direction: Direction::FactIsSource },
        FactBinding { object_id, direction: Direction::FactIsDestination },
      ],
    ))
    .await
    .unwrap();

  let ctx = SessionSecurityContext::new(
    Some(Session {
      user_id:         Uuid::new_v4(),
      organization_id: original.organization_id,
      grants:          vec![Grant {
        organization_id: original.organization_id,
        functions:       vec![Function::ViewFactObjects, Function::AddFactObjects],
      }],
    }),
    s.clone(),
  );

  let retraction = service
    .handle(&ctx, RetractFactRequest::new(original.id))
    .await
    .unwrap();

  let bound: Vec<_> = s
    .fetch_object_fact_bindings(object_id)
    .await
    .unwrap()
    .into_iter()
    .filter(|b| b.fact_id == retraction.id)
    .collect();
  assert_eq!(bound.len(), 1);
  assert_eq!(bound[0].direction, Direction::None);
  assert!(s.get_fact_document(retraction.id).await.unwrap().is_some());
  assert!(events.try_recv().is_ok());
}

#[tokio::test]
async fn retracting_unknown_fact_writes_nothing() {
  let s = Arc::new(store().await);
  let (sink, mut events) = ChannelEventSink::new();
  let service = RetractFactService::new(s.clone(), s.clone(), Arc::new(sink));
  let ctx = SessionSecurityContext::new(
    Some(Session {
      user_id:         Uuid::new_v4(),
      organization_id: Uuid::new_v4(),
      grants:          vec![],
    }),
    s.clone(),
  );

  let missing = Uuid::new_v4();
  let err = service
    .handle(&ctx, RetractFactRequest::new(missing))
    .await
    .unwrap_err();

  assert!(matches!(err, CoreError::FactNotFound(id) if id == missing));
  assert!(s.get_fact_type(RETRACTION_FACT_TYPE_ID).await.unwrap().is_none());
  assert!(events.try_recv().is_err());
}
