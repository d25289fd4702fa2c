//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use factgraph_core::{
  event::{ChannelEventSink, TriggerEvent},
  fact::{AccessMode, Direction, FactBinding, FactEntity, FactType},
  index::{FactDocument, FactIndex},
  security::{Function, Grant},
  store::FactStore,
};
use factgraph_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, UserAccount, UserDirectory, api_router};

const PASSWORD: &str = "hunter2";

struct Harness {
  app:    Router,
  store:  Arc<SqliteStore>,
  events: mpsc::UnboundedReceiver<TriggerEvent>,
  org:    Uuid,
}

async fn harness() -> Harness {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let (sink, events) = ChannelEventSink::new();
  let org = Uuid::new_v4();

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(PASSWORD.as_bytes(), &salt)
    .unwrap()
    .to_string();
  let account = |username: &str, functions: Vec<Function>| UserAccount {
    username: username.into(),
    password_hash: hash.clone(),
    user_id: Uuid::new_v4(),
    organization_id: org,
    grants: vec![Grant { organization_id: org, functions }],
  };
  let users = UserDirectory::new(vec![
    account("analyst", vec![Function::ViewFactObjects, Function::AddFactObjects]),
    account("reader", vec![Function::ViewFactObjects]),
  ]);

  let app = api_router(AppState::new(store.clone(), sink, users));
  Harness { app, store, events, org }
}

impl Harness {
  async fn seed_fact(&self, access_mode: AccessMode) -> FactEntity {
    let now = Utc::now();
    let fact = FactEntity {
      id: Uuid::new_v4(),
      type_id: Uuid::new_v4(),
      value: "203.0.113.9".into(),
      organization_id: self.org,
      source_id: Uuid::new_v4(),
      access_mode,
      bindings: vec![FactBinding {
        object_id: Uuid::new_v4(),
        direction: Direction::FactIsSource,
      }],
      in_reference_to_id: None,
      timestamp: now,
      last_seen_timestamp: now,
    };
    let fact_type = FactType { id: fact.type_id, name: "resolvesTo".into() };
    self.store.save_fact(fact.clone()).await.unwrap();
    self
      .store
      .index_fact(FactDocument::new(&fact, &fact_type, &[]))
      .await
      .unwrap();
    fact
  }

  async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = self.app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let body = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
  }
}

fn basic(user: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{PASSWORD}")))
}

fn retract(fact_id: Uuid, user: Option<&str>, body: &str) -> Request<Body> {
  let mut builder = Request::builder()
    .method("POST")
    .uri(format!("/facts/{fact_id}/retract"))
    .header(header::CONTENT_TYPE, "application/json");
  if let Some(user) = user {
    builder = builder.header(header::AUTHORIZATION, basic(user));
  }
  builder.body(Body::from(body.to_owned())).unwrap()
}

// ─── Retract ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn retract_returns_created_fact() {
  let mut h = harness().await;
  let original = h.seed_fact(AccessMode::Public).await;

  let body = json!({ "comment": "stale", "accessMode": "RoleBased" }).to_string();
  let (status, _, json) = h.send(retract(original.id, Some("analyst"), &body)).await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(json["inReferenceToId"], json!(original.id));
  assert_eq!(json["accessMode"], json!("RoleBased"));
  assert_eq!(json["bindings"][0]["direction"], json!("None"));
  assert_eq!(
    json["value"],
    json!(format!("Retracted Fact with id = {}.", original.id))
  );

  let document = h.store.get_fact_document(original.id).await.unwrap().unwrap();
  assert!(document.retracted);
  assert!(h.events.try_recv().is_ok());
}

#[tokio::test]
async fn anonymous_retract_is_unauthorized() {
  let h = harness().await;
  let original = h.seed_fact(AccessMode::Public).await;

  let (status, headers, _) = h.send(retract(original.id, None, "{}")).await;

  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(headers.contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn unknown_fact_is_not_found() {
  let h = harness().await;
  let (status, _, _) = h.send(retract(Uuid::new_v4(), Some("analyst"), "{}")).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wider_access_mode_is_precondition_failed() {
  let h = harness().await;
  let original = h.seed_fact(AccessMode::RoleBased).await;

  let body = json!({ "accessMode": "Public" }).to_string();
  let (status, _, json) = h.send(retract(original.id, Some("analyst"), &body)).await;

  assert_eq!(status, StatusCode::PRECONDITION_FAILED);
  assert_eq!(json["messages"][0]["messageTemplate"], json!("access.mode.too.wide"));
  assert_eq!(json["messages"][0]["property"], json!("accessMode"));
}

#[tokio::test]
async fn reader_cannot_retract() {
  let mut h = harness().await;
  let original = h.seed_fact(AccessMode::Public).await;

  let (status, _, _) = h.send(retract(original.id, Some("reader"), "{}")).await;

  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
  let h = harness().await;
  let original = h.seed_fact(AccessMode::Public).await;

  let (status, _, _) = h
    .send(retract(original.id, Some("analyst"), "{\"accessMode\": \"Nobody\"}"))
    .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_fact_by_id() {
  let h = harness().await;
  let fact = h.seed_fact(AccessMode::RoleBased).await;

  let request = Request::builder()
    .uri(format!("/facts/{}", fact.id))
    .header(header::AUTHORIZATION, basic("reader"))
    .body(Body::empty())
    .unwrap();
  let (status, _, json) = h.send(request).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(json["id"], json!(fact.id));
  assert_eq!(json["organization"], json!(h.org));
}

#[tokio::test]
async fn explicit_fact_is_forbidden_to_non_members() {
  let h = harness().await;
  let fact = h.seed_fact(AccessMode::Explicit).await;

  let request = Request::builder()
    .uri(format!("/facts/{}", fact.id))
    .header(header::AUTHORIZATION, basic("reader"))
    .body(Body::empty())
    .unwrap();
  let (status, _, _) = h.send(request).await;

  assert_eq!(status, StatusCode::FORBIDDEN);
}
