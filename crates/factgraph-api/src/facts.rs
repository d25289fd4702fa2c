//! Handlers for `/facts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/facts/{id}` | Requires read access to the fact |
//! | `POST` | `/facts/{id}/retract` | Body: [`RetractBody`]; returns 201 + the retraction fact |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use factgraph_core::{
  fact::{AccessMode, Fact},
  index::FactIndex,
  lookup,
  retract::RetractFactRequest,
  security::SessionSecurityContext,
  store::FactStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::MaybeSession, error::ApiError};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /facts/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Fact>, ApiError>
where
  S: FactStore + FactIndex + 'static,
{
  let ctx = SessionSecurityContext::new(session, state.store.clone());
  let fact = lookup::get_fact(&*state.store, &ctx, id).await?;
  Ok(Json(fact))
}

// ─── Retract ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /facts/{id}/retract`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractBody {
  /// Organization id or name.
  pub organization: Option<String>,
  /// Source id or name.
  pub source:       Option<String>,
  pub access_mode:  Option<AccessMode>,
  #[serde(default)]
  pub acl:          Vec<Uuid>,
  pub comment:      Option<String>,
}

impl RetractBody {
  fn into_request(self, fact: Uuid) -> RetractFactRequest {
    RetractFactRequest {
      fact,
      organization: self.organization,
      source: self.source,
      access_mode: self.access_mode,
      acl: self.acl,
      comment: self.comment,
    }
  }
}

/// `POST /facts/{id}/retract`: returns 201 + the new retraction [`Fact`].
pub async fn retract_one<S>(
  State(state): State<AppState<S>>,
  MaybeSession(session): MaybeSession,
  Path(fact_id): Path<Uuid>,
  body: Result<Json<RetractBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FactStore + FactIndex + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let ctx = SessionSecurityContext::new(session, state.store.clone());

  let retraction = state
    .retract
    .handle(&ctx, body.into_request(fact_id))
    .await?;
  Ok((StatusCode::CREATED, Json(retraction)))
}
