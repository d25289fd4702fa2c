//! The derived search index.
//!
//! Index documents are a denormalised projection of a fact plus the state
//! the entity store does not keep on the fact row itself (ACL, retraction
//! flag). The index is never authoritative; it can be rebuilt from storage.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  fact::{AccessMode, FactEntity, FactType},
};

/// One fact as stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactDocument {
  pub id:                  Uuid,
  pub type_id:             Uuid,
  pub type_name:           String,
  pub value:               String,
  pub in_reference_to_id:  Option<Uuid>,
  pub organization_id:     Uuid,
  pub source_id:           Uuid,
  pub access_mode:         AccessMode,
  pub timestamp:           DateTime<Utc>,
  pub last_seen_timestamp: DateTime<Utc>,
  /// Set once a retraction fact referencing this fact has been recorded.
  pub retracted:           bool,
  /// Subjects explicitly granted access.
  pub acl:                 Vec<Uuid>,
  pub object_ids:          Vec<Uuid>,
}

impl FactDocument {
  /// Build the document for a freshly created fact.
  pub fn new(fact: &FactEntity, fact_type: &FactType, acl: &[Uuid]) -> Self {
    Self {
      id:                  fact.id,
      type_id:             fact_type.id,
      type_name:           fact_type.name.clone(),
      value:               fact.value.clone(),
      in_reference_to_id:  fact.in_reference_to_id,
      organization_id:     fact.organization_id,
      source_id:           fact.source_id,
      access_mode:         fact.access_mode,
      timestamp:           fact.timestamp,
      last_seen_timestamp: fact.last_seen_timestamp,
      retracted:           false,
      acl:                 acl.to_vec(),
      object_ids:          fact.bindings.iter().map(|b| b.object_id).collect(),
    }
  }
}

/// Abstraction over the search index backend.
pub trait FactIndex: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the indexed document for a fact, if any.
  fn get_fact_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FactDocument>, Self::Error>> + Send + '_;

  /// Insert or replace the document with `document.id`.
  fn index_fact(
    &self,
    document: FactDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Index a newly created fact together with the subjects granted access.
pub async fn index_created_fact<X: FactIndex>(
  index: &X,
  fact: &FactEntity,
  fact_type: &FactType,
  acl: &[Uuid],
) -> Result<()> {
  index
    .index_fact(FactDocument::new(fact, fact_type, acl))
    .await
    .map_err(Error::index)
}

/// Apply `update` to the indexed document of an existing fact.
///
/// A fact without an indexed document is left alone; filling such gaps is
/// the job of a full reindex, not of individual writes.
pub async fn reindex_existing_fact<X, F>(
  index: &X,
  fact_id: Uuid,
  update: F,
) -> Result<()>
where
  X: FactIndex,
  F: FnOnce(&mut FactDocument) + Send,
{
  let Some(mut document) =
    index.get_fact_document(fact_id).await.map_err(Error::index)?
  else {
    debug!(%fact_id, "fact is not indexed; skipping reindex");
    return Ok(());
  };

  update(&mut document);
  index.index_fact(document).await.map_err(Error::index)
}
