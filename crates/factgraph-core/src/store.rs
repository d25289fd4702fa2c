//! The `FactStore` trait: the authoritative entity store.
//!
//! The trait is implemented by storage backends (e.g.
//! `factgraph-store-sqlite`). The retraction workflow and the HTTP layer
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  fact::{FactAclEntry, FactComment, FactEntity, FactType, ObjectFactBinding},
  provenance::{Organization, Reference, Source},
};

/// Abstraction over a fact graph storage backend.
///
/// Facts are append-only: there is no update or delete. All methods return
/// `Send` futures so the trait can be used from multi-threaded runtimes.
pub trait FactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Retrieve a fact by id. Returns `None` if not found.
  fn get_fact(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FactEntity>, Self::Error>> + Send + '_;

  /// Persist a new fact and return the stored entity. The id is supplied by
  /// the caller.
  fn save_fact(
    &self,
    fact: FactEntity,
  ) -> impl Future<Output = Result<FactEntity, Self::Error>> + Send + '_;

  // ── Object bindings ───────────────────────────────────────────────────

  fn save_object_fact_binding(
    &self,
    binding: ObjectFactBinding,
  ) -> impl Future<Output = Result<ObjectFactBinding, Self::Error>> + Send + '_;

  /// All bindings recorded for an object.
  fn fetch_object_fact_bindings(
    &self,
    object_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ObjectFactBinding>, Self::Error>> + Send + '_;

  // ── Fact types ────────────────────────────────────────────────────────

  fn get_fact_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<FactType>, Self::Error>> + Send + '_;

  fn save_fact_type(
    &self,
    fact_type: FactType,
  ) -> impl Future<Output = Result<FactType, Self::Error>> + Send + '_;

  // ── Provenance ────────────────────────────────────────────────────────

  fn find_organization(
    &self,
    reference: Reference,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// Insert an organization; a no-op if one with the same id already exists.
  fn save_organization(
    &self,
    organization: Organization,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn find_source(
    &self,
    reference: Reference,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + '_;

  /// Insert a source; a no-op if one with the same id already exists.
  fn save_source(
    &self,
    source: Source,
  ) -> impl Future<Output = Result<Source, Self::Error>> + Send + '_;

  // ── ACL and comments ──────────────────────────────────────────────────

  fn fetch_fact_acl(
    &self,
    fact_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FactAclEntry>, Self::Error>> + Send + '_;

  fn save_fact_acl_entry(
    &self,
    entry: FactAclEntry,
  ) -> impl Future<Output = Result<FactAclEntry, Self::Error>> + Send + '_;

  fn fetch_fact_comments(
    &self,
    fact_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FactComment>, Self::Error>> + Send + '_;

  fn save_fact_comment(
    &self,
    comment: FactComment,
  ) -> impl Future<Output = Result<FactComment, Self::Error>> + Send + '_;
}
