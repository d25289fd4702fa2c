//! Shared building blocks for the fact services: fact type lookup,
//! organization / source resolution, ACL and comment persistence.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  error::ValidationError,
  fact::{AccessMode, FactAclEntry, FactComment, FactEntity, FactType, RETRACTION_FACT_TYPE_ID},
  provenance::Reference,
  security::SecurityContext,
  store::FactStore,
};

// ─── Fact types ──────────────────────────────────────────────────────────────

/// Looks up reserved fact types, registering them on first use.
pub struct FactTypeResolver<S: FactStore> {
  store: Arc<S>,
}

impl<S: FactStore> FactTypeResolver<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// The type every retraction fact is recorded with.
  pub async fn resolve_retraction_fact_type(&self) -> Result<FactType> {
    if let Some(existing) = self
      .store
      .get_fact_type(RETRACTION_FACT_TYPE_ID)
      .await
      .map_err(Error::store)?
    {
      return Ok(existing);
    }

    info!(type_id = %RETRACTION_FACT_TYPE_ID, "registering retraction fact type");
    self
      .store
      .save_fact_type(FactType::retraction())
      .await
      .map_err(Error::store)
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// Resolve the organization a new fact belongs to. Without an explicit
/// reference the caller's own organization is used.
pub async fn resolve_organization<S, C>(
  store: &S,
  ctx: &C,
  requested: Option<&str>,
) -> Result<Uuid>
where
  S: FactStore,
  C: SecurityContext,
{
  let Some(requested) = requested else {
    return ctx.current_user_organization_id();
  };

  store
    .find_organization(Reference::parse(requested))
    .await
    .map_err(Error::store)?
    .map(|o| o.id)
    .ok_or_else(|| {
      Error::invalid_argument(ValidationError::new(
        "Organization does not exist.",
        "organization.not.exist",
        "organization",
        requested,
      ))
    })
}

/// Resolve the source a new fact is attributed to. Without an explicit
/// reference the calling user is recorded as the source.
pub async fn resolve_source<S, C>(
  store: &S,
  ctx: &C,
  requested: Option<&str>,
) -> Result<Uuid>
where
  S: FactStore,
  C: SecurityContext,
{
  let Some(requested) = requested else {
    return ctx.current_user_id();
  };

  store
    .find_source(Reference::parse(requested))
    .await
    .map_err(Error::store)?
    .map(|s| s.id)
    .ok_or_else(|| {
      Error::invalid_argument(ValidationError::new(
        "Source does not exist.",
        "source.not.exist",
        "source",
        requested,
      ))
    })
}

// ─── ACL and comments ────────────────────────────────────────────────────────

/// Persists the ACL and comments attached to a newly created fact.
pub struct FactStorageHelper<S: FactStore> {
  store: Arc<S>,
}

impl<S: FactStore> FactStorageHelper<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Save the initial ACL of `fact` and return the subjects that were newly
  /// granted access.
  ///
  /// `Public` facts carry no ACL. `Explicit` facts always include the current
  /// user, who would otherwise lose access to the fact they just created.
  pub async fn save_initial_acl_for_new_fact<C: SecurityContext>(
    &self,
    ctx: &C,
    fact: &FactEntity,
    acl: &[Uuid],
  ) -> Result<Vec<Uuid>> {
    if fact.access_mode == AccessMode::Public {
      return Ok(Vec::new());
    }

    let mut subjects = acl.to_vec();
    if fact.access_mode == AccessMode::Explicit {
      subjects.push(ctx.current_user_id()?);
    }

    self.save_acl_entries(ctx, fact, &subjects).await
  }

  /// Grant each subject in `subjects` access to `fact`, skipping subjects
  /// already present. Returns the subjects actually added, in input order.
  pub async fn save_acl_entries<C: SecurityContext>(
    &self,
    ctx: &C,
    fact: &FactEntity,
    subjects: &[Uuid],
  ) -> Result<Vec<Uuid>> {
    let existing = self
      .store
      .fetch_fact_acl(fact.id)
      .await
      .map_err(Error::store)?;

    let mut added: Vec<Uuid> = Vec::new();
    for &subject_id in subjects {
      if existing.iter().any(|e| e.subject_id == subject_id) || added.contains(&subject_id) {
        continue;
      }
      added.push(subject_id);
    }

    let granted_by = ctx.current_user_id()?;
    for &subject_id in &added {
      self
        .store
        .save_fact_acl_entry(FactAclEntry {
          id: Uuid::new_v4(),
          fact_id: fact.id,
          subject_id,
          source_id: granted_by,
          timestamp: Utc::now(),
        })
        .await
        .map_err(Error::store)?;
    }

    Ok(added)
  }

  /// Attach `comment` to `fact`. Absent or blank comments are ignored.
  pub async fn save_comment_for_fact<C: SecurityContext>(
    &self,
    ctx: &C,
    fact: &FactEntity,
    comment: Option<&str>,
  ) -> Result<()> {
    let Some(comment) = comment.filter(|c| !c.trim().is_empty()) else {
      return Ok(());
    };

    self
      .store
      .save_fact_comment(FactComment {
        id:        Uuid::new_v4(),
        fact_id:   fact.id,
        source_id: ctx.current_user_id()?,
        comment:   comment.to_owned(),
        timestamp: Utc::now(),
      })
      .await
      .map_err(Error::store)?;
    Ok(())
  }
}
