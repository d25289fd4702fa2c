//! Retracting a fact.
//!
//! A fact is never deleted. Retraction records a new fact of the reserved
//! "Retraction" type that points back at the withdrawn fact, binds it to the
//! same objects, flags the original as retracted in the search index, and
//! raises a `FactRetracted` trigger event.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  error::ValidationError,
  event::{ContextParameter, EventName, TriggerEvent, TriggerEventSink},
  fact::{AccessMode, Direction, Fact, FactBinding, FactEntity, FactType, ObjectFactBinding},
  helpers::{FactStorageHelper, FactTypeResolver, resolve_organization, resolve_source},
  index::{FactIndex, index_created_fact, reindex_existing_fact},
  lookup::fetch_existing_fact,
  security::{Function, SecurityContext},
  store::FactStore,
};

// ─── Request ─────────────────────────────────────────────────────────────────

/// Input to [`RetractFactService::handle`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractFactRequest {
  /// The fact to retract.
  pub fact:         Uuid,
  /// Organization id or name; defaults to the caller's organization.
  pub organization: Option<String>,
  /// Source id or name; defaults to the calling user.
  pub source:       Option<String>,
  /// Defaults to the access mode of the retracted fact.
  pub access_mode:  Option<AccessMode>,
  #[serde(default)]
  pub acl:          Vec<Uuid>,
  pub comment:      Option<String>,
}

impl RetractFactRequest {
  pub fn new(fact: Uuid) -> Self {
    Self { fact, ..Self::default() }
  }
}

// ─── Policy and construction ─────────────────────────────────────────────────

/// Pick the retraction's access mode: the requested one, or the retracted
/// fact's own. A retraction may never be less restrictive than the fact it
/// retracts.
pub fn resolve_access_mode(
  requested: Option<AccessMode>,
  retracted: &FactEntity,
) -> Result<AccessMode> {
  let mode = requested.unwrap_or(retracted.access_mode);

  if mode < retracted.access_mode {
    return Err(Error::invalid_argument(ValidationError::new(
      "Requested AccessMode cannot be less restrictive than AccessMode of the Fact to retract.",
      "access.mode.too.wide",
      "accessMode",
      mode.as_str(),
    )));
  }

  Ok(mode)
}

/// Build (but do not persist) the retraction fact for `retracted`.
pub fn build_retraction_fact(
  retracted: &FactEntity,
  fact_type: &FactType,
  organization_id: Uuid,
  source_id: Uuid,
  access_mode: AccessMode,
) -> FactEntity {
  let now = Utc::now();

  // One undirected binding per object, even when the retracted fact is bound
  // to the same object in both directions.
  let mut bindings: Vec<FactBinding> = Vec::with_capacity(retracted.bindings.len());
  for binding in &retracted.bindings {
    if bindings.iter().all(|b| b.object_id != binding.object_id) {
      bindings.push(FactBinding {
        object_id: binding.object_id,
        direction: Direction::None,
      });
    }
  }

  FactEntity {
    id: Uuid::new_v4(),
    type_id: fact_type.id,
    value: format!("Retracted Fact with id = {}.", retracted.id),
    organization_id,
    source_id,
    access_mode,
    bindings,
    in_reference_to_id: Some(retracted.id),
    timestamp: now,
    last_seen_timestamp: now,
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Runs the retraction workflow against its storage, index and event
/// collaborators.
pub struct RetractFactService<S, X, E>
where
  S: FactStore,
  X: FactIndex,
  E: TriggerEventSink,
{
  store:      Arc<S>,
  index:      Arc<X>,
  events:     Arc<E>,
  fact_types: FactTypeResolver<S>,
  storage:    FactStorageHelper<S>,
}

impl<S, X, E> RetractFactService<S, X, E>
where
  S: FactStore,
  X: FactIndex,
  E: TriggerEventSink,
{
  pub fn new(store: Arc<S>, index: Arc<X>, events: Arc<E>) -> Self {
    Self {
      fact_types: FactTypeResolver::new(store.clone()),
      storage: FactStorageHelper::new(store.clone()),
      store,
      index,
      events,
    }
  }

  /// Retract `request.fact` on behalf of the caller in `ctx` and return the
  /// new retraction fact.
  ///
  /// Every check runs before the first write. Once persistence has started
  /// there is no rollback: a failure while writing bindings, ACL, comment or
  /// index documents leaves the retraction fact stored but incompletely
  /// indexed.
  pub async fn handle<C: SecurityContext>(
    &self,
    ctx: &C,
    request: RetractFactRequest,
  ) -> Result<Fact> {
    ctx.current_user_id()?;

    let retracted = fetch_existing_fact(&*self.store, request.fact).await?;
    ctx.check_read_permission(&retracted).await?;

    let organization_id =
      resolve_organization(&*self.store, ctx, request.organization.as_deref()).await?;
    ctx.check_permission(Function::AddFactObjects, organization_id)?;

    let source_id = resolve_source(&*self.store, ctx, request.source.as_deref()).await?;
    let access_mode = resolve_access_mode(request.access_mode, &retracted)?;
    let fact_type = self.fact_types.resolve_retraction_fact_type().await?;

    let retraction = build_retraction_fact(
      &retracted,
      &fact_type,
      organization_id,
      source_id,
      access_mode,
    );
    let retraction = self.persist(ctx, &request, &retracted, &fact_type, retraction).await?;

    let retraction_fact = Fact::from(&retraction);
    let retracted_fact = Fact::from(&retracted);
    self.register_trigger_event(&retraction_fact, &retracted_fact)?;

    info!(
      retraction_id = %retraction.id,
      retracted_id = %retracted.id,
      access_mode = %retraction.access_mode,
      "fact retracted"
    );
    Ok(retraction_fact)
  }

  async fn persist<C: SecurityContext>(
    &self,
    ctx: &C,
    request: &RetractFactRequest,
    retracted: &FactEntity,
    fact_type: &FactType,
    retraction: FactEntity,
  ) -> Result<FactEntity> {
    let retraction = self.store.save_fact(retraction).await.map_err(Error::store)?;

    for binding in &retraction.bindings {
      self
        .store
        .save_object_fact_binding(ObjectFactBinding {
          object_id: binding.object_id,
          fact_id:   retraction.id,
          direction: binding.direction,
        })
        .await
        .map_err(Error::store)?;
    }
    debug!(
      retraction_id = %retraction.id,
      bindings = retraction.bindings.len(),
      "retraction fact stored"
    );

    let granted = self
      .storage
      .save_initial_acl_for_new_fact(ctx, &retraction, &request.acl)
      .await?;
    self
      .storage
      .save_comment_for_fact(ctx, &retraction, request.comment.as_deref())
      .await?;

    index_created_fact(&*self.index, &retraction, fact_type, &granted).await?;
    reindex_existing_fact(&*self.index, retracted.id, |d| d.retracted = true).await?;

    Ok(retraction)
  }

  // Both facts can be attached unfiltered: the event carries the retraction's
  // access mode, which is never less restrictive than the retracted fact's.
  fn register_trigger_event(&self, retraction: &Fact, retracted: &Fact) -> Result<()> {
    let event = TriggerEvent::new(
      EventName::FactRetracted,
      retraction.organization,
      retraction.access_mode,
    )
    .with_context_parameter(ContextParameter::RetractionFact, retraction)?
    .with_context_parameter(ContextParameter::RetractedFact, retracted)?;

    self.events.register_trigger_event(event);
    Ok(())
  }
}
