//! Fact lookup shared by the read and retract paths.

use uuid::Uuid;

use crate::{
  Error, Result,
  fact::{Fact, FactEntity},
  security::SecurityContext,
  store::FactStore,
};

/// Fetch a fact that must exist.
pub async fn fetch_existing_fact<S: FactStore>(store: &S, id: Uuid) -> Result<FactEntity> {
  store
    .get_fact(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::FactNotFound(id))
}

/// Fetch a single fact on behalf of the caller in `ctx`.
pub async fn get_fact<S, C>(store: &S, ctx: &C, id: Uuid) -> Result<Fact>
where
  S: FactStore,
  C: SecurityContext,
{
  ctx.current_user_id()?;
  let fact = fetch_existing_fact(store, id).await?;
  ctx.check_read_permission(&fact).await?;
  Ok(Fact::from(&fact))
}
