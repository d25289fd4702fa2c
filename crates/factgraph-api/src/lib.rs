//! JSON REST API for factgraph.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`FactStore`] and [`FactIndex`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", factgraph_api::api_router(state))
//! ```

pub mod auth;
pub mod error;
pub mod facts;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use factgraph_core::{
  event::ChannelEventSink, index::FactIndex, retract::RetractFactService, store::FactStore,
};

pub use auth::{UserAccount, UserDirectory};
pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S>
where
  S: FactStore + FactIndex,
{
  pub store:   Arc<S>,
  pub retract: Arc<RetractFactService<S, S, ChannelEventSink>>,
  pub users:   Arc<UserDirectory>,
}

impl<S> AppState<S>
where
  S: FactStore + FactIndex,
{
  pub fn new(store: Arc<S>, events: ChannelEventSink, users: UserDirectory) -> Self {
    Self {
      retract: Arc::new(RetractFactService::new(
        store.clone(),
        store.clone(),
        Arc::new(events),
      )),
      store,
      users: Arc::new(users),
    }
  }
}

impl<S> Clone for AppState<S>
where
  S: FactStore + FactIndex,
{
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      retract: self.retract.clone(),
      users:   self.users.clone(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: FactStore + FactIndex + 'static,
{
  Router::new()
    .route("/facts/{id}", get(facts::get_one::<S>))
    .route("/facts/{id}/retract", post(facts::retract_one::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
