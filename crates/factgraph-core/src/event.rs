//! Trigger events: notifications describing a state change in the graph.
//!
//! Events are handed to a [`TriggerEventSink`] and are fire-and-forget from
//! the point of view of the service that raised them.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::{Result, fact::AccessMode};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventName {
  FactRetracted,
}

impl fmt::Display for EventName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::FactRetracted => f.write_str("FactRetracted"),
    }
  }
}

/// Well-known keys for [`TriggerEvent::context_parameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextParameter {
  RetractionFact,
  RetractedFact,
}

impl ContextParameter {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::RetractionFact => "RetractionFact",
      Self::RetractedFact => "RetractedFact",
    }
  }
}

/// A notification scoped by organization and access mode. Recipients that
/// may not see a fact with `access_mode` in `organization` must not see the
/// event either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
  pub name:               EventName,
  pub organization:       Option<Uuid>,
  pub access_mode:        AccessMode,
  pub context_parameters: BTreeMap<String, serde_json::Value>,
}

impl TriggerEvent {
  pub fn new(name: EventName, organization: Option<Uuid>, access_mode: AccessMode) -> Self {
    Self {
      name,
      organization,
      access_mode,
      context_parameters: BTreeMap::new(),
    }
  }

  /// Attach `value` under `key`, serialised to JSON.
  pub fn with_context_parameter<T: Serialize>(
    mut self,
    key: ContextParameter,
    value: &T,
  ) -> Result<Self> {
    self
      .context_parameters
      .insert(key.as_str().to_owned(), serde_json::to_value(value)?);
    Ok(self)
  }
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Receives trigger events. Registration never blocks and never fails from
/// the caller's point of view.
pub trait TriggerEventSink: Send + Sync {
  fn register_trigger_event(&self, event: TriggerEvent);
}

/// Forwards events into an unbounded tokio channel.
#[derive(Clone)]
pub struct ChannelEventSink {
  tx: mpsc::UnboundedSender<TriggerEvent>,
}

impl ChannelEventSink {
  /// Create a sink and the receiver end that drains it.
  pub fn new() -> (Self, mpsc::UnboundedReceiver<TriggerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl TriggerEventSink for ChannelEventSink {
  fn register_trigger_event(&self, event: TriggerEvent) {
    if let Err(e) = self.tx.send(event) {
      warn!(event = %e.0.name, "trigger event dropped: receiver closed");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn channel_sink_delivers_events() {
    let (sink, mut rx) = ChannelEventSink::new();
    let org = Uuid::new_v4();
    let event = TriggerEvent::new(EventName::FactRetracted, Some(org), AccessMode::RoleBased)
      .with_context_parameter(ContextParameter::RetractedFact, &"payload")
      .unwrap();

    sink.register_trigger_event(event.clone());

    let received = rx.recv().await.unwrap();
    assert_eq!(received, event);
    assert_eq!(
      received.context_parameters.get("RetractedFact"),
      Some(&serde_json::json!("payload"))
    );
  }

  #[test]
  fn channel_sink_ignores_closed_receiver() {
    let (sink, rx) = ChannelEventSink::new();
    drop(rx);
    sink.register_trigger_event(TriggerEvent::new(
      EventName::FactRetracted,
      None,
      AccessMode::Public,
    ));
  }
}
