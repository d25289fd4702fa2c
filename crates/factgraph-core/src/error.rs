//! Error types for `factgraph-core`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A single field-level validation failure carried by
/// [`Error::InvalidArgument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
  /// Human-readable description.
  pub message:          String,
  /// Stable machine-readable code, e.g. `access.mode.too.wide`.
  pub message_template: String,
  /// The request property the error refers to.
  pub property:         String,
  /// The offending value, rendered as a string.
  pub value:            String,
}

impl ValidationError {
  pub fn new(
    message: impl Into<String>,
    message_template: impl Into<String>,
    property: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self {
      message:          message.into(),
      message_template: message_template.into(),
      property:         property.into(),
      value:            value.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("fact not found: {0}")]
  FactNotFound(Uuid),

  #[error("authentication failed: {0}")]
  AuthenticationFailed(String),

  #[error("access denied: {0}")]
  AccessDenied(String),

  #[error("invalid argument: {}", summarize(.0))]
  InvalidArgument(Vec<ValidationError>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("index error: {0}")]
  Index(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Wrap a search index error.
  pub fn index<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Index(Box::new(e))
  }

  /// Shorthand for an [`Error::InvalidArgument`] with a single entry.
  pub fn invalid_argument(error: ValidationError) -> Self {
    Self::InvalidArgument(vec![error])
  }
}

fn summarize(errors: &[ValidationError]) -> String {
  errors
    .iter()
    .map(|e| format!("{} ({}={})", e.message_template, e.property, e.value))
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
