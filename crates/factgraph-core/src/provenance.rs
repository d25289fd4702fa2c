//! Organizations and sources: who a fact belongs to and where it came from.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub id:   Uuid,
  pub name: String,
}

/// A caller-supplied reference to a named entity: either its UUID or its
/// unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
  Id(Uuid),
  Name(String),
}

impl Reference {
  /// Interpret `s` as a UUID if it parses as one, otherwise as a name.
  pub fn parse(s: &str) -> Self {
    match Uuid::parse_str(s) {
      Ok(id) => Self::Id(id),
      Err(_) => Self::Name(s.to_owned()),
    }
  }
}
