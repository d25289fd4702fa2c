//! Fact types: the fundamental unit of the fact graph.
//!
//! A fact is an immutable assertion about one or more objects. Facts are
//! never updated or deleted; a fact is withdrawn by recording a new
//! *retraction* fact that points back at it through `in_reference_to_id`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Access mode ─────────────────────────────────────────────────────────────

/// Visibility classification of a fact.
///
/// Variants are declared from least to most restrictive, so the derived
/// ordering gives `Public < RoleBased < Explicit`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AccessMode {
  /// Visible to anyone allowed to view facts at all.
  Public,
  /// Visible to members of the owning organization and to the ACL.
  RoleBased,
  /// Visible only to subjects in the ACL.
  Explicit,
}

impl AccessMode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Public => "Public",
      Self::RoleBased => "RoleBased",
      Self::Explicit => "Explicit",
    }
  }
}

impl fmt::Display for AccessMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Bindings ────────────────────────────────────────────────────────────────

/// How a fact relates to an object it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
  /// Co-reference only; no directionality asserted.
  None,
  FactIsSource,
  FactIsDestination,
  BiDirectional,
}

impl Direction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::None => "None",
      Self::FactIsSource => "FactIsSource",
      Self::FactIsDestination => "FactIsDestination",
      Self::BiDirectional => "BiDirectional",
    }
  }
}

/// A binding stored on the fact itself, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactBinding {
  pub object_id: Uuid,
  pub direction: Direction,
}

/// A row in the object-to-fact lookup table. Written once per (object, fact)
/// pair so that all facts bound to an object can be found without scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFactBinding {
  pub object_id: Uuid,
  pub fact_id:   Uuid,
  pub direction: Direction,
}

// ─── Fact types ──────────────────────────────────────────────────────────────

/// Well-known id of the reserved retraction fact type.
pub const RETRACTION_FACT_TYPE_ID: Uuid =
  Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_0001);

/// Name of the reserved retraction fact type.
pub const RETRACTION_FACT_TYPE_NAME: &str = "Retraction";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactType {
  pub id:   Uuid,
  pub name: String,
}

impl FactType {
  /// The reserved type used for all retraction facts.
  pub fn retraction() -> Self {
    Self {
      id:   RETRACTION_FACT_TYPE_ID,
      name: RETRACTION_FACT_TYPE_NAME.to_owned(),
    }
  }
}

// ─── FactEntity ──────────────────────────────────────────────────────────────

/// The authoritative storage record for a fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactEntity {
  /// Client-generated; never assigned by the store.
  pub id:                  Uuid,
  pub type_id:             Uuid,
  pub value:               String,
  pub organization_id:     Uuid,
  pub source_id:           Uuid,
  pub access_mode:         AccessMode,
  pub bindings:            Vec<FactBinding>,
  /// The fact this one refers to, e.g. the fact withdrawn by a retraction.
  pub in_reference_to_id:  Option<Uuid>,
  pub timestamp:           DateTime<Utc>,
  pub last_seen_timestamp: DateTime<Utc>,
}

// ─── ACL and comments ────────────────────────────────────────────────────────

/// Grants one subject access to one fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactAclEntry {
  pub id:         Uuid,
  pub fact_id:    Uuid,
  pub subject_id: Uuid,
  /// The user who granted access.
  pub source_id:  Uuid,
  pub timestamp:  DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactComment {
  pub id:        Uuid,
  pub fact_id:   Uuid,
  pub source_id: Uuid,
  pub comment:   String,
  pub timestamp: DateTime<Utc>,
}

// ─── Fact (API projection) ───────────────────────────────────────────────────

/// The API-facing view of a [`FactEntity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
  pub id:                  Uuid,
  pub type_id:             Uuid,
  pub value:               String,
  pub organization:        Option<Uuid>,
  pub source:              Option<Uuid>,
  pub access_mode:         AccessMode,
  pub in_reference_to_id:  Option<Uuid>,
  pub bindings:            Vec<FactBinding>,
  pub timestamp:           DateTime<Utc>,
  pub last_seen_timestamp: DateTime<Utc>,
}

impl From<&FactEntity> for Fact {
  fn from(e: &FactEntity) -> Self {
    Self {
      id:                  e.id,
      type_id:             e.type_id,
      value:               e.value.clone(),
      organization:        Some(e.organization_id),
      source:              Some(e.source_id),
      access_mode:         e.access_mode,
      in_reference_to_id:  e.in_reference_to_id,
      bindings:            e.bindings.clone(),
      timestamp:           e.timestamp,
      last_seen_timestamp: e.last_seen_timestamp,
    }
  }
}
