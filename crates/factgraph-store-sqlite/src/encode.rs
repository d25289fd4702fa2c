//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings, enums by variant name and fact bindings as compact JSON.

use chrono::{DateTime, Utc};
use factgraph_core::fact::{
  AccessMode, Direction, FactAclEntry, FactBinding, FactComment, FactEntity, ObjectFactBinding,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── AccessMode ───────────────────────────────────────────────────────────────

pub fn encode_access_mode(m: AccessMode) -> &'static str { m.as_str() }

pub fn decode_access_mode(s: &str) -> Result<AccessMode> {
  match s {
    "Public" => Ok(AccessMode::Public),
    "RoleBased" => Ok(AccessMode::RoleBased),
    "Explicit" => Ok(AccessMode::Explicit),
    other => Err(Error::UnknownVariant {
      column: "access_mode",
      value:  other.to_owned(),
    }),
  }
}

// ─── Direction ────────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> &'static str { d.as_str() }

pub fn decode_direction(s: &str) -> Result<Direction> {
  match s {
    "None" => Ok(Direction::None),
    "FactIsSource" => Ok(Direction::FactIsSource),
    "FactIsDestination" => Ok(Direction::FactIsDestination),
    "BiDirectional" => Ok(Direction::BiDirectional),
    other => Err(Error::UnknownVariant {
      column: "direction",
      value:  other.to_owned(),
    }),
  }
}

// ─── Bindings ─────────────────────────────────────────────────────────────────

pub fn encode_bindings(bindings: &[FactBinding]) -> Result<String> {
  Ok(serde_json::to_string(bindings)?)
}

pub fn decode_bindings(s: &str) -> Result<Vec<FactBinding>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `facts` row.
pub struct RawFact {
  pub fact_id:            String,
  pub type_id:            String,
  pub value:              String,
  pub organization_id:    String,
  pub source_id:          String,
  pub access_mode:        String,
  pub bindings:           String,
  pub in_reference_to_id: Option<String>,
  pub recorded_at:        String,
  pub last_seen_at:       String,
}

impl RawFact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fact_id:            row.get(0)?,
      type_id:            row.get(1)?,
      value:              row.get(2)?,
      organization_id:    row.get(3)?,
      source_id:          row.get(4)?,
      access_mode:        row.get(5)?,
      bindings:           row.get(6)?,
      in_reference_to_id: row.get(7)?,
      recorded_at:        row.get(8)?,
      last_seen_at:       row.get(9)?,
    })
  }

  pub fn into_fact(self) -> Result<FactEntity> {
    Ok(FactEntity {
      id:                  decode_uuid(&self.fact_id)?,
      type_id:             decode_uuid(&self.type_id)?,
      value:               self.value,
      organization_id:     decode_uuid(&self.organization_id)?,
      source_id:           decode_uuid(&self.source_id)?,
      access_mode:         decode_access_mode(&self.access_mode)?,
      bindings:            decode_bindings(&self.bindings)?,
      in_reference_to_id:  self
        .in_reference_to_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      timestamp:           decode_dt(&self.recorded_at)?,
      last_seen_timestamp: decode_dt(&self.last_seen_at)?,
    })
  }
}

/// Raw strings read from an `object_fact_bindings` row.
pub struct RawBinding {
  pub object_id: String,
  pub fact_id:   String,
  pub direction: String,
}

impl RawBinding {
  pub fn into_binding(self) -> Result<ObjectFactBinding> {
    Ok(ObjectFactBinding {
      object_id: decode_uuid(&self.object_id)?,
      fact_id:   decode_uuid(&self.fact_id)?,
      direction: decode_direction(&self.direction)?,
    })
  }
}

/// Raw strings read from a `fact_acl` row.
pub struct RawAclEntry {
  pub entry_id:    String,
  pub fact_id:     String,
  pub subject_id:  String,
  pub source_id:   String,
  pub recorded_at: String,
}

impl RawAclEntry {
  pub fn into_entry(self) -> Result<FactAclEntry> {
    Ok(FactAclEntry {
      id:         decode_uuid(&self.entry_id)?,
      fact_id:    decode_uuid(&self.fact_id)?,
      subject_id: decode_uuid(&self.subject_id)?,
      source_id:  decode_uuid(&self.source_id)?,
      timestamp:  decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read from a `fact_comments` row.
pub struct RawComment {
  pub comment_id:  String,
  pub fact_id:     String,
  pub source_id:   String,
  pub comment:     String,
  pub recorded_at: String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<FactComment> {
    Ok(FactComment {
      id:        decode_uuid(&self.comment_id)?,
      fact_id:   decode_uuid(&self.fact_id)?,
      source_id: decode_uuid(&self.source_id)?,
      comment:   self.comment,
      timestamp: decode_dt(&self.recorded_at)?,
    })
  }
}
