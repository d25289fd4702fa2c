//! [`SqliteStore`]: the SQLite implementation of [`FactStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use factgraph_core::{
  fact::{FactAclEntry, FactComment, FactEntity, FactType, ObjectFactBinding},
  provenance::{Organization, Reference, Source},
  store::FactStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAclEntry, RawBinding, RawComment, RawFact, decode_uuid, encode_access_mode,
    encode_bindings, encode_direction, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

const FACT_COLUMNS: &str = "fact_id, type_id, value, organization_id, source_id, access_mode,
   bindings, in_reference_to_id, recorded_at, last_seen_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fact store and search index backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, e.g. for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Look up an `(id, name)` row in `table` by either column.
  async fn find_named(
    &self,
    table: &'static str,
    id_column: &'static str,
    reference: Reference,
  ) -> Result<Option<(Uuid, String)>> {
    let (column, key) = match reference {
      Reference::Id(id) => (id_column, encode_uuid(id)),
      Reference::Name(name) => ("name", name),
    };

    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {id_column}, name FROM {table} WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![key], |r| Ok((r.get(0)?, r.get(1)?)))
            .optional()?,
        )
      })
      .await?;

    row
      .map(|(id, name)| Ok((decode_uuid(&id)?, name)))
      .transpose()
  }

  /// Insert an `(id, name)` row unless the id or the name is already taken.
  async fn insert_named(
    &self,
    table: &'static str,
    id_column: &'static str,
    id: Uuid,
    name: String,
  ) -> Result<()> {
    let id_str = encode_uuid(id);

    self
      .conn
      .call(move |conn| {
        let sql = format!("INSERT OR IGNORE INTO {table} ({id_column}, name) VALUES (?1, ?2)");
        conn.execute(&sql, rusqlite::params![id_str, name])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── FactStore impl ──────────────────────────────────────────────────────────

impl FactStore for SqliteStore {
  type Error = crate::Error;

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn get_fact(&self, id: Uuid) -> Result<Option<FactEntity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFact> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {FACT_COLUMNS} FROM facts WHERE fact_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawFact::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFact::into_fact).transpose()
  }

  async fn save_fact(&self, fact: FactEntity) -> Result<FactEntity> {
    let fact_id_str      = encode_uuid(fact.id);
    let type_id_str      = encode_uuid(fact.type_id);
    let value            = fact.value.clone();
    let organization_str = encode_uuid(fact.organization_id);
    let source_str       = encode_uuid(fact.source_id);
    let access_mode_str  = encode_access_mode(fact.access_mode);
    let bindings_str     = encode_bindings(&fact.bindings)?;
    let reference_str    = fact.in_reference_to_id.map(encode_uuid);
    let recorded_at_str  = encode_dt(fact.timestamp);
    let last_seen_str    = encode_dt(fact.last_seen_timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO facts (
             fact_id, type_id, value, organization_id, source_id, access_mode,
             bindings, in_reference_to_id, recorded_at, last_seen_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            fact_id_str,
            type_id_str,
            value,
            organization_str,
            source_str,
            access_mode_str,
            bindings_str,
            reference_str,
            recorded_at_str,
            last_seen_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(fact)
  }

  // ── Object bindings ───────────────────────────────────────────────────────

  async fn save_object_fact_binding(
    &self,
    binding: ObjectFactBinding,
  ) -> Result<ObjectFactBinding> {
    let object_id_str = encode_uuid(binding.object_id);
    let fact_id_str   = encode_uuid(binding.fact_id);
    let direction_str = encode_direction(binding.direction);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO object_fact_bindings (object_id, fact_id, direction)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (object_id, fact_id) DO UPDATE
             SET direction = excluded.direction",
          rusqlite::params![object_id_str, fact_id_str, direction_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(binding)
  }

  async fn fetch_object_fact_bindings(&self, object_id: Uuid) -> Result<Vec<ObjectFactBinding>> {
    let object_id_str = encode_uuid(object_id);

    let raws: Vec<RawBinding> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT object_id, fact_id, direction
           FROM object_fact_bindings WHERE object_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![object_id_str], |row| {
            Ok(RawBinding {
              object_id: row.get(0)?,
              fact_id:   row.get(1)?,
              direction: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBinding::into_binding).collect()
  }

  // ── Fact types ────────────────────────────────────────────────────────────

  async fn get_fact_type(&self, id: Uuid) -> Result<Option<FactType>> {
    let found = self
      .find_named("fact_types", "type_id", Reference::Id(id))
      .await?;
    Ok(found.map(|(id, name)| FactType { id, name }))
  }

  async fn save_fact_type(&self, fact_type: FactType) -> Result<FactType> {
    self
      .insert_named("fact_types", "type_id", fact_type.id, fact_type.name.clone())
      .await?;
    self
      .get_fact_type(fact_type.id)
      .await?
      .ok_or(Error::NameTaken { table: "fact_types", name: fact_type.name })
  }

  // ── Provenance ────────────────────────────────────────────────────────────

  async fn find_organization(&self, reference: Reference) -> Result<Option<Organization>> {
    let found = self
      .find_named("organizations", "organization_id", reference)
      .await?;
    Ok(found.map(|(id, name)| Organization { id, name }))
  }

  async fn save_organization(&self, organization: Organization) -> Result<Organization> {
    self
      .insert_named(
        "organizations",
        "organization_id",
        organization.id,
        organization.name.clone(),
      )
      .await?;
    self
      .find_organization(Reference::Id(organization.id))
      .await?
      .ok_or(Error::NameTaken { table: "organizations", name: organization.name })
  }

  async fn find_source(&self, reference: Reference) -> Result<Option<Source>> {
    let found = self.find_named("sources", "source_id", reference).await?;
    Ok(found.map(|(id, name)| Source { id, name }))
  }

  async fn save_source(&self, source: Source) -> Result<Source> {
    self
      .insert_named("sources", "source_id", source.id, source.name.clone())
      .await?;
    self
      .find_source(Reference::Id(source.id))
      .await?
      .ok_or(Error::NameTaken { table: "sources", name: source.name })
  }

  // ── ACL and comments ──────────────────────────────────────────────────────

  async fn fetch_fact_acl(&self, fact_id: Uuid) -> Result<Vec<FactAclEntry>> {
    let fact_id_str = encode_uuid(fact_id);

    let raws: Vec<RawAclEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, fact_id, subject_id, source_id, recorded_at
           FROM fact_acl WHERE fact_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fact_id_str], |row| {
            Ok(RawAclEntry {
              entry_id:    row.get(0)?,
              fact_id:     row.get(1)?,
              subject_id:  row.get(2)?,
              source_id:   row.get(3)?,
              recorded_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAclEntry::into_entry).collect()
  }

  async fn save_fact_acl_entry(&self, entry: FactAclEntry) -> Result<FactAclEntry> {
    let entry_id_str   = encode_uuid(entry.id);
    let fact_id_str    = encode_uuid(entry.fact_id);
    let subject_id_str = encode_uuid(entry.subject_id);
    let source_id_str  = encode_uuid(entry.source_id);
    let at_str         = encode_dt(entry.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fact_acl (entry_id, fact_id, subject_id, source_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![entry_id_str, fact_id_str, subject_id_str, source_id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn fetch_fact_comments(&self, fact_id: Uuid) -> Result<Vec<FactComment>> {
    let fact_id_str = encode_uuid(fact_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, fact_id, source_id, comment, recorded_at
           FROM fact_comments WHERE fact_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fact_id_str], |row| {
            Ok(RawComment {
              comment_id:  row.get(0)?,
              fact_id:     row.get(1)?,
              source_id:   row.get(2)?,
              comment:     row.get(3)?,
              recorded_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn save_fact_comment(&self, comment: FactComment) -> Result<FactComment> {
    let comment_id_str = encode_uuid(comment.id);
    let fact_id_str    = encode_uuid(comment.fact_id);
    let source_id_str  = encode_uuid(comment.source_id);
    let text           = comment.comment.clone();
    let at_str         = encode_dt(comment.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fact_comments (comment_id, fact_id, source_id, comment, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![comment_id_str, fact_id_str, source_id_str, text, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }
}
