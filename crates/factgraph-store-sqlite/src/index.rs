//! [`FactIndex`] over the `fact_documents` table.
//!
//! Documents are stored whole as JSON; the `retracted` flag is mirrored into
//! its own column so it can be filtered on without decoding.

use rusqlite::OptionalExtension as _;
use tracing::trace;
use uuid::Uuid;

use factgraph_core::index::{FactDocument, FactIndex};

use crate::{Result, SqliteStore, encode::encode_uuid};

impl FactIndex for SqliteStore {
  type Error = crate::Error;

  async fn get_fact_document(&self, id: Uuid) -> Result<Option<FactDocument>> {
    let id_str = encode_uuid(id);

    let json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document FROM fact_documents WHERE fact_id = ?1",
              rusqlite::params![id_str],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(json.as_deref().map(serde_json::from_str::<FactDocument>).transpose()?)
  }

  async fn index_fact(&self, document: FactDocument) -> Result<()> {
    let id_str    = encode_uuid(document.id);
    let retracted = document.retracted;
    let json      = serde_json::to_string(&document)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fact_documents (fact_id, retracted, document)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (fact_id) DO UPDATE
             SET retracted = excluded.retracted, document = excluded.document",
          rusqlite::params![id_str, retracted, json],
        )?;
        Ok(())
      })
      .await?;

    trace!(fact_id = %document.id, retracted, "fact document indexed");
    Ok(())
  }
}
