//! [`SqliteStore`] — the SQLite implementation of the document and blob
//! store collaborator traits.

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use folio_core::store::{
  Blob, BlobStore, Document, DocumentStore, MergeOutcome, StoredDocument,
};

use crate::{
  encode::{encode_body, encode_dt, RawDocument},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A folio document + blob store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and clones
/// share one serialised access path, so a read-merge-write inside a single
/// `call` is atomic with respect to every clone.
#[derive(Clone)]
pub struct SqliteStore {
  conn:          tokio_rusqlite::Connection,
  blob_base_url: String,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self {
      conn,
      blob_base_url: "/assets".to_owned(),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self {
      conn,
      blob_base_url: "/assets".to_owned(),
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Override the prefix under which blob URLs are issued (default
  /// `/assets`).
  pub fn with_blob_base_url(mut self, base: impl Into<String>) -> Self {
    self.blob_base_url = base.into().trim_end_matches('/').to_owned();
    self
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

  /// Write a pre-encoded body, optionally guarded on the revision observed
  /// at read time. Returns the new revision, or `None` if nothing matched
  /// (missing document, or a guarded write that lost the race).
  async fn write_body(
    &self,
    collection: String,
    doc_id: String,
    body: String,
    guard: Option<i64>,
  ) -> Result<Option<i64>> {
    let at_str = encode_dt(Utc::now());

    let revision = self
      .conn
      .call(move |conn| {
        let changed = match guard {
          Some(rev) => conn.execute(
            "UPDATE documents
               SET body = ?1, revision = revision + 1, updated_at = ?2
             WHERE collection = ?3 AND doc_id = ?4 AND revision = ?5",
            rusqlite::params![body, at_str, collection, doc_id, rev],
          )?,
          None => conn.execute(
            "UPDATE documents
               SET body = ?1, revision = revision + 1, updated_at = ?2
             WHERE collection = ?3 AND doc_id = ?4",
            rusqlite::params![body, at_str, collection, doc_id],
          )?,
        };

        if changed == 0 {
          return Ok(None);
        }

        let revision: i64 = conn.query_row(
          "SELECT revision FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, doc_id],
          |row| row.get(0),
        )?;
        Ok(Some(revision))
      })
      .await?;

    Ok(revision)
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  async fn get(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> Result<Option<StoredDocument>> {
    let collection = collection.to_owned();
    let doc_id = doc_id.to_owned();

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT doc_id, body, revision FROM documents
               WHERE collection = ?1 AND doc_id = ?2",
              rusqlite::params![collection, doc_id],
              |row| {
                Ok(RawDocument {
                  doc_id:   row.get(0)?,
                  body:     row.get(1)?,
                  revision: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_stored).transpose()
  }

  async fn put(
    &self,
    collection: &str,
    doc_id: &str,
    body: Document,
  ) -> Result<u64> {
    let collection = collection.to_owned();
    let doc_id = doc_id.to_owned();
    let body_str = encode_body(&body)?;
    let at_str = encode_dt(Utc::now());

    let revision: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (collection, doc_id, body, revision, updated_at)
           VALUES (?1, ?2, ?3, 1, ?4)
           ON CONFLICT (collection, doc_id) DO UPDATE SET
             body       = excluded.body,
             revision   = documents.revision + 1,
             updated_at = excluded.updated_at",
          rusqlite::params![collection, doc_id, body_str, at_str],
        )?;

        let revision: i64 = conn.query_row(
          "SELECT revision FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, doc_id],
          |row| row.get(0),
        )?;
        Ok(revision)
      })
      .await?;

    Ok(revision as u64)
  }

  async fn merge(
    &self,
    collection: &str,
    doc_id: &str,
    patch: Document,
    expected_revision: Option<u64>,
  ) -> Result<MergeOutcome> {
    let stored = match self.get(collection, doc_id).await? {
      Some(stored) => stored,
      None => return Ok(MergeOutcome::Missing),
    };

    if let Some(expected) = expected_revision {
      if expected != stored.revision {
        return Ok(MergeOutcome::Conflict { revision: stored.revision });
      }
    }

    // Field-level merge: patch keys replace top-level fields, the rest of
    // the body is untouched.
    let mut body = stored.body;
    for (key, value) in patch {
      body.insert(key, value);
    }
    let body_str = encode_body(&body)?;

    // Guarded writes re-check the revision in the UPDATE itself, so a race
    // between our read and write surfaces as a conflict instead of a
    // silent overwrite.
    let guard = expected_revision.map(|_| stored.revision as i64);

    match self
      .write_body(collection.to_owned(), doc_id.to_owned(), body_str, guard)
      .await?
    {
      Some(revision) => Ok(MergeOutcome::Applied {
        revision: revision as u64,
      }),
      None => match self.get(collection, doc_id).await? {
        Some(current) => Ok(MergeOutcome::Conflict {
          revision: current.revision,
        }),
        None => Ok(MergeOutcome::Missing),
      },
    }
  }

  async fn delete(&self, collection: &str, doc_id: &str) -> Result<()> {
    let collection = collection.to_owned();
    let doc_id = doc_id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2",
          rusqlite::params![collection, doc_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
    let collection = collection.to_owned();

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT doc_id, body, revision FROM documents WHERE collection = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![collection], |row| {
            Ok(RawDocument {
              doc_id:   row.get(0)?,
              body:     row.get(1)?,
              revision: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_stored).collect()
  }
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for SqliteStore {
  type Error = Error;

  async fn upload(
    &self,
    key: &str,
    content: Vec<u8>,
    media_type: &str,
  ) -> Result<String> {
    let url = format!("{}/{}", self.blob_base_url, key);
    let key = key.to_owned();
    let media_type = media_type.to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO blobs (blob_key, content, media_type, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![key, content, media_type, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(url)
  }

  async fn fetch(&self, key: &str) -> Result<Option<Blob>> {
    let key = key.to_owned();

    let blob: Option<Blob> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT content, media_type FROM blobs WHERE blob_key = ?1",
              rusqlite::params![key],
              |row| {
                Ok(Blob {
                  content:    row.get(0)?,
                  media_type: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(blob)
  }
}
