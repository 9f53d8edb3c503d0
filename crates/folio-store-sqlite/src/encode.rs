//! Encoding and decoding helpers between document bodies and the plain-text
//! representations stored in SQLite columns.
//!
//! Bodies are stored as compact JSON text. All timestamps are stored as
//! RFC 3339 strings.

use chrono::{DateTime, Utc};
use folio_core::store::{Document, StoredDocument};
use serde_json::Value;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn encode_body(body: &Document) -> Result<String> {
  Ok(serde_json::to_string(body)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub doc_id:   String,
  pub body:     String,
  pub revision: i64,
}

impl RawDocument {
  pub fn into_stored(self) -> Result<StoredDocument> {
    let parsed: Value = serde_json::from_str(&self.body)?;
    match parsed {
      Value::Object(map) => Ok(StoredDocument {
        doc_id:   self.doc_id,
        body:     map,
        revision: self.revision as u64,
      }),
      _ => Err(Error::MalformedBody(self.doc_id)),
    }
  }
}
