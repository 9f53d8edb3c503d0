//! Error type for `folio-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A stored body failed to parse back into a JSON object.
  #[error("stored document {0} is not a JSON object")]
  MalformedBody(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
