//! Error types for `folio-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// `create` needs a non-empty user id to key the document.
  #[error("missing user id on portfolio create")]
  MissingUserId,

  /// A mutation targeted a portfolio document that does not exist. Reads
  /// report absence as `None`, never as this error.
  #[error("portfolio not found: {0}")]
  PortfolioNotFound(String),

  /// A revision-guarded write observed a newer document than the one it
  /// read. Only raised under [`WritePolicy::CheckRevision`].
  ///
  /// [`WritePolicy::CheckRevision`]: crate::store::WritePolicy::CheckRevision
  #[error("portfolio {0} was modified concurrently")]
  RevisionConflict(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The document or blob store collaborator failed. Never retried here;
  /// callers decide whether to retry or surface it.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a collaborator error as [`Error::Storage`].
  pub fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
