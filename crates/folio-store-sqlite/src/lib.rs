//! SQLite backend for the folio portfolio store.
//!
//! Implements both collaborator traits — [`DocumentStore`] and [`BlobStore`]
//! — over a single SQLite file, standing in for the remote document and
//! object stores the system was designed against. Wraps [`tokio_rusqlite`]
//! so all database access runs on a dedicated thread without blocking the
//! async runtime.
//!
//! [`DocumentStore`]: folio_core::store::DocumentStore
//! [`BlobStore`]: folio_core::store::BlobStore

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
