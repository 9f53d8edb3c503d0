//! SQL schema for the folio SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- JSON documents, keyed by (collection, id). The revision column increments
-- on every write and backs the optional conditional-merge guard.
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    doc_id      TEXT NOT NULL,
    body        TEXT NOT NULL,      -- JSON object
    revision    INTEGER NOT NULL,
    updated_at  TEXT NOT NULL,      -- ISO 8601 UTC; server-assigned
    PRIMARY KEY (collection, doc_id)
);

-- Uploaded binary assets. Keys are caller-namespaced paths.
CREATE TABLE IF NOT EXISTS blobs (
    blob_key    TEXT PRIMARY KEY,
    content     BLOB NOT NULL,
    media_type  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents(collection);

PRAGMA user_version = 1;
";
