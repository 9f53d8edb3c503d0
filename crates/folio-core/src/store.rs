//! Collaborator traits and the [`PortfolioStore`] facade.
//!
//! The traits are the boundary to external persistence: a document store
//! holding JSON records and a blob store holding uploaded assets. Concrete
//! backends (e.g. `folio-store-sqlite`) implement them; the facade and the
//! crates above it depend only on the abstraction.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::{
  error::{Error, Result},
  normalize::{
    normalize_entries, normalize_skills, to_canonical_portfolio,
  },
  portfolio::{EntryId, EntryRecord, Experience, Portfolio, Project, SkillsInput},
};

/// The collection all portfolio documents live in.
pub const PORTFOLIO_COLLECTION: &str = "portfolios";

/// A JSON document body as held by the document store.
pub type Document = Map<String, Value>;

// ─── Document store ──────────────────────────────────────────────────────────

/// A document read back from the store, with the revision observed at read
/// time for the optimistic-concurrency write path.
#[derive(Debug, Clone)]
pub struct StoredDocument {
  pub doc_id:   String,
  pub body:     Document,
  /// Incremented by the store on every write to this document.
  pub revision: u64,
}

/// Result of a [`DocumentStore::merge`], reported as data rather than as an
/// error so the caller decides what each outcome means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
  /// The patch was applied; `revision` is the document's new revision.
  Applied { revision: u64 },
  /// No document exists at the key.
  Missing,
  /// The expected revision did not match; `revision` is what the document
  /// currently holds. Only produced for guarded merges.
  Conflict { revision: u64 },
}

/// Abstraction over the external keyed JSON document store.
///
/// `merge` is a field-level partial update: keys present in the patch replace
/// the corresponding top-level fields, everything else is left untouched.
/// `put` is whole-document create-or-replace.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one document. Absence is `None`, not an error.
  fn get(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> impl Future<Output = Result<Option<StoredDocument>, Self::Error>> + Send;

  /// Create or fully replace the document at the key. Returns the new
  /// revision.
  fn put(
    &self,
    collection: &str,
    doc_id: &str,
    body: Document,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

  /// Apply a field-level partial update. With `expected_revision` set, the
  /// write only lands if the document still carries that revision.
  fn merge(
    &self,
    collection: &str,
    doc_id: &str,
    patch: Document,
    expected_revision: Option<u64>,
  ) -> impl Future<Output = Result<MergeOutcome, Self::Error>> + Send;

  /// Remove the document. Unconditional: deleting a missing key succeeds.
  fn delete(
    &self,
    collection: &str,
    doc_id: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Every document in the collection, in whatever order the backend
  /// returns them.
  fn list(
    &self,
    collection: &str,
  ) -> impl Future<Output = Result<Vec<StoredDocument>, Self::Error>> + Send;
}

// ─── Blob store ──────────────────────────────────────────────────────────────

/// A stored binary asset.
#[derive(Debug, Clone)]
pub struct Blob {
  pub content:    Vec<u8>,
  pub media_type: String,
}

/// Abstraction over the external object storage collaborator.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `content` under `key` and return a durable retrievable URL.
  fn upload(
    &self,
    key: &str,
    content: Vec<u8>,
    media_type: &str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send;

  /// Fetch a stored blob. Absence is `None`, not an error.
  fn fetch(
    &self,
    key: &str,
  ) -> impl Future<Output = Result<Option<Blob>, Self::Error>> + Send;
}

// ─── Write policy ────────────────────────────────────────────────────────────

/// Concurrency strategy for the read-modify-write nested upserts.
///
/// The default matches the documented behaviour of the system: no locking,
/// last write wins at whole-field granularity. `CheckRevision` instead
/// guards the write on the revision observed at read time and surfaces
/// [`Error::RevisionConflict`] when it lost the race; the caller decides
/// whether to retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
  #[default]
  LastWriteWins,
  CheckRevision,
}

// ─── Asset upload ────────────────────────────────────────────────────────────

/// An uploaded file on its way to the blob store.
#[derive(Debug, Clone)]
pub struct AssetUpload {
  pub file_name:  String,
  pub media_type: String,
  pub content:    Vec<u8>,
}

// ─── PortfolioStore ──────────────────────────────────────────────────────────

/// Persistence facade for portfolio documents: CRUD plus nested-collection
/// upsert, with the normalisation contract applied at every read and write
/// boundary.
///
/// Cloning is as cheap as cloning the two collaborators.
#[derive(Clone)]
pub struct PortfolioStore<D, B> {
  documents: D,
  blobs:     B,
}

impl<D, B> PortfolioStore<D, B>
where
  D: DocumentStore,
  B: BlobStore,
{
  pub fn new(documents: D, blobs: B) -> Self {
    Self { documents, blobs }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Fetch one portfolio. An absent document is `None`, not an error; a
  /// present one is repaired into canonical shape with `id` set from the
  /// document key.
  pub async fn get(&self, id: &str) -> Result<Option<Portfolio>> {
    let stored = self
      .documents
      .get(PORTFOLIO_COLLECTION, id)
      .await
      .map_err(Error::storage)?;

    Ok(stored.map(|doc| canonical_with_id(doc.body, id)))
  }

  /// Every portfolio in the collection, each canonicalised the same way as
  /// [`get`](Self::get). No pagination and no ordering guarantee — the
  /// collection is expected to stay small.
  pub async fn get_all(&self) -> Result<Vec<Portfolio>> {
    let stored = self
      .documents
      .list(PORTFOLIO_COLLECTION)
      .await
      .map_err(Error::storage)?;

    Ok(
      stored
        .into_iter()
        .map(|doc| {
          let id = doc.doc_id;
          canonical_with_id(doc.body, &id)
        })
        .collect(),
    )
  }

  // ── Whole-document writes ─────────────────────────────────────────────────

  /// Create (or fully replace) the portfolio keyed by the caller-supplied
  /// `userId` field. Both timestamps are set to now; an existing document at
  /// the key is overwritten.
  pub async fn create(&self, data: Value) -> Result<String> {
    let user_id = data
      .get("userId")
      .and_then(Value::as_str)
      .unwrap_or("")
      .to_owned();
    if user_id.is_empty() {
      return Err(Error::MissingUserId);
    }

    let now = Utc::now();
    let mut portfolio = to_canonical_portfolio(data);
    portfolio.id = user_id.clone();
    portfolio.created_at = Some(now);
    portfolio.updated_at = Some(now);

    self
      .documents
      .put(PORTFOLIO_COLLECTION, &user_id, into_document(&portfolio)?)
      .await
      .map_err(Error::storage)?;

    Ok(user_id)
  }

  /// Apply a partial update: only fields present in `patch` change, with
  /// the sequence-typed fields shaped through the normalizer first and
  /// `updatedAt` refreshed. Fails with [`Error::PortfolioNotFound`] if no
  /// document exists at `id`.
  pub async fn update(&self, id: &str, patch: Value) -> Result<()> {
    let mut patch = match patch {
      Value::Object(map) => map,
      _ => Document::new(),
    };

    // Identity and the creation stamp never change through update.
    patch.remove("id");
    patch.remove("createdAt");

    if let Some(raw) = patch.remove("skills") {
      let skills = normalize_skills(SkillsInput::from_value(raw));
      patch.insert("skills".to_owned(), Value::from(skills));
    }
    if let Some(raw) = patch.remove("experience") {
      let entries: Vec<Experience> = normalize_entries(Some(raw));
      patch.insert("experience".to_owned(), serde_json::to_value(entries)?);
    }
    if let Some(raw) = patch.remove("projects") {
      let entries: Vec<Project> = normalize_entries(Some(raw));
      patch.insert("projects".to_owned(), serde_json::to_value(entries)?);
    }
    patch.insert("updatedAt".to_owned(), serde_json::to_value(Utc::now())?);

    let outcome = self
      .documents
      .merge(PORTFOLIO_COLLECTION, id, patch, None)
      .await
      .map_err(Error::storage)?;

    merge_result(outcome, id)
  }

  /// Remove the portfolio. Idempotent — deleting a missing id succeeds.
  pub async fn delete(&self, id: &str) -> Result<()> {
    self
      .documents
      .delete(PORTFOLIO_COLLECTION, id)
      .await
      .map_err(Error::storage)
  }

  // ── Nested upserts ────────────────────────────────────────────────────────

  /// Insert or replace a project by id, last-write-wins.
  pub async fn upsert_project(
    &self,
    portfolio_id: &str,
    project: Project,
  ) -> Result<()> {
    self
      .upsert_entry(portfolio_id, project, WritePolicy::default())
      .await
  }

  /// Insert or replace an experience entry by id, last-write-wins.
  pub async fn upsert_experience(
    &self,
    portfolio_id: &str,
    experience: Experience,
  ) -> Result<()> {
    self
      .upsert_entry(portfolio_id, experience, WritePolicy::default())
      .await
  }

  /// [`upsert_project`](Self::upsert_project) with an explicit write policy.
  pub async fn upsert_project_with(
    &self,
    portfolio_id: &str,
    project: Project,
    policy: WritePolicy,
  ) -> Result<()> {
    self.upsert_entry(portfolio_id, project, policy).await
  }

  /// [`upsert_experience`](Self::upsert_experience) with an explicit write
  /// policy.
  pub async fn upsert_experience_with(
    &self,
    portfolio_id: &str,
    experience: Experience,
    policy: WritePolicy,
  ) -> Result<()> {
    self.upsert_entry(portfolio_id, experience, policy).await
  }

  /// Shared read-modify-write path for both entry kinds.
  ///
  /// Finds the entry whose id equals the payload's id: found means replace
  /// in place (position preserved), not found means append — minting an id
  /// when the payload carries none. Only the affected field and `updatedAt`
  /// are written back.
  async fn upsert_entry<T: EntryRecord>(
    &self,
    portfolio_id: &str,
    mut entry: T,
    policy: WritePolicy,
  ) -> Result<()> {
    let stored = self
      .documents
      .get(PORTFOLIO_COLLECTION, portfolio_id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| Error::PortfolioNotFound(portfolio_id.to_owned()))?;

    let mut entries: Vec<T> =
      normalize_entries(stored.body.get(T::FIELD).cloned());
    entry.canonicalize();

    let position = entry.id().and_then(|id| {
      entries
        .iter()
        .position(|existing| existing.id().is_some_and(|eid| eid == id))
    });

    match position {
      Some(index) => entries[index] = entry,
      None => {
        if entry.id().is_none() {
          entry.assign_id(EntryId::generate());
        }
        entries.push(entry);
      }
    }

    let mut patch = Document::new();
    patch.insert(T::FIELD.to_owned(), serde_json::to_value(&entries)?);
    patch.insert("updatedAt".to_owned(), serde_json::to_value(Utc::now())?);

    let expected = match policy {
      WritePolicy::LastWriteWins => None,
      WritePolicy::CheckRevision => Some(stored.revision),
    };

    let outcome = self
      .documents
      .merge(PORTFOLIO_COLLECTION, portfolio_id, patch, expected)
      .await
      .map_err(Error::storage)?;

    merge_result(outcome, portfolio_id)
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  /// Store an uploaded file in the blob store and return its URL.
  ///
  /// The key is namespaced by owner, kind tag, and upload time so repeated
  /// uploads of same-named files cannot collide.
  pub async fn upload_asset(
    &self,
    owner_id: &str,
    file: AssetUpload,
    kind: &str,
  ) -> Result<String> {
    let key = format!(
      "{owner_id}/{kind}/{stamp}_{name}",
      stamp = Utc::now().timestamp_millis(),
      name = file.file_name,
    );

    self
      .blobs
      .upload(&key, file.content, &file.media_type)
      .await
      .map_err(Error::storage)
  }

  /// Fetch a stored asset by key. Absence is `None`, not an error.
  pub async fn fetch_asset(&self, key: &str) -> Result<Option<Blob>> {
    self.blobs.fetch(key).await.map_err(Error::storage)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn canonical_with_id(body: Document, id: &str) -> Portfolio {
  let mut portfolio = to_canonical_portfolio(Value::Object(body));
  portfolio.id = id.to_owned();
  portfolio
}

fn into_document(portfolio: &Portfolio) -> Result<Document> {
  match serde_json::to_value(portfolio)? {
    Value::Object(map) => Ok(map),
    // A struct always serialises to an object.
    _ => Ok(Document::new()),
  }
}

fn merge_result(outcome: MergeOutcome, id: &str) -> Result<()> {
  match outcome {
    MergeOutcome::Applied { .. } => Ok(()),
    MergeOutcome::Missing => Err(Error::PortfolioNotFound(id.to_owned())),
    MergeOutcome::Conflict { .. } => {
      Err(Error::RevisionConflict(id.to_owned()))
    }
  }
}
