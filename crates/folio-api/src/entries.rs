//! Handlers for nested-entry upserts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/portfolios/:id/projects` | Body: a [`Project`]; upsert by entry id |
//! | `PUT`  | `/portfolios/:id/experience` | Body: an [`Experience`]; upsert by entry id |
//!
//! Both accept `?checked=true` to guard the write on the document revision
//! observed at read time; a lost race then returns `409 Conflict` instead of
//! silently winning.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use folio_core::{
  portfolio::{Experience, Project},
  store::{BlobStore, DocumentStore, PortfolioStore, WritePolicy},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UpsertParams {
  /// Opt into the revision-guarded write path.
  #[serde(default)]
  pub checked: bool,
}

impl UpsertParams {
  fn policy(&self) -> WritePolicy {
    if self.checked {
      WritePolicy::CheckRevision
    } else {
      WritePolicy::LastWriteWins
    }
  }
}

/// `PUT /portfolios/:id/projects[?checked=true]`
pub async fn upsert_project<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(id): Path<String>,
  Query(params): Query<UpsertParams>,
  Json(project): Json<Project>,
) -> Result<StatusCode, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  store
    .upsert_project_with(&id, project, params.policy())
    .await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /portfolios/:id/experience[?checked=true]`
pub async fn upsert_experience<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(id): Path<String>,
  Query(params): Query<UpsertParams>,
  Json(experience): Json<Experience>,
) -> Result<StatusCode, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  store
    .upsert_experience_with(&id, experience, params.policy())
    .await?;
  Ok(StatusCode::NO_CONTENT)
}
