//! Handlers for `/portfolios` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/portfolios` | All portfolios, canonical shape |
//! | `POST`   | `/portfolios` | Body: raw portfolio data with `userId`; create-or-replace |
//! | `GET`    | `/portfolios/:id` | 404 if not found |
//! | `PATCH`  | `/portfolios/:id` | Partial update; only supplied fields change |
//! | `DELETE` | `/portfolios/:id` | Idempotent |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  portfolio::Portfolio,
  store::{BlobStore, DocumentStore, PortfolioStore},
};
use serde_json::{json, Value};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /portfolios`
pub async fn list<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
) -> Result<Json<Vec<Portfolio>>, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  let portfolios = store.get_all().await?;
  Ok(Json(portfolios))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /portfolios` — body is raw portfolio data carrying `userId`.
///
/// Create-or-replace: an existing portfolio at that user id is overwritten.
pub async fn create<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  let id = store.create(body).await?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /portfolios/:id`
pub async fn get_one<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(id): Path<String>,
) -> Result<Json<Portfolio>, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  let portfolio = store
    .get(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("portfolio {id} not found")))?;
  Ok(Json(portfolio))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /portfolios/:id` — body is a partial document; fields not present
/// are left untouched.
pub async fn update_one<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(id): Path<String>,
  Json(body): Json<Value>,
) -> Result<StatusCode, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  store.update(&id, body).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /portfolios/:id` — succeeds whether or not the portfolio exists.
pub async fn delete_one<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  store.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}
