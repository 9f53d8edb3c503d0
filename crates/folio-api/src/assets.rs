//! Handlers for asset upload and serving.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/portfolios/:id/assets/:kind` | Raw body upload; `?name=` sets the file name |
//! | `GET`  | `/assets/*key` | Serves a stored blob |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{header, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use folio_core::store::{AssetUpload, BlobStore, DocumentStore, PortfolioStore};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

const DEFAULT_FILE_NAME: &str = "upload.bin";
const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  /// Original file name; part of the stored key.
  pub name: Option<String>,
}

/// `POST /portfolios/:id/assets/:kind[?name=photo.png]` — the request body is
/// the file content; the `Content-Type` header is kept as the media type.
pub async fn upload<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path((id, kind)): Path<(String, String)>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  let media_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(DEFAULT_MEDIA_TYPE)
    .to_owned();

  let upload = AssetUpload {
    file_name: params.name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_owned()),
    media_type,
    content: body.to_vec(),
  };

  let url = store.upload_asset(&id, upload, &kind).await?;
  Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}

/// `GET /assets/*key`
pub async fn serve<D, B>(
  State(store): State<Arc<PortfolioStore<D, B>>>,
  Path(key): Path<String>,
) -> Result<Response, ApiError>
where
  D: DocumentStore,
  B: BlobStore,
{
  let blob = store
    .fetch_asset(&key)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("asset {key} not found")))?;

  Ok(
    (
      StatusCode::OK,
      [(header::CONTENT_TYPE, blob.media_type)],
      blob.content,
    )
      .into_response(),
  )
}
