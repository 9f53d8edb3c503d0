//! JSON REST API for folio.
//!
//! Exposes an axum [`Router`] backed by any [`DocumentStore`] +
//! [`BlobStore`] pair through the [`PortfolioStore`] facade. Auth, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", folio_api::api_router(store.clone()))
//! ```

pub mod assets;
pub mod entries;
pub mod error;
pub mod portfolios;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use folio_core::store::{BlobStore, DocumentStore, PortfolioStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<D, B>(store: Arc<PortfolioStore<D, B>>) -> Router<()>
where
  D: DocumentStore + 'static,
  B: BlobStore + 'static,
{
  Router::new()
    // Portfolios
    .route(
      "/portfolios",
      get(portfolios::list::<D, B>).post(portfolios::create::<D, B>),
    )
    .route(
      "/portfolios/{id}",
      get(portfolios::get_one::<D, B>)
        .patch(portfolios::update_one::<D, B>)
        .delete(portfolios::delete_one::<D, B>),
    )
    // Nested entries
    .route(
      "/portfolios/{id}/projects",
      put(entries::upsert_project::<D, B>),
    )
    .route(
      "/portfolios/{id}/experience",
      put(entries::upsert_experience::<D, B>),
    )
    // Assets
    .route(
      "/portfolios/{id}/assets/{kind}",
      post(assets::upload::<D, B>),
    )
    .route("/assets/{*key}", get(assets::serve::<D, B>))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
  };
  use folio_store_sqlite::SqliteStore;
  use serde_json::{json, Value};
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(PortfolioStore::new(store.clone(), store)))
  }

  async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(value) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(value.to_string())
      }
      None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn create_then_get_round_trip() {
    let app = app().await;

    let resp = send_json(
      &app,
      "POST",
      "/portfolios",
      Some(json!({"userId": "u1", "name": "Alice", "skills": "Go, Rust"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await, json!({"id": "u1"}));

    let resp = send_json(&app, "GET", "/portfolios/u1", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body.get("name").unwrap(), "Alice");
    assert_eq!(body.get("skills").unwrap(), &json!(["Go", "Rust"]));
  }

  #[tokio::test]
  async fn create_without_user_id_returns_400() {
    let app = app().await;
    let resp =
      send_json(&app, "POST", "/portfolios", Some(json!({"name": "x"}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await.get("error").is_some());
  }

  #[tokio::test]
  async fn get_missing_returns_404() {
    let app = app().await;
    let resp = send_json(&app, "GET", "/portfolios/nobody", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn patch_updates_only_supplied_fields() {
    let app = app().await;

    send_json(
      &app,
      "POST",
      "/portfolios",
      Some(json!({"userId": "u1", "name": "Alice", "title": "Dev"})),
    )
    .await;

    let resp = send_json(
      &app,
      "PATCH",
      "/portfolios/u1",
      Some(json!({"title": "Staff Dev"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body = json_body(send_json(&app, "GET", "/portfolios/u1", None).await).await;
    assert_eq!(body.get("name").unwrap(), "Alice");
    assert_eq!(body.get("title").unwrap(), "Staff Dev");
  }

  #[tokio::test]
  async fn patch_missing_returns_404() {
    let app = app().await;
    let resp = send_json(
      &app,
      "PATCH",
      "/portfolios/nobody",
      Some(json!({"name": "x"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_is_idempotent_at_the_http_level() {
    let app = app().await;

    // Never existed.
    let resp = send_json(&app, "DELETE", "/portfolios/nobody", None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    send_json(&app, "POST", "/portfolios", Some(json!({"userId": "u1"}))).await;
    let resp = send_json(&app, "DELETE", "/portfolios/u1", None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send_json(&app, "GET", "/portfolios/u1", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn put_project_upserts_by_entry_id() {
    let app = app().await;

    send_json(
      &app,
      "POST",
      "/portfolios",
      Some(json!({"userId": "u1", "projects": [{"id": 1, "title": "A"}]})),
    )
    .await;

    let resp = send_json(
      &app,
      "PUT",
      "/portfolios/u1/projects",
      Some(json!({"id": 1, "title": "A2"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body = json_body(send_json(&app, "GET", "/portfolios/u1", None).await).await;
    let projects = body.get("projects").unwrap().as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].get("title").unwrap(), "A2");
  }

  #[tokio::test]
  async fn put_experience_on_missing_portfolio_returns_404() {
    let app = app().await;
    let resp = send_json(
      &app,
      "PUT",
      "/portfolios/nobody/experience",
      Some(json!({"company": "Acme"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn upload_then_serve_asset() {
    let app = app().await;

    let req = Request::builder()
      .method("POST")
      .uri("/portfolios/u1/assets/profile?name=avatar.png")
      .header(header::CONTENT_TYPE, "image/png")
      .body(Body::from(vec![1u8, 2, 3]))
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let url = json_body(resp)
      .await
      .get("url")
      .unwrap()
      .as_str()
      .unwrap()
      .to_owned();
    assert!(url.starts_with("/assets/u1/profile/"), "url: {url}");

    let resp = send_json(&app, "GET", &url, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp
      .headers()
      .get(header::CONTENT_TYPE)
      .unwrap()
      .to_str()
      .unwrap();
    assert_eq!(ct, "image/png");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(bytes.as_ref(), &[1, 2, 3]);
  }

  #[tokio::test]
  async fn list_returns_every_portfolio() {
    let app = app().await;

    send_json(&app, "POST", "/portfolios", Some(json!({"userId": "u1"}))).await;
    send_json(&app, "POST", "/portfolios", Some(json!({"userId": "u2"}))).await;

    let resp = send_json(&app, "GET", "/portfolios", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
  }
}
