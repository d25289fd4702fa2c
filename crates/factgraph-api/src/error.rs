//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use factgraph_core::Error;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Service(#[from] Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let e = match self {
      ApiError::BadRequest(m) => {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response();
      }
      ApiError::Service(e) => e,
    };

    let message = e.to_string();
    match e {
      Error::FactNotFound(_) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
      }
      Error::AuthenticationFailed(_) => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"factgraph\""),
        );
        res
      }
      Error::AccessDenied(_) => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
      }
      Error::InvalidArgument(errors) => (
        StatusCode::PRECONDITION_FAILED,
        Json(json!({ "error": message, "messages": errors })),
      )
        .into_response(),
      other => {
        error!(error = %other, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
      }
    }
  }
}
