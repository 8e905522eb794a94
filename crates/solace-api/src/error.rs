//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body carries `{"success": false, "error": "..."}` so
//! clients branch on one shape regardless of which endpoint failed.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use solace_engine::Error as EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("rate limit exceeded ({used}/{max})")]
  RateLimited { used: u32, max: u32 },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self {
    match e {
      EngineError::Unauthorized => Self::Unauthorized,
      EngineError::NotFound(id) => Self::NotFound(format!("quote {id}")),
      EngineError::RateLimitExceeded { used, max } => {
        Self::RateLimited { used, max }
      }
      EngineError::NoContentAvailable => {
        Self::NotFound("no content available".into())
      }
      EngineError::GenerationFailed(m) => Self::Internal(m),
      EngineError::Store(e) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
    }

    let body = json!({ "success": false, "error": self.to_string() });
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unauthorized_message_is_exact() {
    // Clients match on this string.
    assert_eq!(ApiError::Unauthorized.to_string(), "Unauthorized");
    assert_eq!(
      ApiError::from(EngineError::Unauthorized).to_string(),
      "Unauthorized"
    );
  }

  #[test]
  fn engine_errors_map_to_statuses() {
    let response = ApiError::from(EngineError::NoContentAvailable).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ApiError::Unauthorized.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
  }
}
