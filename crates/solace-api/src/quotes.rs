//! Handler for `GET /quotes/{id}` — quote detail.

use axum::{
  Json,
  extract::{Path, State},
};
use solace_core::{
  provider::GenerationProvider,
  quote::Quote,
  store::{QuoteStore, SessionStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /quotes/{id}`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let quote = state
    .store
    .get_quote(id)
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .ok_or_else(|| ApiError::NotFound(format!("quote {id}")))?;

  Ok(Json(quote))
}
