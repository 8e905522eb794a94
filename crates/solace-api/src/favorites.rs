//! Handlers for `/favorites` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/favorites` | Body: [`FavoriteBody`]; idempotent |
//! | `DELETE` | `/favorites` | Body: [`FavoriteBody`]; absent row is success |
//! | `GET`    | `/favorites` | `?user_id=..&session_token=..` |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use solace_core::{
  provider::GenerationProvider,
  store::{QuoteStore, SessionStore},
};
use solace_engine::favorites::FavoriteQuote;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct FavoriteBody {
  pub user_id:       String,
  pub quote_id:      Uuid,
  pub session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
  pub success:           bool,
  pub already_favorited: bool,
}

/// `POST /favorites`
pub async fn add<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<FavoriteBody>,
) -> Result<Json<AddResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let added = state
    .favorites
    .add(&body.user_id, body.quote_id, body.session_token.as_deref())
    .await?;

  Ok(Json(AddResponse {
    success:           true,
    already_favorited: added.already_favorited,
  }))
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
  pub success: bool,
}

/// `DELETE /favorites`
pub async fn remove<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<FavoriteBody>,
) -> Result<Json<RemoveResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  state
    .favorites
    .remove(&body.user_id, body.quote_id, body.session_token.as_deref())
    .await?;

  Ok(Json(RemoveResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id:       String,
  pub session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub favorites: Vec<FavoriteQuote>,
}

/// `GET /favorites?user_id=..&session_token=..`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let favorites = state
    .favorites
    .list(&params.user_id, params.session_token.as_deref())
    .await?;

  Ok(Json(ListResponse { favorites }))
}
