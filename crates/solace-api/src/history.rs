//! Handler for `POST /history` — record that a user was shown a quote.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use solace_core::{
  clock::Clock as _,
  provider::GenerationProvider,
  store::{QuoteStore, SessionStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct HistoryBody {
  pub user_id:       String,
  pub quote_id:      Uuid,
  /// Defaults to the current UTC date.
  pub day:           Option<NaiveDate>,
  pub session_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
  pub success:          bool,
  pub already_recorded: bool,
}

/// `POST /history` — idempotent per `(user, quote, day)`.
pub async fn record<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<HistoryBody>,
) -> Result<Json<HistoryResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  // Like every mutation, history writes pass the session gate first.
  state
    .gate
    .authorize(&body.user_id, body.session_token.as_deref())
    .await?;

  let day = body.day.unwrap_or_else(|| state.clock.today());
  let recorded = state
    .history
    .record_shown(&body.user_id, body.quote_id, day)
    .await?;

  Ok(Json(HistoryResponse {
    success:          true,
    already_recorded: recorded.already_recorded,
  }))
}
