//! Handler for `POST /search`.
//!
//! The body carries the free-text query, the requested language, optional
//! caller credentials (required only for the AI tier), and the ids
//! already delivered to this client so load-more calls advance the page.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use solace_core::{
  provider::GenerationProvider,
  quote::{Language, Quote},
  store::{QuoteStore, SessionStore},
};
use solace_engine::{
  rate::RateStatus,
  search::{Caller, SearchSource},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SearchBody {
  pub query:         String,
  pub language:      String,
  pub user_id:       Option<String>,
  pub session_token: Option<String>,
  /// Ids already shown; the next page skips them.
  #[serde(default)]
  pub exclude_ids:   Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub quotes:     Vec<Quote>,
  pub source:     SearchSource,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rate_limit: Option<RateStatus>,
}

/// `POST /search`
pub async fn handler<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<SearchBody>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let caller = match (body.user_id, body.session_token) {
    (Some(user_id), Some(token)) => Some(Caller { user_id, token }),
    _ => None,
  };

  let outcome = state
    .search
    .search(
      &body.query,
      &Language::new(&body.language),
      caller.as_ref(),
      &body.exclude_ids,
    )
    .await?;

  Ok(Json(SearchResponse {
    quotes:     outcome.quotes,
    source:     outcome.source,
    rate_limit: outcome.rate_limit,
  }))
}
