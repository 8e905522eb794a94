//! Handlers for the daily-quote endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/daily` | `?language=..` required; optional `day` |
//! | `POST` | `/daily/ensure` | Body: `{"language": ".."}`; selects if needed |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use solace_core::{
  clock::Clock as _,
  provider::GenerationProvider,
  quote::{Language, Quote},
  store::{QuoteStore, SessionStore},
};
use solace_engine::{daily::DailyLookup, Error as EngineError};

use crate::{AppState, error::ApiError};

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DailyParams {
  pub language: String,
  /// Defaults to the current UTC date.
  pub day:      Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
  pub quote:           Option<Quote>,
  pub source:          &'static str,
  pub needs_selection: bool,
}

/// `GET /daily?language=..[&day=..]`
pub async fn get_daily<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<DailyParams>,
) -> Result<Json<DailyResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let day = params.day.unwrap_or_else(|| state.clock.today());
  let language = Language::new(&params.language);

  let response = match state.daily.daily_quote(day, &language).await? {
    DailyLookup::Selected(quote) => DailyResponse {
      quote:           Some(quote),
      source:          "daily",
      needs_selection: false,
    },
    DailyLookup::NeedsSelection => DailyResponse {
      quote:           None,
      source:          "none",
      needs_selection: true,
    },
  };

  Ok(Json(response))
}

// ─── Selection ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnsureBody {
  pub language: String,
}

#[derive(Debug, Serialize)]
pub struct EnsureResponse {
  pub quote:           Option<Quote>,
  pub source:          &'static str,
  pub already_existed: bool,
}

/// `POST /daily/ensure` — select today's quote if none exists yet.
///
/// An empty corpus is not an error: the client degrades to its local
/// cache, so the response carries `quote: null` instead of a failure.
pub async fn ensure<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<EnsureBody>,
) -> Result<Json<EnsureResponse>, ApiError>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  let language = Language::new(&body.language);

  match state.daily.ensure_daily_quote(&language).await {
    Ok(ensured) => Ok(Json(EnsureResponse {
      quote:           Some(ensured.quote),
      source:          "daily",
      already_existed: ensured.already_existed,
    })),
    Err(EngineError::NoContentAvailable) => Ok(Json(EnsureResponse {
      quote:           None,
      source:          "none",
      already_existed: false,
    })),
    Err(e) => Err(e.into()),
  }
}
