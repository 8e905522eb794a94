//! JSON HTTP API for the Solace quote service.
//!
//! Exposes an axum [`Router`] backed by any store implementing the core
//! traits. Every mutation endpoint takes the caller's session token in
//! its body or query; an invalid or missing token yields a structured
//! `{"success": false, "error": "Unauthorized"}` body rather than a bare
//! status, so client handling stays uniform.

pub mod daily;
pub mod error;
pub mod favorites;
pub mod history;
pub mod quotes;
pub mod search;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use solace_core::{
  clock::{Clock, Sampler},
  provider::{GenerationProvider, ProviderError},
  store::{QuoteStore, SessionStore},
};
use solace_engine::{
  auth::SessionGate, daily::DailySelector, favorites::FavoritesManager,
  history::HistoryRecorder, rate::RateLimiter, search::SearchResolver,
  synonyms::SynonymTable, EngineConfig,
};
use solace_gen::{DisabledProvider, GenerationConfig, HttpGenerationProvider};
use tower_http::trace::TraceLayer;

pub use error::ApiError;


// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub engine:     EngineConfig,
  /// Absent means the AI search tier is disabled.
  pub generation: Option<GenerationConfig>,
}

// ─── Provider selection ──────────────────────────────────────────────────────

/// Chosen at startup: HTTP when a generation endpoint is configured,
/// otherwise a provider that always fails so search degrades gracefully.
pub enum ConfiguredProvider {
  Http(HttpGenerationProvider),
  Disabled(DisabledProvider),
}

impl ConfiguredProvider {
  pub fn from_config(
    generation: Option<GenerationConfig>,
  ) -> Result<Self, ProviderError> {
    match generation {
      Some(config) => Ok(Self::Http(HttpGenerationProvider::new(config)?)),
      None => Ok(Self::Disabled(DisabledProvider)),
    }
  }
}

impl GenerationProvider for ConfiguredProvider {
  async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
    match self {
      Self::Http(provider) => provider.generate(prompt).await,
      Self::Disabled(provider) => provider.generate(prompt).await,
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, P> {
  pub store:     S,
  pub daily:     Arc<DailySelector<S>>,
  pub search:    Arc<SearchResolver<S, P>>,
  pub favorites: Arc<FavoritesManager<S>>,
  pub history:   Arc<HistoryRecorder<S>>,
  pub gate:      Arc<SessionGate<S>>,
  pub clock:     Arc<dyn Clock>,
}

impl<S: Clone, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      daily:     self.daily.clone(),
      search:    self.search.clone(),
      favorites: self.favorites.clone(),
      history:   self.history.clone(),
      gate:      self.gate.clone(),
      clock:     self.clock.clone(),
    }
  }
}

impl<S, P> AppState<S, P>
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  pub fn new(
    store: S,
    provider: P,
    clock: Arc<dyn Clock>,
    sampler: Arc<dyn Sampler>,
    config: &EngineConfig,
  ) -> Self {
    let gate = SessionGate::new(store.clone(), clock.clone());
    let limiter =
      RateLimiter::new(store.clone(), config.daily_generation_limit);

    Self {
      daily:     Arc::new(DailySelector::new(
        store.clone(),
        clock.clone(),
        sampler,
        config,
      )),
      search:    Arc::new(SearchResolver::new(
        store.clone(),
        gate.clone(),
        limiter,
        provider,
        SynonymTable::default(),
        clock.clone(),
        config,
      )),
      favorites: Arc::new(FavoritesManager::new(
        store.clone(),
        gate.clone(),
        clock.clone(),
      )),
      history:   Arc::new(HistoryRecorder::new(store.clone())),
      gate:      Arc::new(gate),
      store,
      clock,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the quote service.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: QuoteStore + SessionStore + Clone + Send + Sync + 'static,
  P: GenerationProvider + 'static,
{
  Router::new()
    .route("/daily", get(daily::get_daily::<S, P>))
    .route("/daily/ensure", post(daily::ensure::<S, P>))
    .route("/search", post(search::handler::<S, P>))
    .route(
      "/favorites",
      post(favorites::add::<S, P>)
        .delete(favorites::remove::<S, P>)
        .get(favorites::list::<S, P>),
    )
    .route("/history", post(history::record::<S, P>))
    .route("/quotes/{id}", get(quotes::get_one::<S, P>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
