//! Engine tunables, deserialised from the server's `config.toml`.

use serde::Deserialize;
use solace_core::quote::Language;

/// Behavioural knobs for the engine. All of these were fixed constants in
/// earlier deployments; they are configuration now so operators can tune
/// them without a rebuild.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Days a quote stays ineligible after being served as a daily quote.
  pub repeat_window_days:      u32,
  /// Generation-invoking searches allowed per user per day.
  pub daily_generation_limit:  u32,
  /// The language whose quotes always carry full translations; used as the
  /// cross-language fallback pool and as the second language demanded from
  /// the generation provider.
  pub pivot_language:          Language,
  /// Search results per page.
  pub page_size:               usize,
  /// Upper bound on one generation call before it counts as failed.
  pub generation_timeout_secs: u64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      repeat_window_days:      30,
      daily_generation_limit:  10,
      pivot_language:          Language::new("en"),
      page_size:               3,
      generation_timeout_secs: 20,
    }
  }
}
