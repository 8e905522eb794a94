//! Quote distribution and search logic for Solace.
//!
//! Everything in this crate is generic over the store traits from
//! `solace-core`; no HTTP or database types appear here. The components
//! mirror the service's moving parts:
//!
//! - [`daily::DailySelector`] — one quote per `(day, language)`, globally
//!   consistent, with an anti-repeat window.
//! - [`auth::SessionGate`] — the single authorisation check guarding every
//!   per-user mutation.
//! - [`rate::RateLimiter`] — per-user daily budget for generation-invoking
//!   searches.
//! - [`search::SearchResolver`] — tiered lookup: direct match, synonym
//!   expansion, then AI generation with result caching.
//! - [`favorites::FavoritesManager`] and [`history::HistoryRecorder`] —
//!   idempotent per-user writes.

pub mod auth;
pub mod config;
pub mod daily;
pub mod error;
pub mod favorites;
pub mod history;
pub mod rate;
pub mod recover;
pub mod search;
pub mod synonyms;

pub use config::EngineConfig;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
