//! The `QuoteStore` and `SessionStore` traits and supporting types.
//!
//! The traits are implemented by storage backends (e.g.
//! `solace-store-sqlite`). Higher layers (`solace-engine`, `solace-api`)
//! depend on these abstractions, not on any concrete backend.
//!
//! The backing store guarantees per-statement atomicity only; sequences of
//! statements do not compose into transactions from this crate's point of
//! view. Every check-then-insert flow therefore goes through an
//! insert-if-absent operation returning [`InsertOutcome`], and callers
//! treat [`InsertOutcome::AlreadyPresent`] as success.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  quote::{Language, NewQuote, Quote},
  session::StoredSession,
};

// ─── Idempotent-upsert outcome ───────────────────────────────────────────────

/// Result of an insert-if-absent operation. Duplicate inserts converge on
/// the row that won, so two racing callers both observe success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome<T> {
  Inserted(T),
  AlreadyPresent(T),
}

impl<T> InsertOutcome<T> {
  pub fn was_inserted(&self) -> bool { matches!(self, Self::Inserted(_)) }

  pub fn into_value(self) -> T {
    match self {
      Self::Inserted(v) | Self::AlreadyPresent(v) => v,
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// The quote chosen for one `(day, language)` pair. Append-only; rows
/// accumulate and double as the anti-repeat window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySelection {
  pub day:         NaiveDate,
  pub language:    Language,
  pub quote_id:    Uuid,
  pub selected_at: DateTime<Utc>,
}

/// A user's saved quote. Unique per `(user_id, quote_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
  pub user_id:    String,
  pub quote_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

/// Records that a user was shown a quote on a given day.
/// Unique per `(user_id, quote_id, day)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub user_id:  String,
  pub quote_id: Uuid,
  pub day:      NaiveDate,
}

/// Outcome of one atomic rate-budget consume attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateConsume {
  pub allowed: bool,
  /// The counter value after the attempt (unchanged when denied).
  pub used:    u32,
}

// ─── QuoteStore ──────────────────────────────────────────────────────────────

/// Abstraction over the durable quote store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait QuoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Quotes ────────────────────────────────────────────────────────────

  /// Validate and persist a new quote. `quote_id` and `created_at` are
  /// assigned by the store.
  fn insert_quote(
    &self,
    input: NewQuote,
  ) -> impl Future<Output = Result<Quote, Self::Error>> + Send + '_;

  /// Retrieve a quote by id. Returns `None` if not found.
  fn get_quote(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Quote>, Self::Error>> + Send + '_;

  /// The whole corpus. The corpus is bounded and small by design; search
  /// tiers scan it in memory.
  fn list_quotes(
    &self,
  ) -> impl Future<Output = Result<Vec<Quote>, Self::Error>> + Send + '_;

  /// Quotes whose origin language is one of `languages`.
  fn quotes_in_languages<'a>(
    &'a self,
    languages: &'a [Language],
  ) -> impl Future<Output = Result<Vec<Quote>, Self::Error>> + Send + 'a;

  // ── Daily selections ──────────────────────────────────────────────────

  fn daily_selection<'a>(
    &'a self,
    day: NaiveDate,
    language: &'a Language,
  ) -> impl Future<Output = Result<Option<DailySelection>, Self::Error>> + Send + 'a;

  /// Insert the selection unless a row for `(day, language)` already
  /// exists, in which case the existing row is returned. Concurrent
  /// callers converge on a single winning row.
  fn insert_daily_selection_if_absent(
    &self,
    selection: DailySelection,
  ) -> impl Future<Output = Result<InsertOutcome<DailySelection>, Self::Error>> + Send + '_;

  /// Quote ids selected for `language` on or after `since`.
  fn recent_daily_quote_ids<'a>(
    &'a self,
    language: &'a Language,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + 'a;

  // ── Favorites ─────────────────────────────────────────────────────────

  fn add_favorite_if_absent(
    &self,
    favorite: Favorite,
  ) -> impl Future<Output = Result<InsertOutcome<Favorite>, Self::Error>> + Send + '_;

  /// Remove a favorite. Returns `false` when no row existed; that is not
  /// an error.
  fn remove_favorite<'a>(
    &'a self,
    user_id: &'a str,
    quote_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn list_favorites<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Favorite>, Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  fn record_history_if_absent(
    &self,
    entry: HistoryEntry,
  ) -> impl Future<Output = Result<InsertOutcome<HistoryEntry>, Self::Error>> + Send + '_;

  // ── Rate counters ─────────────────────────────────────────────────────

  /// Atomically increment the `(user, day)` counter unless it has reached
  /// `max`. Check and increment are one statement; two concurrent callers
  /// cannot both pass at the cap.
  fn consume_rate_budget<'a>(
    &'a self,
    user_id: &'a str,
    day: NaiveDate,
    max: u32,
  ) -> impl Future<Output = Result<RateConsume, Self::Error>> + Send + 'a;

  /// Current counter value without consuming.
  fn rate_used<'a>(
    &'a self,
    user_id: &'a str,
    day: NaiveDate,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + 'a;
}

// ─── SessionStore ────────────────────────────────────────────────────────────

/// Read access to sessions issued by the session authority, plus the
/// issuance write used by the operator helper. Request handling never
/// mutates sessions.
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn session<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<StoredSession>, Self::Error>> + Send + 'a;

  /// Insert or replace the session for `session.user_id`.
  fn put_session(
    &self,
    session: StoredSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
