//! Per-user view history — which quote a user was shown on which day.

use chrono::NaiveDate;
use solace_core::store::{HistoryEntry, QuoteStore};
use uuid::Uuid;

use crate::{Error, Result};

/// Result of a record call; duplicate recordings within a day are
/// absorbed, not errors.
#[derive(Debug, Clone, Copy)]
pub struct RecordedView {
  pub already_recorded: bool,
}

pub struct HistoryRecorder<S> {
  store: S,
}

impl<S> HistoryRecorder<S>
where
  S: QuoteStore,
{
  pub fn new(store: S) -> Self { Self { store } }

  /// Record that `user_id` was shown `quote_id` on `day`. Idempotent per
  /// `(user, quote, day)`.
  pub async fn record_shown(
    &self,
    user_id: &str,
    quote_id: Uuid,
    day: NaiveDate,
  ) -> Result<RecordedView> {
    self
      .store
      .get_quote(quote_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(quote_id))?;

    let outcome = self
      .store
      .record_history_if_absent(HistoryEntry {
        user_id: user_id.to_owned(),
        quote_id,
        day,
      })
      .await
      .map_err(Error::store)?;

    Ok(RecordedView { already_recorded: !outcome.was_inserted() })
  }
}
