//! Daily quote selection — one quote per `(day, language)`, the same for
//! every client.
//!
//! Selection is check-then-insert over a store without multi-statement
//! transactions; two racing callers both succeed because the insert is
//! if-absent and both read back the winning row.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use solace_core::{
  clock::{Clock, Sampler},
  quote::{Language, Quote},
  store::{DailySelection, QuoteStore},
};

use crate::{EngineConfig, Error, Result};

/// Outcome of a read-only daily lookup.
#[derive(Debug, Clone)]
pub enum DailyLookup {
  Selected(Quote),
  /// No selection exists yet for the pair; the caller should run
  /// [`DailySelector::ensure_daily_quote`].
  NeedsSelection,
}

/// Result of a selection-or-lookup call.
#[derive(Debug, Clone)]
pub struct EnsuredDaily {
  pub quote:           Quote,
  pub already_existed: bool,
}

pub struct DailySelector<S> {
  store:              S,
  clock:              Arc<dyn Clock>,
  sampler:            Arc<dyn Sampler>,
  pivot:              Language,
  repeat_window_days: u32,
}

impl<S> DailySelector<S>
where
  S: QuoteStore,
{
  pub fn new(
    store: S,
    clock: Arc<dyn Clock>,
    sampler: Arc<dyn Sampler>,
    config: &EngineConfig,
  ) -> Self {
    Self {
      store,
      clock,
      sampler,
      pivot: config.pivot_language.clone(),
      repeat_window_days: config.repeat_window_days,
    }
  }

  /// Return the quote already selected for `(day, language)`, or signal
  /// that selection is required.
  pub async fn daily_quote(
    &self,
    day: NaiveDate,
    language: &Language,
  ) -> Result<DailyLookup> {
    if let Some(selection) = self
      .store
      .daily_selection(day, language)
      .await
      .map_err(Error::store)?
    {
      // A selection row pointing at a vanished quote degrades to
      // reselection instead of failing the home view.
      if let Some(quote) = self
        .store
        .get_quote(selection.quote_id)
        .await
        .map_err(Error::store)?
      {
        return Ok(DailyLookup::Selected(quote));
      }
    }
    Ok(DailyLookup::NeedsSelection)
  }

  /// Select (or return the already-selected) quote of the day for
  /// `language`.
  pub async fn ensure_daily_quote(
    &self,
    language: &Language,
  ) -> Result<EnsuredDaily> {
    let today = self.clock.today();

    // Race guard: a concurrent caller may have selected since our caller
    // looked.
    if let DailyLookup::Selected(quote) = self.daily_quote(today, language).await? {
      return Ok(EnsuredDaily { quote, already_existed: true });
    }

    let pool = self.candidate_pool(language).await?;
    if pool.is_empty() {
      return Err(Error::NoContentAvailable);
    }

    let since = today - Duration::days(i64::from(self.repeat_window_days));
    let recent: HashSet<_> = self
      .store
      .recent_daily_quote_ids(language, since)
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();

    let eligible: Vec<&Quote> = pool
      .iter()
      .filter(|q| !recent.contains(&q.quote_id))
      .collect();
    // A fully-exhausted window falls back to the whole pool rather than
    // serving nothing.
    let eligible = if eligible.is_empty() {
      pool.iter().collect()
    } else {
      eligible
    };

    let chosen = eligible[self.sampler.pick(eligible.len())].clone();

    let outcome = self
      .store
      .insert_daily_selection_if_absent(DailySelection {
        day:         today,
        language:    language.clone(),
        quote_id:    chosen.quote_id,
        selected_at: self.clock.now(),
      })
      .await
      .map_err(Error::store)?;

    let already_existed = !outcome.was_inserted();
    let winner = outcome.into_value();

    // When a racing caller won, serve their selection.
    let quote = if winner.quote_id == chosen.quote_id {
      chosen
    } else {
      self
        .store
        .get_quote(winner.quote_id)
        .await
        .map_err(Error::store)?
        .unwrap_or(chosen)
    };

    Ok(EnsuredDaily { quote, already_existed })
  }

  /// Quotes in the requested language unioned with the pivot-language
  /// pool, collapsed by normalised text prefix.
  async fn candidate_pool(&self, language: &Language) -> Result<Vec<Quote>> {
    let mut languages = vec![language.clone()];
    if *language != self.pivot {
      languages.push(self.pivot.clone());
    }

    let quotes = self
      .store
      .quotes_in_languages(&languages)
      .await
      .map_err(Error::store)?;

    let mut seen = HashSet::new();
    Ok(
      quotes
        .into_iter()
        .filter(|q| seen.insert(q.dedup_key()))
        .collect(),
    )
  }
}
