//! Per-user daily budget for generation-invoking searches.

use chrono::NaiveDate;
use serde::Serialize;
use solace_core::store::QuoteStore;

use crate::{Error, Result};

/// Counter state reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateStatus {
  pub used:      u32,
  pub max:       u32,
  pub remaining: u32,
}

impl RateStatus {
  pub fn new(used: u32, max: u32) -> Self {
    Self { used, max, remaining: max.saturating_sub(used) }
  }
}

/// Outcome of one consume attempt.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
  pub allowed: bool,
  pub status:  RateStatus,
}

pub struct RateLimiter<S> {
  store: S,
  max:   u32,
}

impl<S> RateLimiter<S>
where
  S: QuoteStore,
{
  pub fn new(store: S, max: u32) -> Self { Self { store, max } }

  /// Consume one unit of the `(user, day)` budget if any remains.
  ///
  /// Check and increment are a single store statement, so concurrent
  /// callers cannot both pass at the cap.
  pub async fn check_and_consume(
    &self,
    user_id: &str,
    day: NaiveDate,
  ) -> Result<RateDecision> {
    let consume = self
      .store
      .consume_rate_budget(user_id, day, self.max)
      .await
      .map_err(Error::store)?;

    Ok(RateDecision {
      allowed: consume.allowed,
      status:  RateStatus::new(consume.used, self.max),
    })
  }

  /// Current counter state without consuming.
  pub async fn status(&self, user_id: &str, day: NaiveDate) -> Result<RateStatus> {
    let used = self
      .store
      .rate_used(user_id, day)
      .await
      .map_err(Error::store)?;
    Ok(RateStatus::new(used, self.max))
  }
}
