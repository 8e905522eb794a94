//! Injected time and randomness sources.
//!
//! Daily selection depends on "today" and on a uniform random pick. Both
//! are behind traits so selection logic is deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};
use rand_core::{OsRng, RngCore as _};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of the current instant.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// The current UTC calendar date.
  fn today(&self) -> NaiveDate { self.now().date_naive() }
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

// ─── Sampler ─────────────────────────────────────────────────────────────────

/// Source of uniform random indices.
pub trait Sampler: Send + Sync {
  /// A uniform index in `0..len`. `len` must be non-zero.
  fn pick(&self, len: usize) -> usize;
}

/// OS-entropy backed sampler.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSampler;

impl Sampler for OsSampler {
  fn pick(&self, len: usize) -> usize {
    debug_assert!(len > 0);
    (OsRng.next_u64() % len as u64) as usize
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn os_sampler_stays_in_bounds() {
    let sampler = OsSampler;
    for _ in 0..1000 {
      assert!(sampler.pick(7) < 7);
    }
    assert_eq!(sampler.pick(1), 0);
  }

  #[test]
  fn system_clock_today_matches_now() {
    let clock = SystemClock;
    assert_eq!(clock.today(), clock.now().date_naive());
  }
}
