//! Error taxonomy for engine operations.
//!
//! Every public engine operation returns one of these variants; nothing
//! panics across the crate boundary. Authorisation and rate-limit failures
//! propagate to the caller, while content-availability and generation
//! failures are recovered internally by dropping to a lower tier.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("quote not found: {0}")]
  NotFound(Uuid),

  #[error("daily generation limit reached ({used}/{max})")]
  RateLimitExceeded { used: u32, max: u32 },

  #[error("generation failed: {0}")]
  GenerationFailed(String),

  #[error("no content available for selection")]
  NoContentAvailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
