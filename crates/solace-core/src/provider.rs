//! The external text-generation provider boundary.
//!
//! The provider is a black box that accepts a prompt and returns raw text.
//! Transport, credentials, and timeouts belong to implementations
//! (`solace-gen`); the engine only sees this trait and treats every error
//! the same way: fall back to a lower search tier.

use std::future::Future;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("provider request failed: {0}")]
  Request(String),

  #[error("provider timed out")]
  Timeout,
}

/// Abstraction over an external text-generation service.
pub trait GenerationProvider: Send + Sync {
  /// Run `prompt` and return the provider's raw text output.
  fn generate<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String, ProviderError>> + Send + 'a;
}
