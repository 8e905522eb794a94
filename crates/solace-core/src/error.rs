//! Error types for `solace-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::quote::Language;

#[derive(Debug, Error)]
pub enum Error {
  #[error("quote has no variant for its origin language {0}")]
  MissingOriginVariant(Language),

  #[error("quote variant for {0} has empty text")]
  EmptyVariantText(Language),

  #[error("quote not found: {0}")]
  QuoteNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
