//! Session records issued by the session authority.
//!
//! This core never mints sessions during request handling; it only reads
//! them to authorise per-user mutations. The stored token is opaque and
//! high-entropy; comparison rules live in the engine's session gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A session as persisted by the session authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
  pub user_id:    String,
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  /// Premium entitlement of the session's user; gates the AI search tier.
  pub premium:    bool,
}

/// What a successfully authorised caller is allowed to know about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
  pub user_id: String,
  pub premium: bool,
}
