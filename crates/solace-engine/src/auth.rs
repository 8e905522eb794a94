//! The session gate — the single authorisation check for per-user
//! mutations.
//!
//! A bare user id is never sufficient proof of identity; every mutation
//! presents the caller's session token and passes through
//! [`SessionGate::authorize`] first.

use std::sync::Arc;

use chrono::Duration;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use solace_core::{
  clock::Clock,
  session::{SessionClaims, StoredSession},
  store::SessionStore,
};

use crate::{Error, Result};

/// Compare a stored and a presented token in time independent of where
/// they differ and of their lengths.
///
/// Both sides are hashed to fixed-width digests first and the digests
/// compared with a branch-free fold, so there is no early exit on the
/// first differing byte and no length fast-path.
pub fn tokens_match(stored: &str, presented: &str) -> bool {
  let a = Sha256::digest(stored.as_bytes());
  let b = Sha256::digest(presented.as_bytes());
  a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Validates presented session tokens against the session authority's
/// stored records.
#[derive(Clone)]
pub struct SessionGate<S> {
  sessions: S,
  clock:    Arc<dyn Clock>,
}

impl<S> SessionGate<S>
where
  S: SessionStore,
{
  pub fn new(sessions: S, clock: Arc<dyn Clock>) -> Self {
    Self { sessions, clock }
  }

  /// Authorise `user_id` by its presented token.
  ///
  /// An absent presented token compares as the empty string rather than
  /// short-circuiting; an absent stored session never matches; expired
  /// sessions are rejected after the comparison.
  pub async fn authorize(
    &self,
    user_id: &str,
    presented: Option<&str>,
  ) -> Result<SessionClaims> {
    let stored = self
      .sessions
      .session(user_id)
      .await
      .map_err(Error::store)?;

    let stored_token = stored.as_ref().map(|s| s.token.as_str()).unwrap_or("");
    let matched = tokens_match(stored_token, presented.unwrap_or(""));

    let session = match stored {
      Some(s) if matched => s,
      _ => return Err(Error::Unauthorized),
    };

    if session.expires_at <= self.clock.now() {
      return Err(Error::Unauthorized);
    }

    Ok(SessionClaims {
      user_id: session.user_id,
      premium: session.premium,
    })
  }

  /// Mint, persist, and return a fresh session token for `user_id`.
  ///
  /// Operator helper; the production session authority issues tokens
  /// through its own flow.
  pub async fn issue(
    &self,
    user_id: &str,
    premium: bool,
    ttl: Duration,
  ) -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    self
      .sessions
      .put_session(StoredSession {
        user_id:    user_id.to_owned(),
        token:      token.clone(),
        expires_at: self.clock.now() + ttl,
        premium,
      })
      .await
      .map_err(Error::store)?;

    Ok(token)
  }
}
