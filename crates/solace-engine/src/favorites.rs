//! Per-user favorites, gated by the session authority.

use std::sync::Arc;

use serde::Serialize;
use solace_core::{
  clock::Clock,
  quote::Quote,
  store::{Favorite, QuoteStore, SessionStore},
};
use uuid::Uuid;

use crate::{auth::SessionGate, Error, Result};

/// Result of an add call; adding an existing favorite is success, not an
/// error.
#[derive(Debug, Clone, Copy)]
pub struct FavoriteAdded {
  pub already_favorited: bool,
}

/// A favorite joined with its quote.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteQuote {
  pub quote:        Quote,
  pub favorited_at: chrono::DateTime<chrono::Utc>,
}

pub struct FavoritesManager<S> {
  store: S,
  gate:  SessionGate<S>,
  clock: Arc<dyn Clock>,
}

impl<S> FavoritesManager<S>
where
  S: QuoteStore + SessionStore + Clone,
{
  pub fn new(store: S, gate: SessionGate<S>, clock: Arc<dyn Clock>) -> Self {
    Self { store, gate, clock }
  }

  pub async fn add(
    &self,
    user_id: &str,
    quote_id: Uuid,
    token: Option<&str>,
  ) -> Result<FavoriteAdded> {
    self.gate.authorize(user_id, token).await?;

    self
      .store
      .get_quote(quote_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(quote_id))?;

    let outcome = self
      .store
      .add_favorite_if_absent(Favorite {
        user_id:    user_id.to_owned(),
        quote_id,
        created_at: self.clock.now(),
      })
      .await
      .map_err(Error::store)?;

    Ok(FavoriteAdded { already_favorited: !outcome.was_inserted() })
  }

  /// Removing an absent favorite is a successful no-op.
  pub async fn remove(
    &self,
    user_id: &str,
    quote_id: Uuid,
    token: Option<&str>,
  ) -> Result<()> {
    self.gate.authorize(user_id, token).await?;

    self
      .store
      .remove_favorite(user_id, quote_id)
      .await
      .map_err(Error::store)?;

    Ok(())
  }

  /// The user's favorites joined with their quotes. Ids that no longer
  /// resolve are silently omitted.
  pub async fn list(
    &self,
    user_id: &str,
    token: Option<&str>,
  ) -> Result<Vec<FavoriteQuote>> {
    self.gate.authorize(user_id, token).await?;

    let rows = self
      .store
      .list_favorites(user_id)
      .await
      .map_err(Error::store)?;

    let mut favorites = Vec::with_capacity(rows.len());
    for row in rows {
      if let Some(quote) = self
        .store
        .get_quote(row.quote_id)
        .await
        .map_err(Error::store)?
      {
        favorites.push(FavoriteQuote { quote, favorited_at: row.created_at });
      }
    }
    Ok(favorites)
  }
}
