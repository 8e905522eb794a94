//! [`SqliteStore`] — the SQLite implementation of [`QuoteStore`] and
//! [`SessionStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use solace_core::{
  quote::{Language, NewQuote, Quote},
  session::StoredSession,
  store::{
    DailySelection, Favorite, HistoryEntry, InsertOutcome, QuoteStore,
    RateConsume, SessionStore,
  },
};

use crate::{
  encode::{
    encode_category, encode_day, encode_dt, encode_provenance, encode_uuid,
    encode_variants, RawDailySelection, RawFavorite, RawQuote, RawSession,
  },
  schema::SCHEMA,
  Error, Result,
};

const QUOTE_COLUMNS: &str = "quote_id, author, reference, category, \
   origin_language, premium, provenance, generation_prompt, created_at, \
   variants";

fn raw_quote_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawQuote> {
  Ok(RawQuote {
    quote_id:          row.get(0)?,
    author:            row.get(1)?,
    reference:         row.get(2)?,
    category:          row.get(3)?,
    origin_language:   row.get(4)?,
    premium:           row.get(5)?,
    provenance:        row.get(6)?,
    generation_prompt: row.get(7)?,
    created_at:        row.get(8)?,
    variants:          row.get(9)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Solace quote store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── QuoteStore impl ─────────────────────────────────────────────────────────

impl QuoteStore for SqliteStore {
  type Error = Error;

  // ── Quotes ────────────────────────────────────────────────────────────────

  async fn insert_quote(&self, input: NewQuote) -> Result<Quote> {
    input.validate()?;

    let quote = Quote {
      quote_id:          Uuid::new_v4(),
      author:            input.author,
      reference:         input.reference,
      category:          input.category,
      origin_language:   input.origin_language,
      premium:           input.premium,
      provenance:        input.provenance,
      generation_prompt: input.generation_prompt,
      created_at:        Utc::now(),
      variants:          input.variants,
    };

    let id_str         = encode_uuid(quote.quote_id);
    let author         = quote.author.clone();
    let reference      = quote.reference.clone();
    let category_str   = encode_category(quote.category).to_owned();
    let language_str   = quote.origin_language.as_str().to_owned();
    let premium        = quote.premium;
    let provenance_str = encode_provenance(quote.provenance).to_owned();
    let prompt         = quote.generation_prompt.clone();
    let created_str    = encode_dt(quote.created_at);
    let variants_str   = encode_variants(&quote.variants)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quotes (
             quote_id, author, reference, category, origin_language,
             premium, provenance, generation_prompt, created_at, variants
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            author,
            reference,
            category_str,
            language_str,
            premium,
            provenance_str,
            prompt,
            created_str,
            variants_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(quote)
  }

  async fn get_quote(&self, id: Uuid) -> Result<Option<Quote>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawQuote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE quote_id = ?1"),
            rusqlite::params![id_str],
            raw_quote_from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawQuote::into_quote).transpose()
  }

  async fn list_quotes(&self) -> Result<Vec<Quote>> {
    let raws: Vec<RawQuote> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {QUOTE_COLUMNS} FROM quotes"))?;
        let rows = stmt
          .query_map([], raw_quote_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuote::into_quote).collect()
  }

  async fn quotes_in_languages(
    &self,
    languages: &[Language],
  ) -> Result<Vec<Quote>> {
    if languages.is_empty() {
      return Ok(vec![]);
    }

    let langs: Vec<String> =
      languages.iter().map(|l| l.as_str().to_owned()).collect();

    let raws: Vec<RawQuote> = self
      .conn
      .call(move |conn| {
        let placeholders = (1..=langs.len())
          .map(|i| format!("?{i}"))
          .collect::<Vec<_>>()
          .join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUOTE_COLUMNS} FROM quotes
           WHERE origin_language IN ({placeholders})"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(langs.iter()), raw_quote_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuote::into_quote).collect()
  }

  // ── Daily selections ──────────────────────────────────────────────────────

  async fn daily_selection(
    &self,
    day: NaiveDate,
    language: &Language,
  ) -> Result<Option<DailySelection>> {
    let day_str  = encode_day(day);
    let lang_str = language.as_str().to_owned();

    let raw: Option<RawDailySelection> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT day, language, quote_id, selected_at
             FROM daily_selections WHERE day = ?1 AND language = ?2",
            rusqlite::params![day_str, lang_str],
            |row| {
              Ok(RawDailySelection {
                day:         row.get(0)?,
                language:    row.get(1)?,
                quote_id:    row.get(2)?,
                selected_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDailySelection::into_selection).transpose()
  }

  async fn insert_daily_selection_if_absent(
    &self,
    selection: DailySelection,
  ) -> Result<InsertOutcome<DailySelection>> {
    let day_str   = encode_day(selection.day);
    let lang_str  = selection.language.as_str().to_owned();
    let quote_str = encode_uuid(selection.quote_id);
    let at_str    = encode_dt(selection.selected_at);

    // Insert and read back in one connection call; the read returns the
    // winning row whether or not this caller inserted it.
    let (inserted, raw) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO daily_selections
             (day, language, quote_id, selected_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![day_str, lang_str, quote_str, at_str],
        )?;
        let inserted = conn.changes() == 1;

        let raw = conn.query_row(
          "SELECT day, language, quote_id, selected_at
           FROM daily_selections WHERE day = ?1 AND language = ?2",
          rusqlite::params![day_str, lang_str],
          |row| {
            Ok(RawDailySelection {
              day:         row.get(0)?,
              language:    row.get(1)?,
              quote_id:    row.get(2)?,
              selected_at: row.get(3)?,
            })
          },
        )?;

        Ok((inserted, raw))
      })
      .await?;

    let winner = raw.into_selection()?;
    Ok(if inserted {
      InsertOutcome::Inserted(winner)
    } else {
      InsertOutcome::AlreadyPresent(winner)
    })
  }

  async fn recent_daily_quote_ids(
    &self,
    language: &Language,
    since: NaiveDate,
  ) -> Result<Vec<Uuid>> {
    let lang_str  = language.as_str().to_owned();
    let since_str = encode_day(since);

    let id_strs: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT quote_id FROM daily_selections
           WHERE language = ?1 AND day >= ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![lang_str, since_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    id_strs
      .iter()
      .map(|s| Uuid::parse_str(s).map_err(Error::Uuid))
      .collect()
  }

  // ── Favorites ─────────────────────────────────────────────────────────────

  async fn add_favorite_if_absent(
    &self,
    favorite: Favorite,
  ) -> Result<InsertOutcome<Favorite>> {
    let user_str  = favorite.user_id.clone();
    let quote_str = encode_uuid(favorite.quote_id);
    let at_str    = encode_dt(favorite.created_at);

    let (inserted, raw) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO favorites (user_id, quote_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_str, quote_str, at_str],
        )?;
        let inserted = conn.changes() == 1;

        let raw = conn.query_row(
          "SELECT user_id, quote_id, created_at
           FROM favorites WHERE user_id = ?1 AND quote_id = ?2",
          rusqlite::params![user_str, quote_str],
          |row| {
            Ok(RawFavorite {
              user_id:    row.get(0)?,
              quote_id:   row.get(1)?,
              created_at: row.get(2)?,
            })
          },
        )?;

        Ok((inserted, raw))
      })
      .await?;

    let winner = raw.into_favorite()?;
    Ok(if inserted {
      InsertOutcome::Inserted(winner)
    } else {
      InsertOutcome::AlreadyPresent(winner)
    })
  }

  async fn remove_favorite(
    &self,
    user_id: &str,
    quote_id: Uuid,
  ) -> Result<bool> {
    let user_str  = user_id.to_owned();
    let quote_str = encode_uuid(quote_id);

    let removed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM favorites WHERE user_id = ?1 AND quote_id = ?2",
          rusqlite::params![user_str, quote_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(removed)
  }

  async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
    let user_str = user_id.to_owned();

    let raws: Vec<RawFavorite> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, quote_id, created_at FROM favorites
           WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawFavorite {
              user_id:    row.get(0)?,
              quote_id:   row.get(1)?,
              created_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFavorite::into_favorite).collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn record_history_if_absent(
    &self,
    entry: HistoryEntry,
  ) -> Result<InsertOutcome<HistoryEntry>> {
    let user_str  = entry.user_id.clone();
    let quote_str = encode_uuid(entry.quote_id);
    let day_str   = encode_day(entry.day);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO quote_history (user_id, quote_id, day)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_str, quote_str, day_str],
        )?;
        Ok(conn.changes() == 1)
      })
      .await?;

    Ok(if inserted {
      InsertOutcome::Inserted(entry)
    } else {
      InsertOutcome::AlreadyPresent(entry)
    })
  }

  // ── Rate counters ─────────────────────────────────────────────────────────

  async fn consume_rate_budget(
    &self,
    user_id: &str,
    day: NaiveDate,
    max: u32,
  ) -> Result<RateConsume> {
    let user_str = user_id.to_owned();
    let day_str  = encode_day(day);

    // The conditional upsert is a single statement: check and increment
    // cannot interleave with another caller's.
    let consume = self
      .conn
      .call(move |conn| {
        let consumed: Option<u32> = conn
          .query_row(
            "INSERT INTO rate_counters (user_id, day, count)
             VALUES (?1, ?2, 1)
             ON CONFLICT (user_id, day) DO UPDATE SET count = count + 1
               WHERE rate_counters.count < ?3
             RETURNING count",
            rusqlite::params![user_str, day_str, max],
            |row| row.get(0),
          )
          .optional()?;

        match consumed {
          Some(used) => Ok(RateConsume { allowed: true, used }),
          None => {
            // Denied: read the counter back for reporting only.
            let used: u32 = conn
              .query_row(
                "SELECT count FROM rate_counters
                 WHERE user_id = ?1 AND day = ?2",
                rusqlite::params![user_str, day_str],
                |row| row.get(0),
              )
              .optional()?
              .unwrap_or(0);
            Ok(RateConsume { allowed: false, used })
          }
        }
      })
      .await?;

    Ok(consume)
  }

  async fn rate_used(&self, user_id: &str, day: NaiveDate) -> Result<u32> {
    let user_str = user_id.to_owned();
    let day_str  = encode_day(day);

    let used = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT count FROM rate_counters
               WHERE user_id = ?1 AND day = ?2",
              rusqlite::params![user_str, day_str],
              |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0),
        )
      })
      .await?;

    Ok(used)
  }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  type Error = Error;

  async fn session(&self, user_id: &str) -> Result<Option<StoredSession>> {
    let user_str = user_id.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, token, expires_at, premium
             FROM sessions WHERE user_id = ?1",
            rusqlite::params![user_str],
            |row| {
              Ok(RawSession {
                user_id:    row.get(0)?,
                token:      row.get(1)?,
                expires_at: row.get(2)?,
                premium:    row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn put_session(&self, session: StoredSession) -> Result<()> {
    let user_str    = session.user_id;
    let token       = session.token;
    let expires_str = encode_dt(session.expires_at);
    let premium     = session.premium;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO sessions (user_id, token, expires_at, premium)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_str, token, expires_str, premium],
        )?;
        Ok(())
      })
      .await?;

    Ok(())
  }
}
