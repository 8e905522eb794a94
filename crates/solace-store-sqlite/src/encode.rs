//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. The variant map is stored as compact JSON. UUIDs are
//! stored as hyphenated lowercase strings.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use solace_core::{
  quote::{Category, Language, Provenance, Quote, QuoteVariant},
  session::StoredSession,
  store::{DailySelection, Favorite},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_day(day: NaiveDate) -> String { day.format("%Y-%m-%d").to_string() }

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str {
  match c {
    Category::Scripture => "scripture",
    Category::Quote => "quote",
    Category::Saying => "saying",
    Category::Poem => "poem",
  }
}

pub fn decode_category(s: &str) -> Result<Category> {
  match s {
    "scripture" => Ok(Category::Scripture),
    "quote" => Ok(Category::Quote),
    "saying" => Ok(Category::Saying),
    "poem" => Ok(Category::Poem),
    other => Err(Error::Decode(format!("unknown category: {other:?}"))),
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

pub fn encode_provenance(p: Provenance) -> &'static str {
  match p {
    Provenance::Static => "static",
    Provenance::Generated => "generated",
  }
}

pub fn decode_provenance(s: &str) -> Result<Provenance> {
  match s {
    "static" => Ok(Provenance::Static),
    "generated" => Ok(Provenance::Generated),
    other => Err(Error::Decode(format!("unknown provenance: {other:?}"))),
  }
}

// ─── Variants ────────────────────────────────────────────────────────────────

pub fn encode_variants(
  variants: &BTreeMap<Language, QuoteVariant>,
) -> Result<String> {
  Ok(serde_json::to_string(variants)?)
}

pub fn decode_variants(s: &str) -> Result<BTreeMap<Language, QuoteVariant>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `quotes` row.
pub struct RawQuote {
  pub quote_id:          String,
  pub author:            Option<String>,
  pub reference:         Option<String>,
  pub category:          String,
  pub origin_language:   String,
  pub premium:           bool,
  pub provenance:        String,
  pub generation_prompt: Option<String>,
  pub created_at:        String,
  pub variants:          String,
}

impl RawQuote {
  pub fn into_quote(self) -> Result<Quote> {
    Ok(Quote {
      quote_id:          decode_uuid(&self.quote_id)?,
      author:            self.author,
      reference:         self.reference,
      category:          decode_category(&self.category)?,
      origin_language:   Language::new(&self.origin_language),
      premium:           self.premium,
      provenance:        decode_provenance(&self.provenance)?,
      generation_prompt: self.generation_prompt,
      created_at:        decode_dt(&self.created_at)?,
      variants:          decode_variants(&self.variants)?,
    })
  }
}

/// Raw strings read directly from a `daily_selections` row.
pub struct RawDailySelection {
  pub day:         String,
  pub language:    String,
  pub quote_id:    String,
  pub selected_at: String,
}

impl RawDailySelection {
  pub fn into_selection(self) -> Result<DailySelection> {
    Ok(DailySelection {
      day:         decode_day(&self.day)?,
      language:    Language::new(&self.language),
      quote_id:    decode_uuid(&self.quote_id)?,
      selected_at: decode_dt(&self.selected_at)?,
    })
  }
}

/// Raw strings read directly from a `favorites` row.
pub struct RawFavorite {
  pub user_id:    String,
  pub quote_id:   String,
  pub created_at: String,
}

impl RawFavorite {
  pub fn into_favorite(self) -> Result<Favorite> {
    Ok(Favorite {
      user_id:    self.user_id,
      quote_id:   decode_uuid(&self.quote_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub user_id:    String,
  pub token:      String,
  pub expires_at: String,
  pub premium:    bool,
}

impl RawSession {
  pub fn into_session(self) -> Result<StoredSession> {
    Ok(StoredSession {
      user_id:    self.user_id,
      token:      self.token,
      expires_at: decode_dt(&self.expires_at)?,
      premium:    self.premium,
    })
  }
}
