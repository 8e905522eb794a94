//! Quote types — the content unit of the Solace store.
//!
//! A quote is immutable once published. All translatable content lives in
//! per-language [`QuoteVariant`]s; a variant is stored whole or not at all,
//! so partially-translated records are unrepresentable.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Length of the lowercased text prefix used to suppress near-duplicate
/// quotes in candidate pools and search results.
pub const DEDUP_PREFIX_CHARS: usize = 50;

// ─── Language ────────────────────────────────────────────────────────────────

/// A lowercase ISO 639-1 language code (`"en"`, `"de"`, ...).
///
/// Stored as plain text; normalised to lowercase on construction so lookups
/// never depend on caller casing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Language(String);

impl<'de> Deserialize<'de> for Language {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    // Normalise on the way in so config files and seed data may use any
    // casing.
    let code = String::deserialize(deserializer)?;
    Ok(Self::new(code))
  }
}

impl Language {
  pub fn new(code: impl AsRef<str>) -> Self {
    Self(code.as_ref().trim().to_lowercase())
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Category ────────────────────────────────────────────────────────────────

/// The literary category of a quote. Doubles as the display-priority order
/// for mixed result lists.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Scripture,
  Quote,
  Saying,
  Poem,
}

impl Category {
  /// Display priority: lower ranks sort first in mixed result lists.
  pub fn rank(self) -> u8 {
    match self {
      Self::Scripture => 0,
      Self::Quote => 1,
      Self::Saying => 2,
      Self::Poem => 3,
    }
  }

  /// All categories in display-priority order.
  pub const ALL: [Category; 4] =
    [Self::Scripture, Self::Quote, Self::Saying, Self::Poem];
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// How a quote entered the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
  /// Part of the curated seed corpus.
  Static,
  /// Produced by the external generation provider for a user query.
  Generated,
}

// ─── Variant ─────────────────────────────────────────────────────────────────

/// The five translatable fields of a quote, always supplied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteVariant {
  pub text:        String,
  pub context:     Option<String>,
  pub explanation: Option<String>,
  /// Ordered list of life situations this quote applies to.
  #[serde(default)]
  pub situations:  Vec<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
}

// ─── Quote ───────────────────────────────────────────────────────────────────

/// An immutable published quote. `author` and `reference` are not
/// translated; everything language-dependent lives in `variants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
  pub quote_id:          Uuid,
  pub author:            Option<String>,
  /// Source reference, e.g. a book and verse for scripture.
  pub reference:         Option<String>,
  pub category:          Category,
  pub origin_language:   Language,
  pub premium:           bool,
  pub provenance:        Provenance,
  /// The prompt that produced a generated quote; absent for seed content.
  pub generation_prompt: Option<String>,
  pub created_at:        DateTime<Utc>,
  /// Language code to variant. Always contains `origin_language`.
  pub variants:          BTreeMap<Language, QuoteVariant>,
}

impl Quote {
  /// The variant in the quote's own origin language.
  ///
  /// `None` only for rows that violate the origin-variant invariant;
  /// callers treat such rows as having no canonical text.
  pub fn origin_variant(&self) -> Option<&QuoteVariant> {
    self.variants.get(&self.origin_language)
  }

  /// Lowercased prefix of the canonical text, used to collapse
  /// near-duplicate entries.
  pub fn dedup_key(&self) -> String {
    let text = self.origin_variant().map(|v| v.text.as_str()).unwrap_or("");
    text.trim().to_lowercase().chars().take(DEDUP_PREFIX_CHARS).collect()
  }
}

// ─── NewQuote ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::QuoteStore::insert_quote`].
/// `quote_id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuote {
  pub author:            Option<String>,
  pub reference:         Option<String>,
  pub category:          Category,
  pub origin_language:   Language,
  #[serde(default)]
  pub premium:           bool,
  pub provenance:        Provenance,
  pub generation_prompt: Option<String>,
  pub variants:          BTreeMap<Language, QuoteVariant>,
}

impl NewQuote {
  /// Check the variant invariants: the origin-language variant exists and
  /// no variant carries empty text.
  pub fn validate(&self) -> Result<()> {
    if !self.variants.contains_key(&self.origin_language) {
      return Err(Error::MissingOriginVariant(self.origin_language.clone()));
    }
    for (lang, variant) in &self.variants {
      if variant.text.trim().is_empty() {
        return Err(Error::EmptyVariantText(lang.clone()));
      }
    }
    Ok(())
  }
}
