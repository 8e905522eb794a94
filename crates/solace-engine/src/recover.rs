//! Recovery parsing for generation-provider output.
//!
//! Providers are asked for strict JSON but routinely wrap it in prose,
//! code fences, or trailing commentary. Recovery is an ordered list of
//! parse strategies tried in sequence; the first one producing a JSON
//! object wins. Schema validation is all-or-nothing: a response missing a
//! required field in either language is rejected outright.

use std::collections::BTreeMap;

use serde_json::Value;
use solace_core::quote::{Category, Language, QuoteVariant};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoverError {
  #[error("no JSON object found in provider output")]
  NoObject,

  #[error("provider output missing language {0}")]
  MissingLanguage(Language),

  #[error("provider output for {lang}: missing or invalid field `{field}`")]
  BadField { lang: Language, field: &'static str },
}

/// A generated quote as extracted from provider output, ready to persist.
#[derive(Debug, Clone)]
pub struct GeneratedQuote {
  pub author:   Option<String>,
  pub category: Category,
  pub variants: BTreeMap<Language, QuoteVariant>,
}

// ─── Parse strategies ────────────────────────────────────────────────────────

type ParseStrategy = fn(&str) -> Option<Value>;

/// Tried in order; later strategies are progressively more forgiving.
const STRATEGIES: [ParseStrategy; 3] =
  [parse_direct, parse_stripped, parse_first_object];

fn as_object(value: Value) -> Option<Value> {
  value.is_object().then_some(value)
}

/// The whole payload is the object.
fn parse_direct(raw: &str) -> Option<Value> {
  serde_json::from_str(raw.trim()).ok().and_then(as_object)
}

/// Drop preamble before the first `{` and postamble after the last `}`.
fn parse_stripped(raw: &str) -> Option<Value> {
  let start = raw.find('{')?;
  let end = raw.rfind('}')?;
  if end < start {
    return None;
  }
  serde_json::from_str(&raw[start..=end]).ok().and_then(as_object)
}

/// Scan for the first balanced object, tracking string literals so braces
/// inside quoted text do not terminate the scan early.
fn parse_first_object(raw: &str) -> Option<Value> {
  let start = raw.find('{')?;
  let bytes = raw.as_bytes();

  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (i, &b) in bytes.iter().enumerate().skip(start) {
    if in_string {
      match b {
        _ if escaped => escaped = false,
        b'\\' => escaped = true,
        b'"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match b {
      b'"' => in_string = true,
      b'{' => depth += 1,
      b'}' => {
        depth -= 1;
        if depth == 0 {
          return serde_json::from_str(&raw[start..=i]).ok().and_then(as_object);
        }
      }
      _ => {}
    }
  }
  None
}

/// Run the strategy ladder over `raw`.
pub fn recover_object(raw: &str) -> Option<Value> {
  STRATEGIES.iter().find_map(|strategy| strategy(raw))
}

// ─── Schema validation ───────────────────────────────────────────────────────

fn required_str(
  obj: &serde_json::Map<String, Value>,
  lang: &Language,
  field: &'static str,
) -> Result<String, RecoverError> {
  obj
    .get(field)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
    .ok_or(RecoverError::BadField { lang: lang.clone(), field })
}

fn required_str_list(
  obj: &serde_json::Map<String, Value>,
  lang: &Language,
  field: &'static str,
) -> Result<Vec<String>, RecoverError> {
  let items = obj
    .get(field)
    .and_then(Value::as_array)
    .ok_or(RecoverError::BadField { lang: lang.clone(), field })?;

  items
    .iter()
    .map(|v| {
      v.as_str()
        .map(str::to_owned)
        .ok_or(RecoverError::BadField { lang: lang.clone(), field })
    })
    .collect()
}

fn variant_for(value: &Value, lang: &Language) -> Result<QuoteVariant, RecoverError> {
  let obj = value
    .as_object()
    .ok_or_else(|| RecoverError::MissingLanguage(lang.clone()))?;

  Ok(QuoteVariant {
    text:        required_str(obj, lang, "text")?,
    context:     Some(required_str(obj, lang, "context")?),
    explanation: Some(required_str(obj, lang, "explanation")?),
    situations:  required_str_list(obj, lang, "situations")?,
    tags:        required_str_list(obj, lang, "tags")?,
  })
}

fn category_from(value: Option<&Value>) -> Category {
  match value.and_then(Value::as_str) {
    Some("scripture") => Category::Scripture,
    Some("saying") => Category::Saying,
    Some("poem") => Category::Poem,
    _ => Category::Quote,
  }
}

/// Recover a JSON object from `raw` and validate it carries a complete
/// variant for every language in `required`.
pub fn parse_generated(
  raw: &str,
  required: &[Language],
) -> Result<GeneratedQuote, RecoverError> {
  let value = recover_object(raw).ok_or(RecoverError::NoObject)?;

  let mut variants = BTreeMap::new();
  for lang in required {
    let entry = value
      .get(lang.as_str())
      .ok_or_else(|| RecoverError::MissingLanguage(lang.clone()))?;
    variants.insert(lang.clone(), variant_for(entry, lang)?);
  }

  let author = value
    .get("author")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned);

  Ok(GeneratedQuote {
    author,
    category: category_from(value.get("category")),
    variants,
  })
}
