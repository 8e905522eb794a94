//! Tiered search resolution.
//!
//! Tiers are attempted in order and the first one with a result for the
//! current page wins: direct substring match, synonym-expanded match,
//! then AI generation. The AI tier is reachable only for authenticated
//! premium callers within their daily budget, and its accepted output is
//! persisted so repeat queries resolve in the cheap tiers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use solace_core::{
  clock::Clock,
  provider::GenerationProvider,
  quote::{Category, Language, NewQuote, Provenance, Quote},
  store::{QuoteStore, SessionStore},
};
use uuid::Uuid;

use crate::{
  auth::SessionGate,
  rate::{RateLimiter, RateStatus},
  recover::{self, GeneratedQuote},
  synonyms::SynonymTable,
  EngineConfig, Error, Result,
};

// ─── Request/response types ──────────────────────────────────────────────────

/// An authenticated caller's credentials, passed through to the gate.
#[derive(Debug, Clone)]
pub struct Caller {
  pub user_id: String,
  pub token:   String,
}

/// Which tier produced the result. `Insufficient` means every tier came
/// up empty and the client should fall back to its local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
  Local,
  Synonym,
  Ai,
  Insufficient,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
  pub quotes:     Vec<Quote>,
  pub source:     SearchSource,
  /// Present whenever the AI tier's budget was consulted.
  pub rate_limit: Option<RateStatus>,
}

impl SearchOutcome {
  fn insufficient(rate_limit: Option<RateStatus>) -> Self {
    Self { quotes: vec![], source: SearchSource::Insufficient, rate_limit }
  }
}

// ─── Query helpers ───────────────────────────────────────────────────────────

fn normalize(query: &str) -> String { query.trim().to_lowercase() }

fn tokenize(normalized: &str) -> Vec<String> {
  normalized
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Everything searchable about a quote, lowercased: author, reference,
/// and the five translatable fields of every language variant.
fn haystack(quote: &Quote) -> String {
  let mut parts: Vec<&str> = Vec::new();
  parts.extend(quote.author.as_deref());
  parts.extend(quote.reference.as_deref());
  for variant in quote.variants.values() {
    parts.push(&variant.text);
    parts.extend(variant.context.as_deref());
    parts.extend(variant.explanation.as_deref());
    parts.extend(variant.situations.iter().map(String::as_str));
    parts.extend(variant.tags.iter().map(String::as_str));
  }
  parts.join("\n").to_lowercase()
}

// ─── Resolver ────────────────────────────────────────────────────────────────

pub struct SearchResolver<S, P> {
  store:              S,
  gate:               SessionGate<S>,
  limiter:            RateLimiter<S>,
  provider:           P,
  synonyms:           SynonymTable,
  clock:              Arc<dyn Clock>,
  pivot:              Language,
  page_size:          usize,
  generation_timeout: Duration,
}

impl<S, P> SearchResolver<S, P>
where
  S: QuoteStore + SessionStore + Clone,
  P: GenerationProvider,
{
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    store: S,
    gate: SessionGate<S>,
    limiter: RateLimiter<S>,
    provider: P,
    synonyms: SynonymTable,
    clock: Arc<dyn Clock>,
    config: &EngineConfig,
  ) -> Self {
    Self {
      store,
      gate,
      limiter,
      provider,
      synonyms,
      clock,
      pivot: config.pivot_language.clone(),
      page_size: config.page_size,
      generation_timeout: Duration::from_secs(config.generation_timeout_secs),
    }
  }

  /// Resolve `query` for `language`. `exclude` carries the ids already
  /// delivered to this client, advancing the page window on load-more
  /// calls.
  pub async fn search(
    &self,
    query: &str,
    language: &Language,
    caller: Option<&Caller>,
    exclude: &[Uuid],
  ) -> Result<SearchOutcome> {
    let needle = normalize(query);
    if needle.is_empty() {
      return Ok(SearchOutcome::insufficient(None));
    }

    let corpus = self.store.list_quotes().await.map_err(Error::store)?;

    // Tier 1: direct substring match across all language variants.
    let direct: Vec<&Quote> = corpus
      .iter()
      .filter(|q| haystack(q).contains(&needle))
      .collect();
    let page = self.page(direct, exclude);
    if !page.is_empty() {
      return Ok(SearchOutcome {
        quotes:     page,
        source:     SearchSource::Local,
        rate_limit: None,
      });
    }

    // Tier 2: synonym-group expansion catches paraphrase.
    let terms = self.synonyms.expand(&tokenize(&needle));
    if !terms.is_empty() {
      let expanded: Vec<&Quote> = corpus
        .iter()
        .filter(|q| {
          let hay = haystack(q);
          terms.iter().any(|term| hay.contains(term.as_str()))
        })
        .collect();
      let page = self.page(expanded, exclude);
      if !page.is_empty() {
        return Ok(SearchOutcome {
          quotes:     page,
          source:     SearchSource::Synonym,
          rate_limit: None,
        });
      }
    }

    // Tier 3: generation, for authenticated premium callers in budget.
    self.ai_fallback(query, language, caller).await
  }

  async fn ai_fallback(
    &self,
    query: &str,
    language: &Language,
    caller: Option<&Caller>,
  ) -> Result<SearchOutcome> {
    let Some(caller) = caller else {
      return Ok(SearchOutcome::insufficient(None));
    };

    // A presented-but-invalid token is an authorization failure the
    // caller must hear about; a missing token just skips the tier.
    let claims = self
      .gate
      .authorize(&caller.user_id, Some(&caller.token))
      .await?;
    if !claims.premium {
      return Ok(SearchOutcome::insufficient(None));
    }

    let decision = self
      .limiter
      .check_and_consume(&caller.user_id, self.clock.today())
      .await?;
    if !decision.allowed {
      return Ok(SearchOutcome::insufficient(Some(decision.status)));
    }

    let mut languages = vec![language.clone()];
    if *language != self.pivot {
      languages.push(self.pivot.clone());
    }
    let prompt = build_prompt(query, &languages);

    let generated = match self.generate(&prompt, &languages).await {
      Ok(generated) => generated,
      Err(error) => {
        tracing::warn!(%error, "generation tier failed; degrading");
        return Ok(SearchOutcome::insufficient(Some(decision.status)));
      }
    };

    let quote = self
      .store
      .insert_quote(NewQuote {
        author:            generated.author,
        reference:         None,
        category:          generated.category,
        origin_language:   language.clone(),
        premium:           false,
        provenance:        Provenance::Generated,
        generation_prompt: Some(prompt),
        variants:          generated.variants,
      })
      .await
      .map_err(Error::store)?;

    Ok(SearchOutcome {
      quotes:     vec![quote],
      source:     SearchSource::Ai,
      rate_limit: Some(decision.status),
    })
  }

  async fn generate(
    &self,
    prompt: &str,
    languages: &[Language],
  ) -> Result<GeneratedQuote> {
    let raw = match tokio::time::timeout(
      self.generation_timeout,
      self.provider.generate(prompt),
    )
    .await
    {
      Ok(Ok(raw)) => raw,
      Ok(Err(e)) => return Err(Error::GenerationFailed(e.to_string())),
      Err(_) => return Err(Error::GenerationFailed("provider timed out".into())),
    };

    recover::parse_generated(&raw, languages)
      .map_err(|e| Error::GenerationFailed(e.to_string()))
  }

  /// Order a tier's matches and cut the next page: one representative per
  /// category first (scripture, quote, saying, poem), then the rest,
  /// collapsed by text prefix, minus everything already delivered.
  fn page(&self, matches: Vec<&Quote>, exclude: &[Uuid]) -> Vec<Quote> {
    let mut seen = HashSet::new();
    let deduped: Vec<&Quote> = matches
      .into_iter()
      .filter(|q| seen.insert(q.dedup_key()))
      .collect();

    let mut taken = vec![false; deduped.len()];
    let mut ordered: Vec<&Quote> = Vec::with_capacity(deduped.len());
    for category in Category::ALL {
      if let Some(i) = deduped.iter().position(|q| q.category == category) {
        taken[i] = true;
        ordered.push(deduped[i]);
      }
    }
    for (i, quote) in deduped.iter().enumerate() {
      if !taken[i] {
        ordered.push(*quote);
      }
    }

    ordered
      .into_iter()
      .filter(|q| !exclude.contains(&q.quote_id))
      .take(self.page_size)
      .cloned()
      .collect()
  }
}

fn build_prompt(query: &str, languages: &[Language]) -> String {
  let codes = languages
    .iter()
    .map(|l| format!("\"{l}\""))
    .collect::<Vec<_>>()
    .join(" and ");

  format!(
    "Respond with a single JSON object and nothing else. Top-level keys: \
     \"author\" (string or null), \"category\" (one of \"scripture\", \
     \"quote\", \"saying\", \"poem\"), and one object per language code \
     {codes}. Each language object must contain the string fields \
     \"text\", \"context\" and \"explanation\", plus the string arrays \
     \"situations\" and \"tags\". Write an uplifting, comforting quote \
     for someone describing: {query}"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokenize_splits_on_punctuation() {
    assert_eq!(
      tokenize("i feel so alone, truly!"),
      vec!["i", "feel", "so", "alone", "truly"]
    );
  }

  #[test]
  fn normalize_lowercases_and_trims() {
    assert_eq!(normalize("  Heart BREAK  "), "heart break");
  }

  #[test]
  fn prompt_names_both_languages() {
    let prompt =
      build_prompt("loss", &[Language::new("de"), Language::new("en")]);
    assert!(prompt.contains("\"de\" and \"en\""));
    assert!(prompt.contains("loss"));
  }
}
