//! Integration tests for the engine against an in-memory SQLite store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use solace_core::{
  clock::{Clock, Sampler},
  provider::{GenerationProvider, ProviderError},
  quote::{Category, Language, NewQuote, Provenance, Quote, QuoteVariant},
  store::QuoteStore as _,
};
use solace_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  auth::SessionGate,
  daily::{DailyLookup, DailySelector},
  favorites::FavoritesManager,
  history::HistoryRecorder,
  rate::RateLimiter,
  search::{Caller, SearchResolver, SearchSource},
  synonyms::{SynonymGroup, SynonymTable},
  EngineConfig, Error,
};

// ─── Test doubles ────────────────────────────────────────────────────────────

struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
  fn at(date: &str) -> Arc<Self> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    Arc::new(Self(Mutex::new(day.and_hms_opt(12, 0, 0).unwrap().and_utc())))
  }

  fn advance_days(&self, days: i64) {
    *self.0.lock().unwrap() += Duration::days(days);
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap() }
}

/// Always picks the first candidate, making selection deterministic.
struct FirstSampler;

impl Sampler for FirstSampler {
  fn pick(&self, _len: usize) -> usize { 0 }
}

struct CannedProvider {
  body:  String,
  calls: Arc<AtomicUsize>,
}

impl GenerationProvider for CannedProvider {
  async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(self.body.clone())
  }
}

struct SlowProvider;

impl GenerationProvider for SlowProvider {
  async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    Ok("{}".into())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn variant(text: &str, tags: &[&str]) -> QuoteVariant {
  QuoteVariant {
    text:        text.into(),
    context:     None,
    explanation: None,
    situations:  vec![],
    tags:        tags.iter().map(|t| t.to_string()).collect(),
  }
}

fn quote_input(
  lang: &str,
  text: &str,
  category: Category,
  tags: &[&str],
) -> NewQuote {
  let mut variants = BTreeMap::new();
  variants.insert(Language::new(lang), variant(text, tags));
  NewQuote {
    author:            None,
    reference:         None,
    category,
    origin_language:   Language::new(lang),
    premium:           false,
    provenance:        Provenance::Static,
    generation_prompt: None,
    variants,
  }
}

async fn seed(
  store: &SqliteStore,
  lang: &str,
  text: &str,
  category: Category,
  tags: &[&str],
) -> Quote {
  store
    .insert_quote(quote_input(lang, text, category, tags))
    .await
    .unwrap()
}

fn selector(store: &SqliteStore, clock: Arc<FixedClock>) -> DailySelector<SqliteStore> {
  DailySelector::new(
    store.clone(),
    clock,
    Arc::new(FirstSampler),
    &EngineConfig::default(),
  )
}

fn resolver<P: GenerationProvider>(
  store: &SqliteStore,
  clock: Arc<FixedClock>,
  provider: P,
  synonyms: SynonymTable,
  config: &EngineConfig,
) -> SearchResolver<SqliteStore, P> {
  SearchResolver::new(
    store.clone(),
    SessionGate::new(store.clone(), clock.clone()),
    RateLimiter::new(store.clone(), config.daily_generation_limit),
    provider,
    synonyms,
    clock,
    config,
  )
}

async fn premium_caller(store: &SqliteStore, clock: Arc<FixedClock>) -> Caller {
  let gate = SessionGate::new(store.clone(), clock);
  let token = gate.issue("user-1", true, Duration::hours(24)).await.unwrap();
  Caller { user_id: "user-1".into(), token }
}

const GENERATED_BODY: &str = r#"{
  "author": null,
  "category": "saying",
  "de": {
    "text": "Auch aus Steinen kann man etwas Schoenes bauen.",
    "context": "Vom Umgang mit Hindernissen.",
    "explanation": "Hindernisse sind Baumaterial.",
    "situations": ["rueckschlag"],
    "tags": ["xyzzy", "mut"]
  },
  "en": {
    "text": "Even from stones one can build something beautiful.",
    "context": "On dealing with obstacles.",
    "explanation": "Obstacles are building material.",
    "situations": ["setback"],
    "tags": ["xyzzy", "courage"]
  }
}"#;

// ─── Daily selection ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_daily_is_idempotent() {
  let s = store().await;
  seed(&s, "en", "First quote text.", Category::Saying, &[]).await;
  seed(&s, "en", "Second quote text.", Category::Saying, &[]).await;

  let clock = FixedClock::at("2024-03-01");
  let sel = selector(&s, clock.clone());
  let lang = Language::new("en");

  let first = sel.ensure_daily_quote(&lang).await.unwrap();
  assert!(!first.already_existed);

  let second = sel.ensure_daily_quote(&lang).await.unwrap();
  assert!(second.already_existed);
  assert_eq!(second.quote.quote_id, first.quote.quote_id);

  match sel.daily_quote(clock.today(), &lang).await.unwrap() {
    DailyLookup::Selected(q) => assert_eq!(q.quote_id, first.quote.quote_id),
    DailyLookup::NeedsSelection => panic!("selection should exist"),
  }
}

#[tokio::test]
async fn ensure_daily_avoids_recent_selections() {
  let s = store().await;
  let a = seed(&s, "en", "Quote alpha text.", Category::Saying, &[]).await;
  let b = seed(&s, "en", "Quote beta text.", Category::Saying, &[]).await;

  let clock = FixedClock::at("2024-03-01");
  let sel = selector(&s, clock.clone());
  let lang = Language::new("en");

  let day1 = sel.ensure_daily_quote(&lang).await.unwrap();
  clock.advance_days(1);
  let day2 = sel.ensure_daily_quote(&lang).await.unwrap();

  assert_ne!(day1.quote.quote_id, day2.quote.quote_id);

  // Both quotes are now inside the window; selection falls back to the
  // full pool instead of serving nothing.
  clock.advance_days(1);
  let day3 = sel.ensure_daily_quote(&lang).await.unwrap();
  assert!(!day3.already_existed);
  assert!([a.quote_id, b.quote_id].contains(&day3.quote.quote_id));
}

#[tokio::test]
async fn ensure_daily_with_empty_corpus_reports_no_content() {
  let s = store().await;
  let sel = selector(&s, FixedClock::at("2024-03-01"));

  let err = sel.ensure_daily_quote(&Language::new("en")).await.unwrap_err();
  assert!(matches!(err, Error::NoContentAvailable));
}

#[tokio::test]
async fn ensure_daily_falls_back_to_pivot_language() {
  let s = store().await;
  let en = seed(&s, "en", "Pivot pool quote.", Category::Saying, &[]).await;

  let sel = selector(&s, FixedClock::at("2024-03-01"));
  let ensured = sel.ensure_daily_quote(&Language::new("de")).await.unwrap();
  assert_eq!(ensured.quote.quote_id, en.quote_id);
}

#[tokio::test]
async fn candidate_pool_collapses_near_duplicates() {
  let s = store().await;
  let long = "This exact opening sentence runs well past fifty characters";
  seed(&s, "en", &format!("{long} variant one."), Category::Saying, &[]).await;
  seed(&s, "en", &format!("{long} variant two."), Category::Saying, &[]).await;

  let clock = FixedClock::at("2024-03-01");
  let sel = selector(&s, clock.clone());
  let lang = Language::new("en");

  let day1 = sel.ensure_daily_quote(&lang).await.unwrap();
  clock.advance_days(1);
  // The deduplicated pool holds a single entry, so exclusion empties it
  // and the fallback serves the same quote again.
  let day2 = sel.ensure_daily_quote(&lang).await.unwrap();
  assert_eq!(day1.quote.quote_id, day2.quote.quote_id);
}

// ─── Session gate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn gate_accepts_valid_token_and_rejects_everything_else() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let gate = SessionGate::new(s.clone(), clock.clone());

  let token = gate.issue("user-1", true, Duration::hours(1)).await.unwrap();

  let claims = gate.authorize("user-1", Some(&token)).await.unwrap();
  assert_eq!(claims.user_id, "user-1");
  assert!(claims.premium);

  // Wrong token, absent token, unknown user.
  assert!(matches!(
    gate.authorize("user-1", Some("deadbeef")).await,
    Err(Error::Unauthorized)
  ));
  assert!(matches!(
    gate.authorize("user-1", None).await,
    Err(Error::Unauthorized)
  ));
  assert!(matches!(
    gate.authorize("user-2", Some(&token)).await,
    Err(Error::Unauthorized)
  ));
}

#[tokio::test]
async fn gate_rejects_expired_sessions() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let gate = SessionGate::new(s.clone(), clock.clone());

  let token = gate.issue("user-1", false, Duration::hours(1)).await.unwrap();
  clock.advance_days(1);

  assert!(matches!(
    gate.authorize("user-1", Some(&token)).await,
    Err(Error::Unauthorized)
  ));
}

// ─── Favorites ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn favorites_roundtrip_is_idempotent() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let quote = seed(&s, "en", "Favorite me.", Category::Saying, &[]).await;

  let gate = SessionGate::new(s.clone(), clock.clone());
  let token = gate.issue("user-1", false, Duration::hours(24)).await.unwrap();
  let favorites = FavoritesManager::new(s.clone(), gate, clock.clone());

  let added = favorites
    .add("user-1", quote.quote_id, Some(&token))
    .await
    .unwrap();
  assert!(!added.already_favorited);

  let again = favorites
    .add("user-1", quote.quote_id, Some(&token))
    .await
    .unwrap();
  assert!(again.already_favorited);

  let listed = favorites.list("user-1", Some(&token)).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].quote.quote_id, quote.quote_id);

  favorites
    .remove("user-1", quote.quote_id, Some(&token))
    .await
    .unwrap();
  // Removing an absent favorite is still success.
  favorites
    .remove("user-1", quote.quote_id, Some(&token))
    .await
    .unwrap();
  assert!(favorites.list("user-1", Some(&token)).await.unwrap().is_empty());
}

#[tokio::test]
async fn favorites_require_authorization() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let quote = seed(&s, "en", "Guarded.", Category::Saying, &[]).await;

  let gate = SessionGate::new(s.clone(), clock.clone());
  let favorites = FavoritesManager::new(s.clone(), gate, clock);

  assert!(matches!(
    favorites.add("user-1", quote.quote_id, Some("bogus")).await,
    Err(Error::Unauthorized)
  ));
  assert!(matches!(
    favorites.add("user-1", quote.quote_id, None).await,
    Err(Error::Unauthorized)
  ));
}

#[tokio::test]
async fn favoriting_unknown_quote_is_not_found() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let gate = SessionGate::new(s.clone(), clock.clone());
  let token = gate.issue("user-1", false, Duration::hours(24)).await.unwrap();
  let favorites = FavoritesManager::new(s.clone(), gate, clock);

  assert!(matches!(
    favorites.add("user-1", Uuid::new_v4(), Some(&token)).await,
    Err(Error::NotFound(_))
  ));
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_absorbs_duplicate_recordings() {
  let s = store().await;
  let quote = seed(&s, "en", "Shown today.", Category::Saying, &[]).await;
  let recorder = HistoryRecorder::new(s.clone());
  let day = NaiveDate::parse_from_str("2024-03-01", "%Y-%m-%d").unwrap();

  let first = recorder
    .record_shown("user-1", quote.quote_id, day)
    .await
    .unwrap();
  assert!(!first.already_recorded);

  let second = recorder
    .record_shown("user-1", quote.quote_id, day)
    .await
    .unwrap();
  assert!(second.already_recorded);

  assert!(matches!(
    recorder.record_shown("user-1", Uuid::new_v4(), day).await,
    Err(Error::NotFound(_))
  ));
}

// ─── Rate limiting ───────────────────────────────────────────────────────────

#[tokio::test]
async fn rate_limiter_allows_exactly_the_budget() {
  let s = store().await;
  let limiter = RateLimiter::new(s.clone(), 10);
  let day = NaiveDate::parse_from_str("2024-03-01", "%Y-%m-%d").unwrap();

  for i in 1..=10u32 {
    let decision = limiter.check_and_consume("user-1", day).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.status.used, i);
    assert_eq!(decision.status.remaining, 10 - i);
  }

  let denied = limiter.check_and_consume("user-1", day).await.unwrap();
  assert!(!denied.allowed);
  assert_eq!(denied.status.remaining, 0);
}

// ─── Search: direct tier ─────────────────────────────────────────────────────

#[tokio::test]
async fn direct_tier_matches_any_language_variant() {
  let s = store().await;

  let mut input = quote_input(
    "en",
    "Even the darkest night will end and the sun will rise.",
    Category::Quote,
    &["hope"],
  );
  input.variants.insert(
    Language::new("de"),
    variant("Auch die dunkelste Nacht endet.", &["hoffnung"]),
  );
  s.insert_quote(input).await.unwrap();

  let clock = FixedClock::at("2024-03-01");
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: String::new(), calls };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );

  // A German query matches the German variant of an English-origin quote.
  let outcome = res
    .search("dunkelste Nacht", &Language::new("en"), None, &[])
    .await
    .unwrap();
  assert_eq!(outcome.source, SearchSource::Local);
  assert_eq!(outcome.quotes.len(), 1);
  assert!(outcome.rate_limit.is_none());
}

#[tokio::test]
async fn search_orders_one_representative_per_category_first() {
  let s = store().await;
  seed(&s, "en", "Light poem about light.", Category::Poem, &[]).await;
  seed(&s, "en", "Light saying about light.", Category::Saying, &[]).await;
  seed(&s, "en", "Light quote about light.", Category::Quote, &[]).await;
  seed(&s, "en", "Light scripture about light.", Category::Scripture, &[]).await;

  let clock = FixedClock::at("2024-03-01");
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: String::new(), calls };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );

  let outcome = res
    .search("light", &Language::new("en"), None, &[])
    .await
    .unwrap();
  let categories: Vec<Category> =
    outcome.quotes.iter().map(|q| q.category).collect();
  assert_eq!(categories, vec![
    Category::Scripture,
    Category::Quote,
    Category::Saying,
  ]);
}

#[tokio::test]
async fn search_pages_never_repeat_excluded_ids() {
  let s = store().await;
  for i in 0..5 {
    seed(
      &s,
      "en",
      &format!("Sunrise meditation number {i} over the valley."),
      Category::Saying,
      &[],
    )
    .await;
  }

  let clock = FixedClock::at("2024-03-01");
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: String::new(), calls };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );
  let lang = Language::new("en");

  let page1 = res.search("sunrise", &lang, None, &[]).await.unwrap();
  assert_eq!(page1.quotes.len(), 3);

  let seen: Vec<Uuid> = page1.quotes.iter().map(|q| q.quote_id).collect();
  let page2 = res.search("sunrise", &lang, None, &seen).await.unwrap();
  assert_eq!(page2.quotes.len(), 2);
  assert!(page2.quotes.iter().all(|q| !seen.contains(&q.quote_id)));
}

// ─── Search: synonym tier ────────────────────────────────────────────────────

#[tokio::test]
async fn synonym_tier_reaches_conceptually_tagged_quotes() {
  let s = store().await;
  let scripture = seed(
    &s,
    "en",
    "Vengeance is mine; I will repay.",
    Category::Scripture,
    &["justice", "law"],
  )
  .await;
  seed(&s, "en", "No one is an island.", Category::Saying, &["loneliness"]).await;

  let table = SynonymTable::new([SynonymGroup {
    name:  "law".into(),
    terms: vec!["revenge".into(), "retribution".into()],
  }]);

  let clock = FixedClock::at("2024-03-01");
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: String::new(), calls };
  let res = resolver(&s, clock, provider, table, &EngineConfig::default());

  let outcome = res
    .search("revenge", &Language::new("en"), None, &[])
    .await
    .unwrap();
  assert_eq!(outcome.source, SearchSource::Synonym);
  assert_eq!(outcome.quotes.len(), 1);
  assert_eq!(outcome.quotes[0].quote_id, scripture.quote_id);
}

// ─── Search: AI tier ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ai_tier_persists_generated_quote_for_reuse() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let caller = premium_caller(&s, clock.clone()).await;

  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider {
    body:  GENERATED_BODY.into(),
    calls: calls.clone(),
  };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );
  let lang = Language::new("de");

  let outcome = res.search("xyzzy", &lang, Some(&caller), &[]).await.unwrap();
  assert_eq!(outcome.source, SearchSource::Ai);
  assert_eq!(outcome.quotes.len(), 1);
  assert_eq!(outcome.quotes[0].provenance, Provenance::Generated);
  assert_eq!(outcome.quotes[0].variants.len(), 2);
  assert_eq!(outcome.rate_limit.unwrap().used, 1);

  // The persisted quote now resolves in the direct tier without another
  // provider call.
  let repeat = res.search("xyzzy", &lang, Some(&caller), &[]).await.unwrap();
  assert_eq!(repeat.source, SearchSource::Local);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn ai_tier_rejects_response_missing_a_language() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let caller = premium_caller(&s, clock.clone()).await;

  let en_only = r#"{"en": {"text": "t", "context": "c",
    "explanation": "e", "situations": [], "tags": []}}"#;
  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: en_only.into(), calls };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );

  let before = s.list_quotes().await.unwrap().len();
  let outcome = res
    .search("hoffnung in dunklen zeiten", &Language::new("de"), Some(&caller), &[])
    .await
    .unwrap();

  // Nothing partial is stored; the response is rejected whole.
  assert_eq!(outcome.source, SearchSource::Insufficient);
  assert!(outcome.quotes.is_empty());
  assert_eq!(s.list_quotes().await.unwrap().len(), before);
  assert_eq!(outcome.rate_limit.unwrap().used, 1);
}

#[tokio::test]
async fn ai_tier_requires_premium_and_does_not_consume_budget() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");

  let gate = SessionGate::new(s.clone(), clock.clone());
  let token = gate.issue("user-1", false, Duration::hours(24)).await.unwrap();
  let caller = Caller { user_id: "user-1".into(), token };

  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider {
    body:  GENERATED_BODY.into(),
    calls: calls.clone(),
  };
  let res = resolver(
    &s,
    clock.clone(),
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );

  let outcome = res
    .search("xyzzy", &Language::new("de"), Some(&caller), &[])
    .await
    .unwrap();
  assert_eq!(outcome.source, SearchSource::Insufficient);
  assert_eq!(calls.load(Ordering::SeqCst), 0);
  assert_eq!(s.rate_used("user-1", clock.today()).await.unwrap(), 0);
}

#[tokio::test]
async fn ai_tier_with_invalid_token_is_unauthorized() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");

  let calls = Arc::new(AtomicUsize::new(0));
  let provider = CannedProvider { body: GENERATED_BODY.into(), calls };
  let res = resolver(
    &s,
    clock,
    provider,
    SynonymTable::default(),
    &EngineConfig::default(),
  );

  let caller = Caller { user_id: "user-1".into(), token: "bogus".into() };
  let err = res
    .search("xyzzy", &Language::new("de"), Some(&caller), &[])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Unauthorized));
}

#[tokio::test]
async fn ai_tier_reports_exhausted_budget() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let caller = premium_caller(&s, clock.clone()).await;

  let config = EngineConfig {
    daily_generation_limit: 2,
    ..EngineConfig::default()
  };
  let calls = Arc::new(AtomicUsize::new(0));
  // Unparsable output: each attempt consumes budget and degrades.
  let provider = CannedProvider {
    body:  "not json at all".into(),
    calls: calls.clone(),
  };
  let res = resolver(&s, clock, provider, SynonymTable::default(), &config);
  let lang = Language::new("de");

  for _ in 0..2 {
    let outcome = res.search("xyzzy", &lang, Some(&caller), &[]).await.unwrap();
    assert_eq!(outcome.source, SearchSource::Insufficient);
  }
  assert_eq!(calls.load(Ordering::SeqCst), 2);

  let denied = res.search("xyzzy", &lang, Some(&caller), &[]).await.unwrap();
  assert_eq!(denied.source, SearchSource::Insufficient);
  let status = denied.rate_limit.unwrap();
  assert_eq!(status.used, 2);
  assert_eq!(status.remaining, 0);
  // The provider is not consulted once the budget is gone.
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ai_tier_times_out_and_degrades() {
  let s = store().await;
  let clock = FixedClock::at("2024-03-01");
  let caller = premium_caller(&s, clock.clone()).await;

  let config = EngineConfig {
    generation_timeout_secs: 0,
    ..EngineConfig::default()
  };
  let res = resolver(&s, clock, SlowProvider, SynonymTable::default(), &config);

  let outcome = res
    .search("xyzzy", &Language::new("de"), Some(&caller), &[])
    .await
    .unwrap();
  assert_eq!(outcome.source, SearchSource::Insufficient);
  assert!(outcome.quotes.is_empty());
}
