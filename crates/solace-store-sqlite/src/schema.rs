//! SQL schema for the Solace SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Quotes are immutable once published. No UPDATE is ever issued.
CREATE TABLE IF NOT EXISTS quotes (
    quote_id          TEXT PRIMARY KEY,
    author            TEXT,
    reference         TEXT,
    category          TEXT NOT NULL,   -- 'scripture' | 'quote' | 'saying' | 'poem'
    origin_language   TEXT NOT NULL,
    premium           INTEGER NOT NULL DEFAULT 0,
    provenance        TEXT NOT NULL,   -- 'static' | 'generated'
    generation_prompt TEXT,
    created_at        TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    variants          TEXT NOT NULL    -- JSON map: language code -> variant
);

-- One row per (day, language). Racing selectors use INSERT OR IGNORE and
-- converge on the winning row; rows accumulate as the anti-repeat window.
CREATE TABLE IF NOT EXISTS daily_selections (
    day         TEXT NOT NULL,         -- ISO calendar date
    language    TEXT NOT NULL,
    quote_id    TEXT NOT NULL REFERENCES quotes(quote_id),
    selected_at TEXT NOT NULL,
    PRIMARY KEY (day, language)
);

CREATE TABLE IF NOT EXISTS favorites (
    user_id    TEXT NOT NULL,
    quote_id   TEXT NOT NULL REFERENCES quotes(quote_id),
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, quote_id)
);

CREATE TABLE IF NOT EXISTS quote_history (
    user_id  TEXT NOT NULL,
    quote_id TEXT NOT NULL REFERENCES quotes(quote_id),
    day      TEXT NOT NULL,
    PRIMARY KEY (user_id, quote_id, day)
);

-- Counters are never decremented; old date keys simply stop being read.
CREATE TABLE IF NOT EXISTS rate_counters (
    user_id TEXT NOT NULL,
    day     TEXT NOT NULL,
    count   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, day)
);

CREATE TABLE IF NOT EXISTS sessions (
    user_id    TEXT PRIMARY KEY,
    token      TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    premium    INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS quotes_language_idx    ON quotes(origin_language);
CREATE INDEX IF NOT EXISTS daily_language_day_idx ON daily_selections(language, day);
CREATE INDEX IF NOT EXISTS favorites_user_idx     ON favorites(user_id);

PRAGMA user_version = 1;
";
