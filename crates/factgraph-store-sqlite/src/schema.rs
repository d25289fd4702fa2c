//! SQL schema for the factgraph SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS fact_types (
    type_id TEXT PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS organizations (
    organization_id TEXT PRIMARY KEY,
    name            TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS sources (
    source_id TEXT PRIMARY KEY,
    name      TEXT NOT NULL UNIQUE
);

-- Facts are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS facts (
    fact_id            TEXT PRIMARY KEY,
    type_id            TEXT NOT NULL,
    value              TEXT NOT NULL,
    organization_id    TEXT NOT NULL,
    source_id          TEXT NOT NULL,
    access_mode        TEXT NOT NULL,   -- 'Public' | 'RoleBased' | 'Explicit'
    bindings           TEXT NOT NULL DEFAULT '[]',   -- JSON array of FactBinding
    in_reference_to_id TEXT REFERENCES facts(fact_id),
    recorded_at        TEXT NOT NULL,   -- ISO 8601 UTC
    last_seen_at       TEXT NOT NULL
);

-- Lookup from an object to every fact bound to it.
CREATE TABLE IF NOT EXISTS object_fact_bindings (
    object_id TEXT NOT NULL,
    fact_id   TEXT NOT NULL REFERENCES facts(fact_id),
    direction TEXT NOT NULL,
    PRIMARY KEY (object_id, fact_id)
);

CREATE TABLE IF NOT EXISTS fact_acl (
    entry_id    TEXT PRIMARY KEY,
    fact_id     TEXT NOT NULL REFERENCES facts(fact_id),
    subject_id  TEXT NOT NULL,
    source_id   TEXT NOT NULL,
    recorded_at TEXT NOT NULL,
    UNIQUE (fact_id, subject_id)
);

CREATE TABLE IF NOT EXISTS fact_comments (
    comment_id  TEXT PRIMARY KEY,
    fact_id     TEXT NOT NULL REFERENCES facts(fact_id),
    source_id   TEXT NOT NULL,
    comment     TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

-- Derived search index; one JSON FactDocument per fact.
CREATE TABLE IF NOT EXISTS fact_documents (
    fact_id   TEXT PRIMARY KEY,
    retracted INTEGER NOT NULL DEFAULT 0,
    document  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS facts_reference_idx ON facts(in_reference_to_id);
CREATE INDEX IF NOT EXISTS fact_acl_fact_idx   ON fact_acl(fact_id);
CREATE INDEX IF NOT EXISTS comments_fact_idx   ON fact_comments(fact_id);

PRAGMA user_version = 1;
";
