//! SQL migration definitions for the tracker database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: ai_tools with url identity",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version   INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Discovered tools; one row per distinct url
CREATE TABLE IF NOT EXISTS ai_tools (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL DEFAULT '',
    url             TEXT NOT NULL UNIQUE,
    source          TEXT NOT NULL,
    summary         TEXT,
    use_cases_json  TEXT NOT NULL DEFAULT '[]',
    category        TEXT,
    pricing         TEXT,
    hype_score      INTEGER,
    stars           INTEGER,
    today_stars     INTEGER,
    likes           INTEGER,
    downloads       INTEGER,
    upvotes         INTEGER,
    tags_json       TEXT NOT NULL DEFAULT '[]',
    pipeline_tag    TEXT,
    sdk             TEXT,
    discovered_date TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ai_tools_name ON ai_tools(name);
CREATE INDEX IF NOT EXISTS idx_ai_tools_category ON ai_tools(category);
CREATE INDEX IF NOT EXISTS idx_ai_tools_discovered ON ai_tools(discovered_date);
CREATE INDEX IF NOT EXISTS idx_ai_tools_hype ON ai_tools(hype_score);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}
