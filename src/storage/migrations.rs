use rusqlite::Connection;

use crate::{HindsightError, HindsightResult};

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Returns the applied schema version (0 if the table is absent).
pub fn get_schema_version(conn: &Connection) -> HindsightResult<u32> {
    let exists: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |r| r.get(0),
        )
        .map_err(|e| HindsightError::Storage(e.to_string()))?;

    if !exists {
        return Ok(0);
    }

    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .map_err(|e| HindsightError::Storage(e.to_string()))?;

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: u32) -> HindsightResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        rusqlite::params![version],
    )
    .map_err(|e| HindsightError::Storage(e.to_string()))?;
    Ok(())
}

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS scenarios (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_query TEXT NOT NULL,
    initial_response TEXT NOT NULL,
    error_context TEXT NOT NULL,
    corrected_solution TEXT NOT NULL,
    reasoning TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scenarios_created_at ON scenarios(created_at);

CREATE TABLE IF NOT EXISTS keyterms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scenario_id INTEGER NOT NULL REFERENCES scenarios(id) ON DELETE CASCADE,
    term TEXT NOT NULL,
    term_type TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_keyterms_scenario ON keyterms(scenario_id);
CREATE INDEX IF NOT EXISTS idx_keyterms_term_type ON keyterms(term_type);

CREATE TABLE IF NOT EXISTS conversations (
    conversation_id TEXT PRIMARY KEY,
    last_query TEXT,
    last_response TEXT,
    state TEXT NOT NULL DEFAULT 'initial',
    updated_at TEXT NOT NULL
);
";

/// Bring the store up to the current schema version. Idempotent.
pub fn migrate(conn: &Connection) -> HindsightResult<()> {
    let version = get_schema_version(conn)?;
    if version >= CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)
            .map_err(|e| HindsightError::Storage(format!("Schema v1 failed: {}", e)))?;
        set_schema_version(conn, 1)?;
        tracing::info!(version = 1, "Schema migration applied");
    }

    Ok(())
}
