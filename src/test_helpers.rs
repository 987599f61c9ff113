//! Shared test utilities — in-memory DB setup and scenario builders.
//!
//! Available only under `#[cfg(test)]`.

use rusqlite::Connection;

use crate::config::RetrievalConfig;
use crate::scenario::NewScenario;
use crate::service::RetrievalService;
use crate::storage::{database, migrations};

/// In-memory store with pragmas and migrations applied.
pub fn setup_db() -> Connection {
    let conn = database::open_in_memory().unwrap();
    migrations::migrate(&conn).unwrap();
    conn
}

/// In-memory store WITHOUT foreign key enforcement.
/// Use for tests that need to plant orphan keyterms.
pub fn setup_db_no_fk() -> Connection {
    let conn = setup_db();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn
}

/// Service over a fresh in-memory store with default config.
pub fn setup_service() -> RetrievalService {
    RetrievalService::new(setup_db(), RetrievalConfig::default())
}

// ============================================================================
// ScenarioBuilder
// ============================================================================

pub struct ScenarioBuilder {
    scenario: NewScenario,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            scenario: NewScenario {
                user_query: "How do I enable WAL mode in SQLite?".to_string(),
                initial_response: "Set journal_mode=DELETE.".to_string(),
                error_context: "DELETE is the default rollback journal, not WAL.".to_string(),
                corrected_solution: "Run PRAGMA journal_mode = WAL; on the connection."
                    .to_string(),
                reasoning: "WAL must be selected explicitly per database file.".to_string(),
                tags: String::new(),
            },
        }
    }

    pub fn query(mut self, q: &str) -> Self {
        self.scenario.user_query = q.to_string();
        self
    }

    pub fn error_context(mut self, e: &str) -> Self {
        self.scenario.error_context = e.to_string();
        self
    }

    pub fn solution(mut self, s: &str) -> Self {
        self.scenario.corrected_solution = s.to_string();
        self
    }

    pub fn tags(mut self, t: &str) -> Self {
        self.scenario.tags = t.to_string();
        self
    }

    pub fn build(self) -> NewScenario {
        self.scenario
    }
}
