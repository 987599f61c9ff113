//! Scenario store — scenarios and their derived keyterms, written together
//! in one transaction so neither can exist without the other.

use std::collections::HashSet;

use rusqlite::{params, Connection, Row, Transaction};

use crate::constants::{MIN_TERM_LENGTH, STATS_MONTHS, STATS_TOP_TAGS};
use crate::processing::keyterms;
use crate::scenario::{NewScenario, Scenario, TermType};
use crate::time_utils;
use crate::{HindsightError, HindsightResult};

pub struct ScenarioStore;

// ── Row mapping ──

fn scenario_from_row(row: &Row) -> rusqlite::Result<Scenario> {
    let created_str: String = row.get("created_at")?;
    Ok(Scenario {
        id: row.get("id")?,
        user_query: row.get("user_query")?,
        initial_response: row.get("initial_response")?,
        error_context: row.get("error_context")?,
        corrected_solution: row.get("corrected_solution")?,
        reasoning: row.get("reasoning")?,
        tags: row.get("tags")?,
        created_at: time_utils::from_sqlite(&created_str).unwrap_or_else(|_| chrono::Utc::now()),
    })
}

fn insert_terms(
    tx: &Transaction,
    scenario_id: i64,
    text: &str,
    term_type: TermType,
) -> HindsightResult<()> {
    let mut stmt = tx
        .prepare("INSERT INTO keyterms (scenario_id, term, term_type) VALUES (?1, ?2, ?3)")
        .map_err(|e| HindsightError::Storage(e.to_string()))?;

    for term in keyterms::extract(text, MIN_TERM_LENGTH) {
        stmt.execute(params![scenario_id, term, term_type.as_str()])
            .map_err(|e| HindsightError::Storage(format!("Insert keyterm failed: {}", e)))?;
    }
    Ok(())
}

// ── Operations ──

impl ScenarioStore {
    /// Insert one scenario plus every keyterm derived from it, atomically.
    /// Terms come from user_query (query), error_context (error) and
    /// corrected_solution (solution); each non-empty comma-split tag segment
    /// is stored raw with type tag. Returns the assigned id.
    pub fn insert(conn: &Connection, scenario: &NewScenario) -> HindsightResult<i64> {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| HindsightError::Storage(format!("Begin transaction failed: {}", e)))?;

        tx.execute(
            "INSERT INTO scenarios
             (user_query, initial_response, error_context, corrected_solution, reasoning, tags, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                scenario.user_query,
                scenario.initial_response,
                scenario.error_context,
                scenario.corrected_solution,
                scenario.reasoning,
                scenario.tags,
                time_utils::to_sqlite(&time_utils::now()),
            ],
        )
        .map_err(|e| HindsightError::Storage(format!("Insert scenario failed: {}", e)))?;
        let scenario_id = tx.last_insert_rowid();

        insert_terms(&tx, scenario_id, &scenario.user_query, TermType::Query)?;
        insert_terms(&tx, scenario_id, &scenario.error_context, TermType::Error)?;
        insert_terms(&tx, scenario_id, &scenario.corrected_solution, TermType::Solution)?;

        {
            let mut stmt = tx
                .prepare("INSERT INTO keyterms (scenario_id, term, term_type) VALUES (?1, ?2, ?3)")
                .map_err(|e| HindsightError::Storage(e.to_string()))?;
            for tag in scenario.tags.split(',') {
                let tag = tag.trim();
                if tag.is_empty() {
                    continue;
                }
                stmt.execute(params![scenario_id, tag, TermType::Tag.as_str()])
                    .map_err(|e| HindsightError::Storage(format!("Insert tag failed: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| HindsightError::Storage(format!("Commit failed: {}", e)))?;

        tracing::debug!(scenario_id = scenario_id, "Scenario recorded");
        Ok(scenario_id)
    }

    /// Unordered snapshot of every stored scenario.
    pub fn list_all(conn: &Connection) -> HindsightResult<Vec<Scenario>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, user_query, initial_response, error_context,
                        corrected_solution, reasoning, tags, created_at
                 FROM scenarios",
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let scenarios = stmt
            .query_map([], scenario_from_row)
            .map_err(|e| HindsightError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(scenarios)
    }

    /// Stored terms of one type for one scenario.
    pub fn keyterms_for(
        conn: &Connection,
        scenario_id: i64,
        term_type: TermType,
    ) -> HindsightResult<HashSet<String>> {
        let mut stmt = conn
            .prepare("SELECT term FROM keyterms WHERE scenario_id = ?1 AND term_type = ?2")
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let terms = stmt
            .query_map(params![scenario_id, term_type.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| HindsightError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(terms)
    }

    /// Most recent scenarios, created_at descending. Identical timestamps
    /// resolve to the higher id first, matching insertion recency.
    pub fn list_recent(conn: &Connection, limit: usize) -> HindsightResult<Vec<Scenario>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, user_query, initial_response, error_context,
                        corrected_solution, reasoning, tags, created_at
                 FROM scenarios
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?1",
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let scenarios = stmt
            .query_map(params![limit as i64], scenario_from_row)
            .map_err(|e| HindsightError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(scenarios)
    }

    pub fn count(conn: &Connection) -> HindsightResult<i64> {
        conn.query_row("SELECT COUNT(*) FROM scenarios", [], |r| r.get(0))
            .map_err(|e| HindsightError::Storage(e.to_string()))
    }

    /// Earliest and latest created_at, None when the store is empty.
    pub fn time_range(
        conn: &Connection,
    ) -> HindsightResult<Option<(chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>>
    {
        let (min, max): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT MIN(created_at), MAX(created_at) FROM scenarios",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        match (min, max) {
            (Some(min), Some(max)) => Ok(Some((
                time_utils::from_sqlite(&min)?,
                time_utils::from_sqlite(&max)?,
            ))),
            _ => Ok(None),
        }
    }

    /// Tag usage counts, most frequent first, ties broken lexically.
    /// Truncated to the top 10.
    pub fn tag_frequency(conn: &Connection) -> HindsightResult<Vec<(String, i64)>> {
        let mut stmt = conn
            .prepare(
                "SELECT term, COUNT(*) AS count
                 FROM keyterms
                 WHERE term_type = 'tag'
                 GROUP BY term
                 ORDER BY count DESC, term ASC
                 LIMIT ?1",
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let tags = stmt
            .query_map(params![STATS_TOP_TAGS as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| HindsightError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(tags)
    }

    /// Scenario counts grouped by the year-month of created_at, most recent
    /// month first, truncated to the 6 most recent months present.
    pub fn counts_by_month(conn: &Connection) -> HindsightResult<Vec<(String, i64)>> {
        let mut stmt = conn
            .prepare(
                "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*)
                 FROM scenarios
                 GROUP BY month
                 ORDER BY month DESC
                 LIMIT ?1",
            )
            .map_err(|e| HindsightError::Storage(e.to_string()))?;

        let months = stmt
            .query_map(params![STATS_MONTHS as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| HindsightError::Storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(months)
    }

    /// Delete every scenario and keyterm and reset the id sequence so the
    /// next scenario gets id 1. Irreversible administrative reset.
    pub fn clear_all(conn: &Connection) -> HindsightResult<()> {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| HindsightError::Storage(format!("Begin transaction failed: {}", e)))?;

        tx.execute("DELETE FROM keyterms", [])
            .map_err(|e| HindsightError::Storage(format!("Clear keyterms failed: {}", e)))?;
        tx.execute("DELETE FROM scenarios", [])
            .map_err(|e| HindsightError::Storage(format!("Clear scenarios failed: {}", e)))?;
        tx.execute(
            "DELETE FROM sqlite_sequence WHERE name IN ('scenarios', 'keyterms')",
            [],
        )
        .map_err(|e| HindsightError::Storage(format!("Sequence reset failed: {}", e)))?;

        tx.commit()
            .map_err(|e| HindsightError::Storage(format!("Commit failed: {}", e)))?;

        tracing::info!("All scenarios cleared");
        Ok(())
    }
}
