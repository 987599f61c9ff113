//! Retrieval service — the operation surface consumed by the external
//! orchestrator.
//!
//! Holds an injected store handle rather than reopening a shared database
//! by name, so callers (and tests) choose their own isolation. Every
//! operation is a short, independently atomic unit; no transaction stays
//! open across a caller round-trip, and nothing is retried here.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::conversation::ConversationState;
use crate::intelligence::similarity::SimilarityEngine;
use crate::scenario::{NewScenario, Scenario, ScenarioMatch};
use crate::storage::conversations::ConversationStore;
use crate::storage::scenarios::ScenarioStore;
use crate::storage::{database, migrations, path_utils};
use crate::{HindsightError, HindsightResult};

pub const USER_CORRECTION_TAG: &str = "user-correction";
pub const SELF_CORRECTION_TAG: &str = "self-correction";

const USER_CORRECTION_REASONING: &str =
    "Learned from user correction that the previous response was incorrect.";
const SELF_CORRECTION_REASONING: &str = "Self-detected error and correction.";

/// Outcome of `note_interaction`.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionSummary {
    /// Id of the scenario recorded from the overwritten exchange, when the
    /// interaction was a correction with a previous exchange to learn from.
    pub recorded_scenario: Option<i64>,
}

/// Outcome of `context_for`. `Display` renders the human-readable digest.
#[derive(Debug, Clone)]
pub enum ConversationContext {
    /// First reference to this conversation; it has just been initialized.
    NoPriorContext,
    /// Known conversation, but nothing relevant is stored.
    NoRelevantScenarios,
    /// Ranked digest of relevant past scenarios.
    Matches(Vec<ScenarioMatch>),
}

impl fmt::Display for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPriorContext => f.write_str("No prior context for this conversation."),
            Self::NoRelevantScenarios => {
                f.write_str("No relevant scenarios found for this query.")
            }
            Self::Matches(matches) => {
                writeln!(
                    f,
                    "Found {} similar scenarios from previous interactions:",
                    matches.len()
                )?;
                for (i, m) in matches.iter().enumerate() {
                    writeln!(f)?;
                    writeln!(f, "--- Scenario {} (Similarity: {:.2}) ---", i + 1, m.score)?;
                    writeln!(f, "User Query: {}", m.scenario.user_query)?;
                    writeln!(
                        f,
                        "Previous Incorrect Response: {}",
                        m.scenario.initial_response
                    )?;
                    writeln!(f, "What Went Wrong: {}", m.scenario.error_context)?;
                    writeln!(f, "Correct Response: {}", m.scenario.corrected_solution)?;
                    writeln!(f, "Learning: {}", m.scenario.reasoning)?;
                }
                Ok(())
            }
        }
    }
}

/// Aggregate statistics over the stored scenarios.
#[derive(Debug, Clone, Serialize)]
pub struct LearningStatistics {
    pub total: i64,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    /// Top tags, most used first (at most 10).
    pub top_tags: Vec<(String, i64)>,
    /// Scenario counts per year-month, most recent first (at most 6).
    pub by_month: Vec<(String, i64)>,
}

impl fmt::Display for LearningStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total learning scenarios: {}", self.total)?;

        if let (Some(earliest), Some(latest)) = (&self.earliest, &self.latest) {
            writeln!(f, "First scenario: {}", earliest.to_rfc3339())?;
            writeln!(f, "Most recent scenario: {}", latest.to_rfc3339())?;
        }

        if !self.top_tags.is_empty() {
            writeln!(f, "\nMost common tags:")?;
            for (tag, count) in &self.top_tags {
                writeln!(f, "- {}: {}", tag, count)?;
            }
        }

        if !self.by_month.is_empty() {
            writeln!(f, "\nScenarios by month:")?;
            for (month, count) in &self.by_month {
                writeln!(f, "- {}: {}", month, count)?;
            }
        }

        Ok(())
    }
}

pub struct RetrievalService {
    conn: Connection,
    config: RetrievalConfig,
}

impl RetrievalService {
    /// Wrap an already-opened, migrated store handle.
    pub fn new(conn: Connection, config: RetrievalConfig) -> Self {
        Self { conn, config }
    }

    /// Open the store at `path`, applying migrations.
    pub fn open(path: &Path, config: RetrievalConfig) -> HindsightResult<Self> {
        let conn = database::open_connection(path)?;
        migrations::migrate(&conn)?;
        Ok(Self::new(conn, config))
    }

    /// Open the default store with config from `{data_dir}/config.json`.
    pub fn open_default() -> HindsightResult<Self> {
        let config = RetrievalConfig::load(&path_utils::config_path());
        Self::open(&path_utils::default_db_path(), config)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Record a complete learning scenario. All five core fields are
    /// required by construction; tags are optional.
    pub fn record_scenario(&self, scenario: &NewScenario) -> HindsightResult<i64> {
        ScenarioStore::insert(&self.conn, scenario)
    }

    /// Ranked scenarios similar to `query`. Defaults: threshold 0.35, at
    /// most 3 results, both overridable per call. An empty result is not an
    /// error.
    pub fn search_similar(
        &self,
        query: &str,
        threshold: Option<f64>,
        max_results: Option<usize>,
    ) -> HindsightResult<Vec<ScenarioMatch>> {
        let threshold = threshold.unwrap_or(self.config.search_threshold);
        let max_results = max_results.unwrap_or(self.config.search_max_results);

        let mut matches = SimilarityEngine::find_similar(&self.conn, query, threshold)?;
        matches.truncate(max_results);
        Ok(matches)
    }

    /// "Have I seen this before" check: stricter threshold (0.5), top 2.
    pub fn recall(&self, query: &str) -> HindsightResult<Vec<ScenarioMatch>> {
        let mut matches =
            SimilarityEngine::find_similar(&self.conn, query, self.config.recall_threshold)?;
        matches.truncate(self.config.recall_max_results);
        Ok(matches)
    }

    /// Track one exchange. When `is_correction` is set and the conversation
    /// already held an exchange, that previous query/response pair (read
    /// before the upsert overwrites it) becomes a new learning scenario
    /// tagged `user-correction`.
    pub fn note_interaction(
        &self,
        conversation_id: &str,
        user_message: &str,
        response: &str,
        is_correction: bool,
    ) -> HindsightResult<InteractionSummary> {
        validate_conversation_id(conversation_id)?;

        let previous = ConversationStore::get(&self.conn, conversation_id)?;

        ConversationStore::upsert(
            &self.conn,
            conversation_id,
            Some(user_message),
            Some(response),
            ConversationState::Active,
        )?;

        let mut recorded = None;
        if is_correction {
            if let Some((prev_query, prev_response)) = previous
                .and_then(|p| p.last_query.zip(p.last_response))
            {
                let id = ScenarioStore::insert(
                    &self.conn,
                    &NewScenario {
                        user_query: prev_query,
                        initial_response: prev_response,
                        error_context: format!("User correction: {}", user_message),
                        corrected_solution: response.to_string(),
                        reasoning: USER_CORRECTION_REASONING.to_string(),
                        tags: USER_CORRECTION_TAG.to_string(),
                    },
                )?;
                tracing::info!(
                    scenario_id = id,
                    conversation_id = %conversation_id,
                    "Correction recorded from conversation history"
                );
                recorded = Some(id);
            }
        }

        Ok(InteractionSummary {
            recorded_scenario: recorded,
        })
    }

    /// Record a correction from caller-supplied before/after values (no
    /// dependency on stored history), tagged `self-correction`, and mark
    /// the conversation corrected.
    pub fn record_correction(
        &self,
        conversation_id: &str,
        user_message: &str,
        previous_response: &str,
        corrected_response: &str,
        explanation: &str,
    ) -> HindsightResult<i64> {
        validate_conversation_id(conversation_id)?;

        let id = ScenarioStore::insert(
            &self.conn,
            &NewScenario {
                user_query: user_message.to_string(),
                initial_response: previous_response.to_string(),
                error_context: explanation.to_string(),
                corrected_solution: corrected_response.to_string(),
                reasoning: SELF_CORRECTION_REASONING.to_string(),
                tags: SELF_CORRECTION_TAG.to_string(),
            },
        )?;

        ConversationStore::set_state(
            &self.conn,
            conversation_id,
            corrected_response,
            ConversationState::Corrected,
        )?;

        tracing::info!(scenario_id = id, conversation_id = %conversation_id, "Self-correction recorded");
        Ok(id)
    }

    /// Context digest for a conversation. An unknown id is initialized and
    /// reported as having no prior context; a known id with a last query is
    /// searched at threshold 0.6, top 2.
    pub fn context_for(&self, conversation_id: &str) -> HindsightResult<ConversationContext> {
        validate_conversation_id(conversation_id)?;

        let (conversation, created) = ConversationStore::get_or_init(&self.conn, conversation_id)?;
        if created {
            return Ok(ConversationContext::NoPriorContext);
        }

        let Some(last_query) = conversation.last_query else {
            return Ok(ConversationContext::NoRelevantScenarios);
        };

        let mut matches =
            SimilarityEngine::find_similar(&self.conn, &last_query, self.config.context_threshold)?;
        matches.truncate(self.config.context_max_results);

        if matches.is_empty() {
            Ok(ConversationContext::NoRelevantScenarios)
        } else {
            Ok(ConversationContext::Matches(matches))
        }
    }

    pub fn statistics(&self) -> HindsightResult<LearningStatistics> {
        let total = ScenarioStore::count(&self.conn)?;
        let (earliest, latest) = match ScenarioStore::time_range(&self.conn)? {
            Some((earliest, latest)) => (Some(earliest), Some(latest)),
            None => (None, None),
        };

        Ok(LearningStatistics {
            total,
            earliest,
            latest,
            top_tags: ScenarioStore::tag_frequency(&self.conn)?,
            by_month: ScenarioStore::counts_by_month(&self.conn)?,
        })
    }

    /// Most recent scenarios, default limit 5.
    pub fn recent_scenarios(&self, limit: Option<usize>) -> HindsightResult<Vec<Scenario>> {
        ScenarioStore::list_recent(&self.conn, limit.unwrap_or(self.config.recent_limit))
    }

    /// Irreversible: drops every scenario and keyterm and restarts ids at 1.
    pub fn clear_all(&self) -> HindsightResult<()> {
        ScenarioStore::clear_all(&self.conn)
    }
}

fn validate_conversation_id(conversation_id: &str) -> HindsightResult<()> {
    if conversation_id.trim().is_empty() {
        return Err(HindsightError::InvalidInput(
            "conversation_id must be non-empty".to_string(),
        ));
    }
    Ok(())
}
