//! Hindsight — durable memory of past mistakes with similarity recall.
//!
//! Records learning scenarios (an incorrect response, what went wrong, the
//! corrected answer, and why) in a local SQLite store, and retrieves the
//! scenarios relevant to a new query so a caller can avoid repeating a
//! known error. The orchestrator invoking the operations and its transport
//! live outside this crate.

// Foundation types
pub mod constants;
pub mod error;
pub mod time_utils;

// Core types
pub mod config;
pub mod conversation;
pub mod scenario;

// Sub-systems
pub mod intelligence;
pub mod logging;
pub mod processing;
pub mod seed;
pub mod service;
pub mod storage;

#[cfg(test)]
pub mod test_helpers;

// Re-exports for convenience
pub use config::RetrievalConfig;
pub use conversation::{Conversation, ConversationState};
pub use error::{HindsightError, HindsightResult};
pub use scenario::{NewScenario, Scenario, ScenarioMatch, TermType};
pub use service::{
    ConversationContext, InteractionSummary, LearningStatistics, RetrievalService,
};
