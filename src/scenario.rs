//! Scenario types — one recorded episode of an incorrect response plus its
//! correction, immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored learning episode. Created atomically with its derived keyterms,
/// never updated afterwards, deleted only by bulk-clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: i64,
    pub user_query: String,
    pub initial_response: String,
    pub error_context: String,
    pub corrected_solution: String,
    pub reasoning: String,
    /// Comma-separated free-form labels; may be empty.
    pub tags: String,
    pub created_at: DateTime<Utc>,
}

/// Input fields for a scenario about to be recorded. The five core fields
/// are required (empty strings are permitted, absence is not); tags are
/// optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewScenario {
    pub user_query: String,
    pub initial_response: String,
    pub error_context: String,
    pub corrected_solution: String,
    pub reasoning: String,
    #[serde(default)]
    pub tags: String,
}

/// Which scenario field a keyterm was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    Query,
    Error,
    Solution,
    Tag,
}

impl TermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Error => "error",
            Self::Solution => "solution",
            Self::Tag => "tag",
        }
    }
}

impl std::fmt::Display for TermType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TermType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "error" => Ok(Self::Error),
            "solution" => Ok(Self::Solution),
            "tag" => Ok(Self::Tag),
            _ => Err(format!("Unknown term type: {}", s)),
        }
    }
}

/// A scenario together with its combined similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioMatch {
    pub scenario: Scenario,
    pub score: f64,
}
