//! Conversation tracking — mutable record of the most recent exchange for
//! a session. Correlated with scenarios only through content, never by a
//! stored reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Caller-supplied primary key.
    pub conversation_id: String,
    pub last_query: Option<String>,
    pub last_response: Option<String>,
    pub state: ConversationState,
    /// Refreshed on every write.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Initial,
    Active,
    Corrected,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Active => "active",
            Self::Corrected => "corrected",
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial" => Ok(Self::Initial),
            "active" => Ok(Self::Active),
            "corrected" => Ok(Self::Corrected),
            _ => Err(format!("Unknown conversation state: {}", s)),
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::Initial
    }
}
