// === SQLite Tuning ===
pub const SQLITE_BUSY_TIMEOUT_MS: u32 = 5_000;

// === Keyterm Extraction ===
pub const MIN_TERM_LENGTH: usize = 4;

// === Similarity Scoring ===
pub const LEXICAL_WEIGHT: f64 = 0.7;
pub const TERM_OVERLAP_WEIGHT: f64 = 0.3;

// === Retrieval defaults (overridable via RetrievalConfig) ===
pub const SEARCH_THRESHOLD: f64 = 0.35;
pub const SEARCH_MAX_RESULTS: usize = 3;
pub const RECALL_THRESHOLD: f64 = 0.5;
pub const RECALL_MAX_RESULTS: usize = 2;
pub const CONTEXT_THRESHOLD: f64 = 0.6;
pub const CONTEXT_MAX_RESULTS: usize = 2;
pub const RECENT_DEFAULT_LIMIT: usize = 5;

// === Statistics ===
pub const STATS_TOP_TAGS: usize = 10;
pub const STATS_MONTHS: usize = 6;
