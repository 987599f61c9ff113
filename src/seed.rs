//! One-time illustrative seed data.
//!
//! A data-loading collaborator from the core's point of view: the retrieval
//! contract is identical whether or not these scenarios exist. Only an
//! empty store is ever seeded.

use rusqlite::Connection;

use crate::scenario::NewScenario;
use crate::storage::scenarios::ScenarioStore;
use crate::HindsightResult;

/// Insert the built-in example scenarios when the store holds none.
/// Returns how many scenarios were inserted (0 when the store had data).
pub fn seed_if_empty(conn: &Connection) -> HindsightResult<usize> {
    if ScenarioStore::count(conn)? > 0 {
        return Ok(0);
    }

    let examples = builtin_examples();
    for scenario in &examples {
        ScenarioStore::insert(conn, scenario)?;
    }

    tracing::info!(seeded = examples.len(), "Seed scenarios inserted");
    Ok(examples.len())
}

fn builtin_examples() -> Vec<NewScenario> {
    vec![
        NewScenario {
            user_query: "How many \"r\"s are in the word \"strawberry\"?".to_string(),
            initial_response: "The word \"strawberry\" has two letter \"r\"s.".to_string(),
            error_context: "Miscounted the number of 'r' letters in the word strawberry. \
                            There are actually 3 'r's, not 2."
                .to_string(),
            corrected_solution: "The word \"strawberry\" has three letter \"r\"s: one after \
                                 'st', one after 'b', and one before 'y'."
                .to_string(),
            reasoning: "Letters must be counted individually rather than estimated. For \
                        strawberry that means identifying each 'r' in turn: after 'st', after \
                        'b', and before 'y', for 3 occurrences in total."
                .to_string(),
            tags: "counting,spelling,letter-counting".to_string(),
        },
        NewScenario {
            user_query: "I'm getting `AttributeError: 'FastMCP' object has no attribute \
                         'run_stdio'` when starting my MCP server with \
                         `asyncio.run(mcp.run_stdio())`. How do I fix it?"
                .to_string(),
            initial_response: "The `run_stdio()` method does not exist in the current MCP SDK. \
                               Call `mcp.run()` instead, which picks the transport itself."
                .to_string(),
            error_context: "The original advice relied on an outdated method name: the SDK \
                            removed `run_stdio()` in a later release, so the suggested call \
                            raised AttributeError."
                .to_string(),
            corrected_solution: "Use `mcp.run()` directly, without wrapping it in \
                                 `asyncio.run(...)`: the current SDK selects the transport and \
                                 manages the event loop itself."
                .to_string(),
            reasoning: "APIs of actively developed SDKs change between versions. When a method \
                        call raises AttributeError, check the current documentation for the \
                        replacement instead of assuming the old name still exists."
                .to_string(),
            tags: "API,SDK,MCP,method-call,FastMCP,asyncio".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup_db, ScenarioBuilder};

    #[test]
    fn test_seed_fills_empty_store_once() {
        let conn = setup_db();
        assert_eq!(seed_if_empty(&conn).unwrap(), 2);
        assert_eq!(ScenarioStore::count(&conn).unwrap(), 2);

        // Second run is a no-op.
        assert_eq!(seed_if_empty(&conn).unwrap(), 0);
        assert_eq!(ScenarioStore::count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_seed_skips_populated_store() {
        let conn = setup_db();
        ScenarioStore::insert(&conn, &ScenarioBuilder::new().build()).unwrap();
        assert_eq!(seed_if_empty(&conn).unwrap(), 0);
        assert_eq!(ScenarioStore::count(&conn).unwrap(), 1);
    }
}
