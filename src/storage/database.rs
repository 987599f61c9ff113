use std::path::Path;

use rusqlite::Connection;

use crate::constants::SQLITE_BUSY_TIMEOUT_MS;
use crate::{HindsightError, HindsightResult};

/// Open (creating if needed) the durable store at `path` with the standard
/// pragma set applied.
pub fn open_connection(path: &Path) -> HindsightResult<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)
        .map_err(|e| HindsightError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "Database connection opened");

    configure(&conn)?;
    Ok(conn)
}

/// Throwaway in-memory store with the same pragma set. Used by tests and
/// callers that need isolation without a file.
pub fn open_in_memory() -> HindsightResult<Connection> {
    let conn = Connection::open_in_memory()
        .map_err(|e| HindsightError::Storage(format!("Failed to open in-memory store: {}", e)))?;
    configure(&conn)?;
    Ok(conn)
}

/// Pragmas applied to every connection:
/// - journal_mode = WAL
/// - busy_timeout = SQLITE_BUSY_TIMEOUT_MS (constants.rs)
/// - synchronous = NORMAL
/// - cache_size = -2000 (2 MB)
/// - foreign_keys = ON
/// - temp_store = MEMORY
fn configure(conn: &Connection) -> HindsightResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = {};
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -2000;
         PRAGMA foreign_keys = ON;
         PRAGMA temp_store = MEMORY;",
        SQLITE_BUSY_TIMEOUT_MS,
    ))
    .map_err(|e| HindsightError::Storage(format!("Failed to configure pragmas: {}", e)))?;
    Ok(())
}

/// Surface any row whose foreign key dangles (a keyterm without its
/// scenario). Unreachable under transactional writes with foreign_keys ON,
/// but when detected it is an error, never silently dropped.
pub fn check_integrity(conn: &Connection) -> HindsightResult<()> {
    let mut stmt = conn
        .prepare("PRAGMA foreign_key_check")
        .map_err(|e| HindsightError::Storage(e.to_string()))?;

    let violations: Vec<String> = stmt
        .query_map([], |row| {
            let table: String = row.get(0)?;
            let rowid: i64 = row.get(1)?;
            Ok(format!("{} rowid {}", table, rowid))
        })
        .map_err(|e| HindsightError::Storage(e.to_string()))?
        .filter_map(|r| r.ok())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(HindsightError::Integrity(format!(
            "Dangling foreign keys: {}",
            violations.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations;

    fn tmp_db_path() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        (dir, path)
    }

    #[test]
    fn test_open_connection_smoke() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path);
        assert!(conn.is_ok(), "open_connection should not error");
    }

    #[test]
    fn test_busy_timeout_set_correctly() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path).unwrap();
        let timeout: u32 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, SQLITE_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let (_dir, path) = tmp_db_path();
        let conn = open_connection(&path).unwrap();
        migrations::migrate(&conn).unwrap();
        let orphan = conn.execute(
            "INSERT INTO keyterms (scenario_id, term, term_type) VALUES (999, 'ghost', 'query')",
            [],
        );
        assert!(orphan.is_err(), "orphan keyterm must be rejected");
    }

    #[test]
    fn test_check_integrity_clean_store() {
        let conn = crate::test_helpers::setup_db();
        assert!(check_integrity(&conn).is_ok());
    }

    #[test]
    fn test_check_integrity_detects_orphans() {
        let conn = crate::test_helpers::setup_db_no_fk();
        conn.execute(
            "INSERT INTO keyterms (scenario_id, term, term_type) VALUES (42, 'ghost', 'query')",
            [],
        )
        .unwrap();
        let err = check_integrity(&conn).unwrap_err();
        assert!(matches!(err, HindsightError::Integrity(_)));
    }
}
