// Database schema and migrations for the Vigil store.
// Called once at startup by MemoryStore::open() after WAL is enabled.
// Adding a new table or column: append an idempotent CREATE TABLE IF NOT
// EXISTS or ALTER TABLE … ADD COLUMN at the end of run_migrations() — never
// modify existing SQL, to keep upgrade paths clean.

use rusqlite::Connection;

use crate::atoms::error::EngineResult;

pub(crate) fn run_migrations(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS memories (
            id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT 'interactive',
            outcome TEXT NOT NULL DEFAULT 'unknown',
            confidence REAL NOT NULL DEFAULT 0.5,
            tier TEXT NOT NULL DEFAULT 'tactical',
            embedding BLOB,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_memories_tier ON memories(tier);
        CREATE INDEX IF NOT EXISTS idx_memories_created
            ON memories(created_at DESC);

        CREATE TABLE IF NOT EXISTS scars (
            id INTEGER PRIMARY KEY,
            pattern_key TEXT NOT NULL,
            severity REAL NOT NULL,
            lesson TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS processed_files (
            path TEXT PRIMARY KEY,
            content_hash TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS engine_config (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn in_memory_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn migrations_run_cleanly() {
        let conn = in_memory_db();
        let result = run_migrations(&conn);
        assert!(result.is_ok(), "First migration run failed: {:?}", result);
    }

    #[test]
    fn migrations_idempotent() {
        let conn = in_memory_db();
        run_migrations(&conn).unwrap();
        let result = run_migrations(&conn);
        assert!(result.is_ok(), "Second migration run failed: {:?}", result);
    }

    #[test]
    fn core_tables_created() {
        let conn = in_memory_db();
        run_migrations(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"memories".to_string()));
        assert!(tables.contains(&"scars".to_string()));
        assert!(tables.contains(&"processed_files".to_string()));
        assert!(tables.contains(&"engine_config".to_string()));
    }
}
