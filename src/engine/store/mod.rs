// Vigil Engine — Memory Store
// SQLite persistence for memories, scars, and the processed-file cursor,
// shared by the foreground loop and the background scanner.
//
// Module layout:
//   schema    — idempotent migrations
//   records   — memory append/list/delete/outcome back-fill
//   files     — processed-file delta-sync cursor
//   scars     — scar ledger + trauma check
//   config    — key/value engine config store
//   embedding — f32 blob helpers + cosine similarity

use std::path::Path;

use log::info;
use parking_lot::Mutex;
use rusqlite::Connection;

use crate::atoms::error::EngineResult;

mod config;
pub(crate) mod embedding;
mod files;
mod records;
mod scars;
mod schema;

// ── Re-exports ─────────────────────────────────────────────────────────────

pub use config::{load_engine_config, save_engine_config};
pub use embedding::{cosine_similarity, f32_vec_to_bytes};

/// Thread-safe store handle. Every operation takes the lock, runs its own
/// statement, and releases — no cursor outlives a call and no half-written
/// row is ever visible to a concurrent reader.
pub struct MemoryStore {
    conn: Mutex<Connection>,
}

impl MemoryStore {
    /// Open (or create) the store at the default per-user location.
    pub fn open() -> EngineResult<Self> {
        Self::open_at(&crate::engine::paths::engine_db_path())
    }

    /// Open (or create) a store at an explicit path.
    pub fn open_at(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("[store] Opening memory store at {:?}", path);

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        schema::run_migrations(&conn)?;

        Ok(MemoryStore {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store with the full schema, for tests.
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::run_migrations(&conn)?;
        Ok(MemoryStore {
            conn: Mutex::new(conn),
        })
    }
}
