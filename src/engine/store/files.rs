use rusqlite::params;

use super::MemoryStore;
use crate::atoms::error::EngineResult;

impl MemoryStore {
    // ── Processed-file cursor (delta sync) ─────────────────────────────

    /// Last digest recorded for a path, if any.
    pub fn lookup_file_hash(&self, path: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT content_hash FROM processed_files WHERE path = ?1",
            params![path],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(hash) => Ok(Some(hash)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the digest seen for a path. At most one row per path; the last
    /// writer wins.
    pub fn upsert_file_hash(&self, path: &str, hash: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO processed_files (path, content_hash) VALUES (?1, ?2)
             ON CONFLICT(path) DO UPDATE SET content_hash = ?2",
            params![path, hash],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_none() {
        let store = MemoryStore::in_memory().unwrap();
        assert_eq!(store.lookup_file_hash("/nowhere").unwrap(), None);
    }

    #[test]
    fn upsert_overwrites_single_row() {
        let store = MemoryStore::in_memory().unwrap();
        store.upsert_file_hash("/home/u/notes.txt", "aaa").unwrap();
        assert_eq!(
            store.lookup_file_hash("/home/u/notes.txt").unwrap(),
            Some("aaa".into())
        );

        store.upsert_file_hash("/home/u/notes.txt", "bbb").unwrap();
        assert_eq!(
            store.lookup_file_hash("/home/u/notes.txt").unwrap(),
            Some("bbb".into())
        );
        assert_eq!(store.stats().unwrap().processed_files, 1);
    }
}
