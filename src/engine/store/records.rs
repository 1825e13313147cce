use chrono::Utc;
use log::info;
use rusqlite::params;
use uuid::Uuid;

use super::embedding::{bytes_to_f32_vec, f32_vec_to_bytes};
use super::MemoryStore;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{MemoryRecord, NewMemory, Outcome, Source, StoreStats, Tier};
use crate::engine::trust::classify_tier;

impl MemoryRecord {
    /// Map a row with columns
    /// (id, content, source, outcome, confidence, tier, embedding, created_at).
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let source: String = row.get(2)?;
        let outcome: String = row.get(3)?;
        let tier: String = row.get(5)?;
        let blob: Option<Vec<u8>> = row.get(6)?;
        Ok(MemoryRecord {
            id: row.get(0)?,
            content: row.get(1)?,
            source: Source::parse(&source),
            outcome: Outcome::parse(&outcome),
            confidence: row.get(4)?,
            tier: Tier::parse(&tier),
            embedding: blob.map(|b| bytes_to_f32_vec(&b)).unwrap_or_default(),
            created_at: row.get(7)?,
        })
    }
}

impl MemoryStore {
    // ── Memory records ─────────────────────────────────────────────────

    /// Append one record as a single atomic insert. The tier is classified
    /// here, once; the id and UTC timestamp are stamped by the store. Empty
    /// content is rejected before anything touches the database.
    pub fn append(&self, memory: NewMemory) -> EngineResult<String> {
        let content = memory.content.trim();
        if content.is_empty() {
            return Err(EngineError::validation("memory content must not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let tier = classify_tier(content, memory.confidence);
        let created_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let blob = f32_vec_to_bytes(&memory.embedding);

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO memories (id, content, source, outcome, confidence, tier, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                content,
                memory.source.as_str(),
                memory.outcome.as_str(),
                memory.confidence.clamp(0.0, 1.0),
                tier.as_str(),
                blob,
                created_at
            ],
        )?;

        info!(
            "[store] Stored memory {} tier={} source={} outcome={}",
            &id[..8],
            tier.as_str(),
            memory.source.as_str(),
            memory.outcome.as_str()
        );
        Ok(id)
    }

    /// Every stored record, newest first.
    pub fn all(&self) -> EngineResult<Vec<MemoryRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, content, source, outcome, confidence, tier, embedding, created_at
             FROM memories ORDER BY created_at DESC",
        )?;
        let records = stmt
            .query_map([], MemoryRecord::from_row)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(records)
    }

    /// Destructive bulk wipe: removes every record whose content contains
    /// the keyword (case-insensitive). Returns the count removed so callers
    /// can confirm nonzero effect. An empty keyword would match everything
    /// and is rejected.
    pub fn delete_matching(&self, keyword: &str) -> EngineResult<usize> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(EngineError::validation("wipe keyword must not be empty"));
        }
        let pattern = format!("%{}%", keyword.to_lowercase());
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM memories WHERE LOWER(content) LIKE ?1",
            params![pattern],
        )?;
        info!("[store] Wiped {} memories matching '{}'", removed, keyword);
        Ok(removed)
    }

    /// Back-fill an outcome once it becomes known. Returns false when the id
    /// does not exist. The only permitted mutation of a stored record.
    pub fn update_outcome(&self, id: &str, outcome: Outcome) -> EngineResult<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE memories SET outcome = ?2 WHERE id = ?1",
            params![id, outcome.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Store totals for the status report.
    pub fn stats(&self) -> EngineResult<StoreStats> {
        let conn = self.conn.lock();
        let (total, avg): (i64, Option<f64>) = conn.query_row(
            "SELECT COUNT(*), AVG(confidence) FROM memories",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let processed: i64 =
            conn.query_row("SELECT COUNT(*) FROM processed_files", [], |row| row.get(0))?;
        Ok(StoreStats {
            total_memories: total,
            avg_confidence: avg.unwrap_or(0.0),
            processed_files: processed,
        })
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Test support: rewrite created_at to simulate record age.
    pub(crate) fn backdate(&self, id: &str, created_at: &str) {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE memories SET created_at = ?2 WHERE id = ?1",
            params![id, created_at],
        )
        .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::in_memory().unwrap()
    }

    #[test]
    fn append_and_read_back() {
        let store = store();
        let id = store
            .append(
                NewMemory::new(
                    "the deploy went fine",
                    Source::Interactive,
                    Outcome::Success,
                    0.8,
                )
                .with_embedding(vec![0.1, 0.2]),
            )
            .unwrap();

        let records = store.all().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, id);
        assert_eq!(record.content, "the deploy went fine");
        assert_eq!(record.source, Source::Interactive);
        assert_eq!(record.outcome, Outcome::Success);
        assert_eq!(record.tier, Tier::Tactical);
        assert_eq!(record.embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn empty_content_rejected_without_side_effect() {
        let store = store();
        let result = store.append(NewMemory::new(
            "   ",
            Source::Interactive,
            Outcome::Neutral,
            0.5,
        ));
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn high_confidence_record_is_strategic() {
        let store = store();
        store
            .append(NewMemory::new(
                "quarterly numbers reviewed",
                Source::Executive,
                Outcome::Success,
                0.95,
            ))
            .unwrap();
        assert_eq!(store.all().unwrap()[0].tier, Tier::Strategic);
    }

    #[test]
    fn delete_matching_is_case_insensitive() {
        let store = store();
        for content in ["Budget meeting notes", "budget overrun warning", "lunch"] {
            store
                .append(NewMemory::new(
                    content,
                    Source::Interactive,
                    Outcome::Neutral,
                    0.5,
                ))
                .unwrap();
        }
        let removed = store.delete_matching("BUDGET").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.all().unwrap().len(), 1);
    }

    #[test]
    fn delete_matching_rejects_empty_keyword() {
        let store = store();
        assert!(matches!(
            store.delete_matching("  "),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn outcome_backfill() {
        let store = store();
        let id = store
            .append(NewMemory::new(
                "migration started",
                Source::SystemLog,
                Outcome::Unknown,
                0.5,
            ))
            .unwrap();

        assert!(store.update_outcome(&id, Outcome::Success).unwrap());
        assert_eq!(store.all().unwrap()[0].outcome, Outcome::Success);
        assert!(!store.update_outcome("no-such-id", Outcome::Failure).unwrap());
    }

    #[test]
    fn stats_reflect_contents() {
        let store = store();
        let stats = store.stats().unwrap();
        assert_eq!(stats.total_memories, 0);
        assert_eq!(stats.processed_files, 0);

        store
            .append(NewMemory::new(
                "one",
                Source::Interactive,
                Outcome::Neutral,
                0.4,
            ))
            .unwrap();
        store
            .append(NewMemory::new(
                "two",
                Source::Interactive,
                Outcome::Neutral,
                0.6,
            ))
            .unwrap();
        store.upsert_file_hash("/tmp/a.txt", "abc").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_memories, 2);
        assert!((stats.avg_confidence - 0.5).abs() < 1e-9);
        assert_eq!(stats.processed_files, 1);
    }
}
