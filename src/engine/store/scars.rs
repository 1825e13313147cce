// Scar ledger: permanent lessons from failed decisions. Scars are never
// mutated and never deleted — the keyword wipe only touches memories.

use log::info;
use rusqlite::params;
use sha2::{Digest, Sha256};

use super::MemoryStore;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::Scar;

impl MemoryStore {
    // ── Scar ledger ────────────────────────────────────────────────────

    /// Record a lesson from a failure. The pattern key fingerprints the
    /// triggering input for duplicate suppression; matching runs on the
    /// lesson text, not the key.
    pub fn register_scar(&self, content: &str, severity: f64, lesson: &str) -> EngineResult<()> {
        let lesson = lesson.trim();
        if lesson.is_empty() {
            return Err(EngineError::validation("scar lesson must not be empty"));
        }
        let pattern_key = fingerprint(content);
        let severity = severity.clamp(0.0, 1.0);

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO scars (pattern_key, severity, lesson) VALUES (?1, ?2, ?3)",
            params![pattern_key, severity, lesson],
        )?;
        info!("[scars] Lesson recorded (severity {:.2}): {}", severity, lesson);
        Ok(())
    }

    /// First scar whose lesson shares at least one word with the input,
    /// scanning in insertion order. Case-insensitive, length-insensitive —
    /// a cheap recall filter where over-triggering is acceptable and a
    /// silent miss is not. An empty ledger yields None.
    pub fn check_trauma(&self, input: &str) -> EngineResult<Option<Scar>> {
        let input_lower = input.to_lowercase();

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT pattern_key, severity, lesson, created_at FROM scars ORDER BY id",
        )?;
        let scars = stmt
            .query_map([], |row| {
                Ok(Scar {
                    pattern_key: row.get(0)?,
                    severity: row.get(1)?,
                    lesson: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .filter_map(|r| r.ok());

        for scar in scars {
            let lesson_lower = scar.lesson.to_lowercase();
            if lesson_lower
                .split_whitespace()
                .any(|word| input_lower.contains(word))
            {
                return Ok(Some(scar));
            }
        }
        Ok(None)
    }

    /// How many lessons mention the keyword (case-insensitive). Feeds the
    /// decision engine's scar-weighted risk term.
    pub fn scar_count_matching(&self, keyword: &str) -> EngineResult<i64> {
        let pattern = format!("%{}%", keyword.to_lowercase());
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM scars WHERE LOWER(lesson) LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// SHA-256 hex digest of the lowercased input.
fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.to_lowercase().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::in_memory().unwrap()
    }

    #[test]
    fn empty_ledger_yields_none() {
        let store = store();
        assert!(store.check_trauma("anything at all").unwrap().is_none());
    }

    #[test]
    fn word_overlap_triggers_match() {
        let store = store();
        store
            .register_scar("delete all logs", 0.9, "deleted logs without backup")
            .unwrap();

        let scar = store
            .check_trauma("please delete all logs now")
            .unwrap()
            .expect("should match on 'logs'");
        assert!((scar.severity - 0.9).abs() < 1e-9);
        assert_eq!(scar.lesson, "deleted logs without backup");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let store = store();
        store
            .register_scar("x", 0.5, "Vendor Payment bounced")
            .unwrap();
        assert!(store.check_trauma("schedule the VENDOR call").unwrap().is_some());
    }

    #[test]
    fn unrelated_input_does_not_match() {
        let store = store();
        store
            .register_scar("x", 0.9, "overwrote production schema")
            .unwrap();
        assert!(store.check_trauma("play some music").unwrap().is_none());
    }

    #[test]
    fn first_scar_in_insertion_order_wins() {
        let store = store();
        store.register_scar("a", 0.3, "shared token publicly").unwrap();
        store.register_scar("b", 0.9, "token leaked again").unwrap();

        let scar = store.check_trauma("rotate the token").unwrap().unwrap();
        assert_eq!(scar.lesson, "shared token publicly");
    }

    #[test]
    fn severity_is_clamped() {
        let store = store();
        store.register_scar("x", 4.2, "overpaid a vendor").unwrap();
        let scar = store.check_trauma("vendor invoice").unwrap().unwrap();
        assert!((scar.severity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_lesson_rejected() {
        let store = store();
        assert!(matches!(
            store.register_scar("x", 0.9, "  "),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn scar_count_matches_keyword() {
        let store = store();
        store.register_scar("a", 0.5, "alpha rollout failed").unwrap();
        store.register_scar("b", 0.5, "alpha rollback mishandled").unwrap();
        store.register_scar("c", 0.5, "beta launch was fine").unwrap();

        assert_eq!(store.scar_count_matching("Alpha").unwrap(), 2);
        assert_eq!(store.scar_count_matching("gamma").unwrap(), 0);
    }
}
