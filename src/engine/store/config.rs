use rusqlite::params;

use super::MemoryStore;
use crate::atoms::error::EngineResult;
use crate::atoms::types::EngineConfig;

impl MemoryStore {
    // ── Config storage ─────────────────────────────────────────────────

    pub fn get_config(&self, key: &str) -> EngineResult<Option<String>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT value FROM engine_config WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_config(&self, key: &str, value: &str) -> EngineResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO engine_config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

const ENGINE_CONFIG_KEY: &str = "engine_config";

/// Load the engine config from the store; absent or malformed JSON falls
/// back to defaults.
pub fn load_engine_config(store: &MemoryStore) -> EngineConfig {
    match store.get_config(ENGINE_CONFIG_KEY) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_default(),
        _ => EngineConfig::default(),
    }
}

/// Persist the engine config as JSON.
pub fn save_engine_config(store: &MemoryStore, config: &EngineConfig) -> EngineResult<()> {
    let json = serde_json::to_string(config)?;
    store.set_config(ENGINE_CONFIG_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let store = MemoryStore::in_memory().unwrap();
        assert_eq!(store.get_config("missing").unwrap(), None);

        store.set_config("k", "v1").unwrap();
        store.set_config("k", "v2").unwrap();
        assert_eq!(store.get_config("k").unwrap(), Some("v2".into()));
    }

    #[test]
    fn engine_config_defaults_when_absent() {
        let store = MemoryStore::in_memory().unwrap();
        let config = load_engine_config(&store);
        assert_eq!(config.llm_base_url, "http://localhost:11434");
        assert_eq!(config.sensitivity_threshold, 80);
    }

    #[test]
    fn engine_config_roundtrip() {
        let store = MemoryStore::in_memory().unwrap();
        let mut config = EngineConfig::default();
        config.llm_model = "llama3:70b".into();
        config.risk_ceiling = 1234.0;
        save_engine_config(&store, &config).unwrap();

        let loaded = load_engine_config(&store);
        assert_eq!(loaded.llm_model, "llama3:70b");
        assert!((loaded.risk_ceiling - 1234.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_engine_config_falls_back_to_defaults() {
        let store = MemoryStore::in_memory().unwrap();
        store.set_config("engine_config", "{not json").unwrap();
        let config = load_engine_config(&store);
        assert_eq!(config.llm_model, "llama3");
    }
}
