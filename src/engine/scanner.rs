// Vigil Engine — Sensitivity Scan Pipeline
//
// Background sweep over the user's documents. Per-file state machine:
//
//   discovered → hashed → (skip when unchanged) → classified
//             → quarantined | cleared
//
// Re-scanning an unchanged file would fabricate duplicate audit memories,
// so the hash check is a correctness gate, not a cache. Per-file failures
// are logged and skipped; the loop only exits on the stop signal.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{info, warn};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::atoms::constants::{
    RISK_COST_ACTION, SCAN_EXCERPT_BYTES, SCAN_EXTENSIONS, SCAN_SKIP_DIRS, SCAN_STOP_POLL_SECS,
};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    NewMemory, Outcome, ScanOutcome, SensitivityVerdict, Source, Verdict,
};
use crate::engine::guardrail::Guardrail;
use crate::engine::providers::{Completer, Embedder};
use crate::engine::store::MemoryStore;
use crate::engine::vault::Vault;

pub struct Scanner {
    store: Arc<MemoryStore>,
    classifier: Arc<dyn Completer>,
    embedder: Arc<dyn Embedder>,
    guardrail: Arc<Mutex<Guardrail>>,
    vault: Vault,
    roots: Vec<PathBuf>,
    threshold: u8,
    interval: Duration,
}

impl Scanner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<MemoryStore>,
        classifier: Arc<dyn Completer>,
        embedder: Arc<dyn Embedder>,
        guardrail: Arc<Mutex<Guardrail>>,
        vault: Vault,
        roots: Vec<PathBuf>,
        threshold: u8,
        interval: Duration,
    ) -> Self {
        Scanner {
            store,
            classifier,
            embedder,
            guardrail,
            vault,
            roots,
            threshold,
            interval,
        }
    }

    /// One full sweep over every root. Returns the number of files
    /// quarantined this pass.
    pub fn sweep(&self) -> usize {
        let mut quarantined = 0;
        for root in &self.roots {
            let walker = WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|entry| !self.skip_dir(entry));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("[scanner] Walk error: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !eligible_extension(entry.path()) {
                    continue;
                }
                match self.process_file(entry.path()) {
                    Ok(ScanOutcome::Quarantined { score, vault_path }) => {
                        info!(
                            "[scanner] Secured {:?} (score {}) -> {:?}",
                            entry.path(),
                            score,
                            vault_path
                        );
                        quarantined += 1;
                    }
                    Ok(ScanOutcome::Deferred { reason }) => {
                        warn!("[scanner] Quarantine deferred for {:?}: {}", entry.path(), reason);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("[scanner] Skipping {:?}: {}", entry.path(), e),
                }
            }
        }
        quarantined
    }

    /// Drive one file through the pipeline.
    pub fn process_file(&self, path: &Path) -> EngineResult<ScanOutcome> {
        let path_str = path.to_string_lossy().to_string();

        // Hash first, so unchanged files cost no classifier call and — the
        // delta-sync contract — produce zero writes.
        let hash = hash_file(path)?;
        if self.store.lookup_file_hash(&path_str)?.as_deref() == Some(hash.as_str()) {
            return Ok(ScanOutcome::SkippedUnchanged);
        }

        let excerpt = read_excerpt(path, SCAN_EXCERPT_BYTES)?;
        let verdict = self.classify(path, &excerpt);
        let score = verdict.effective_score();

        if score < self.threshold {
            // Clearing a file is not noteworthy — only the cursor moves.
            self.store.upsert_file_hash(&path_str, &hash)?;
            return Ok(ScanOutcome::Cleared { score });
        }

        // Quarantine is a state-changing action and is gated like any other.
        let gate = self
            .guardrail
            .lock()
            .consult(&format!("quarantine {}", path.display()), RISK_COST_ACTION);
        if let Verdict::Denied { reason } = gate {
            // Cursor untouched: the file is reconsidered next sweep.
            return Ok(ScanOutcome::Deferred { reason });
        }

        let vault_path = self.vault.quarantine(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_str.clone());
        let content = format!(
            "SECURITY ALERT: moved {} to vault (score {})",
            file_name, score
        );
        let embedding = match self.embedder.embed(&content) {
            Ok(vec) => vec,
            Err(e) => {
                warn!("[scanner] Embedding unavailable for audit memory: {}", e);
                Vec::new()
            }
        };
        self.store.append(
            NewMemory::new(content, Source::Scanner, Outcome::Success, 1.0)
                .with_embedding(embedding),
        )?;
        self.store.upsert_file_hash(&path_str, &hash)?;

        Ok(ScanOutcome::Quarantined { score, vault_path })
    }

    fn classify(&self, path: &Path, excerpt: &str) -> SensitivityVerdict {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prompt = format!(
            "Analyze if this file content is confidential (Score 0-100). \
             Return ONLY the number.\nFile: {}\nContent: {}",
            name, excerpt
        );
        match self.classifier.complete(&prompt) {
            Ok(reply) => parse_sensitivity(&reply),
            Err(e) => {
                warn!(
                    "[scanner] Classifier unavailable for {:?} — treating as not sensitive: {}",
                    path, e
                );
                SensitivityVerdict::Unreadable
            }
        }
    }

    fn skip_dir(&self, entry: &walkdir::DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        if self.vault.contains(entry.path()) {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        SCAN_SKIP_DIRS.iter().any(|dir| name == *dir)
    }
}

/// First integer run in the reply, clamped to 100. Anything else is
/// Unreadable, which scores 0 — the pipeline fails open rather than
/// quarantining a disk on classifier malfunction.
pub fn parse_sensitivity(reply: &str) -> SensitivityVerdict {
    let digits: String = reply
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    match digits.parse::<u32>() {
        Ok(n) => SensitivityVerdict::Scored(n.min(100) as u8),
        Err(_) => SensitivityVerdict::Unreadable,
    }
}

fn hash_file(path: &Path) -> EngineResult<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 65536];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

fn read_excerpt(path: &Path, limit: usize) -> EngineResult<String> {
    let file = File::open(path)?;
    let mut data = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut data)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn eligible_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SCAN_EXTENSIONS.iter().any(|allowed| *allowed == ext)
        })
        .unwrap_or(false)
}

// ── Background loop ────────────────────────────────────────────────────────

/// Run sweeps until `stop` flips. The sleep between sweeps is sliced so a
/// stop request takes effect within seconds, not an hour.
pub fn spawn(scanner: Scanner, stop: Arc<AtomicBool>) -> EngineResult<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("vigil-scanner".into())
        .spawn(move || {
            info!(
                "[scanner] Background sweep loop started (interval {:?})",
                scanner.interval
            );
            while !stop.load(Ordering::Relaxed) {
                let secured = scanner.sweep();
                if secured > 0 {
                    info!("[scanner] Sweep complete: {} file(s) secured", secured);
                }
                let mut slept = Duration::ZERO;
                while slept < scanner.interval && !stop.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_secs(SCAN_STOP_POLL_SECS));
                    slept += Duration::from_secs(SCAN_STOP_POLL_SECS);
                }
            }
            info!("[scanner] Stop signal received — scanner exiting");
        })?;
    Ok(handle)
}
