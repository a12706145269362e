//! Generation journal
//!
//! Append-only record of completed pipeline runs, stored as a single JSON
//! file. The whole file is loaded on each operation; every operation holds
//! an internal lock so concurrent in-process runs cannot drop each other's
//! records on the read-modify-write, and readers never observe a write in
//! progress. Writes go through a temp file and rename so a crash mid-write
//! leaves the previous journal intact.

use atelier_core::{AtelierError, ContentHash, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A record of one fully completed generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// ISO 8601 timestamp of when the run completed
    pub timestamp: String,
    pub original_prompt: String,
    pub expanded_prompt: String,
    pub image_path: String,
    pub model_path: String,
    /// Content hash of the image artifact (sha256:...)
    #[serde(default)]
    pub image_hash: Option<String>,
    /// Content hash of the 3D artifact (sha256:...)
    #[serde(default)]
    pub model_hash: Option<String>,
}

impl GenerationRecord {
    /// Build a record stamped with the current time
    pub fn now(
        original_prompt: impl Into<String>,
        expanded_prompt: impl Into<String>,
        image_path: impl Into<String>,
        model_path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            original_prompt: original_prompt.into(),
            expanded_prompt: expanded_prompt.into(),
            image_path: image_path.into(),
            model_path: model_path.into(),
            image_hash: None,
            model_hash: None,
        }
    }

    /// True when the artifact files on disk still match the recorded
    /// hashes. Records without hashes verify trivially.
    pub fn artifacts_intact(&self) -> bool {
        hash_matches(&self.image_path, self.image_hash.as_deref())
            && hash_matches(&self.model_path, self.model_hash.as_deref())
    }
}

fn hash_matches(path: &str, recorded: Option<&str>) -> bool {
    let Some(recorded) = recorded else {
        return true;
    };
    let Some(expected) = ContentHash::from_prefixed_hex(recorded) else {
        return false;
    };
    match ContentHash::from_file(path) {
        Ok(actual) => actual == expected,
        Err(_) => false,
    }
}

/// On-disk journal shape
#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    generations: Vec<GenerationRecord>,
}

/// Append-only journal of generation records
pub struct Journal {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Journal {
    /// Open a journal at the given path, creating an empty one if absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let journal = Self {
            path,
            lock: Mutex::new(()),
        };
        if !journal.path.exists() {
            journal.write_file(&JournalFile::default())?;
        }
        Ok(journal)
    }

    /// Append a record. Insertion order is chronological order.
    pub fn append(&self, record: GenerationRecord) -> Result<()> {
        let _guard = self.guard()?;
        let mut file = self.read_file()?;
        file.generations.push(record);
        self.write_file(&file)
    }

    /// Return all records whose original prompt contains `substring`, in
    /// insertion order. The empty substring matches everything.
    pub fn find(&self, substring: &str) -> Result<Vec<GenerationRecord>> {
        let _guard = self.guard()?;
        let file = self.read_file()?;
        Ok(file
            .generations
            .into_iter()
            .filter(|r| r.original_prompt.contains(substring))
            .collect())
    }

    /// Number of records in the journal
    pub fn len(&self) -> Result<usize> {
        let _guard = self.guard()?;
        Ok(self.read_file()?.generations.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AtelierError::JournalError("journal lock poisoned".to_string()))
    }

    fn read_file(&self) -> Result<JournalFile> {
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            AtelierError::JournalError(format!(
                "failed to parse journal {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    // Write to a sibling temp file and rename it into place so the journal
    // on disk is always a complete document.
    fn write_file(&self, file: &JournalFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file)
            .map_err(|e| AtelierError::JournalError(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_journal() -> Journal {
        let dir =
            std::env::temp_dir().join(format!("atelier_journal_test_{}", uuid::Uuid::new_v4()));
        Journal::open(dir.join("journal.json")).unwrap()
    }

    fn record(prompt: &str) -> GenerationRecord {
        GenerationRecord::now(prompt, format!("{} (expanded)", prompt), "a.png", "a.glb")
    }

    #[test]
    fn test_open_creates_empty_journal() {
        let journal = temp_journal();
        assert!(journal.path().exists());
        assert!(journal.is_empty().unwrap());
    }

    #[test]
    fn test_append_and_find() {
        let journal = temp_journal();
        journal.append(record("a red fox in snow")).unwrap();
        journal.append(record("a blue whale")).unwrap();

        let hits = journal.find("fox").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].original_prompt, "a red fox in snow");

        assert!(journal.find("dragon").unwrap().is_empty());
    }

    #[test]
    fn test_empty_substring_matches_all() {
        let journal = temp_journal();
        journal.append(record("one")).unwrap();
        journal.append(record("two")).unwrap();
        assert_eq!(journal.find("").unwrap().len(), 2);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let journal = temp_journal();
        journal.append(record("fox one")).unwrap();
        journal.append(record("fox two")).unwrap();
        journal.append(record("fox three")).unwrap();

        let hits = journal.find("fox").unwrap();
        let prompts: Vec<_> = hits.iter().map(|r| r.original_prompt.as_str()).collect();
        assert_eq!(prompts, vec!["fox one", "fox two", "fox three"]);
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        use std::sync::Arc;

        let journal = Arc::new(temp_journal());
        let mut handles = Vec::new();
        for i in 0..8 {
            let journal = Arc::clone(&journal);
            handles.push(std::thread::spawn(move || {
                journal.append(record(&format!("prompt {}", i))).unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(journal.len().unwrap(), 8);
    }

    #[test]
    fn test_find_during_concurrent_appends_never_errors() {
        use std::sync::Arc;

        let journal = Arc::new(temp_journal());
        let writer = {
            let journal = Arc::clone(&journal);
            std::thread::spawn(move || {
                for i in 0..200 {
                    journal.append(record(&format!("prompt {}", i))).unwrap();
                }
            })
        };

        // Reads must always see a complete document while the writer runs.
        while !writer.is_finished() {
            journal.find("prompt").unwrap();
        }
        writer.join().unwrap();

        assert_eq!(journal.len().unwrap(), 200);
    }

    #[test]
    fn test_artifacts_intact_detects_tampering() {
        let dir =
            std::env::temp_dir().join(format!("atelier_journal_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let image = dir.join("image.png");
        let model = dir.join("model.glb");
        std::fs::write(&image, b"png bytes").unwrap();
        std::fs::write(&model, b"glb bytes").unwrap();

        let mut rec = GenerationRecord::now(
            "fox",
            "fox (expanded)",
            image.to_string_lossy(),
            model.to_string_lossy(),
        );
        rec.image_hash = Some(ContentHash::from_bytes(b"png bytes").to_prefixed_hex());
        rec.model_hash = Some(ContentHash::from_bytes(b"glb bytes").to_prefixed_hex());
        assert!(rec.artifacts_intact());

        std::fs::write(&image, b"tampered").unwrap();
        assert!(!rec.artifacts_intact());

        // Missing file also fails verification
        std::fs::remove_file(&model).unwrap();
        assert!(!rec.artifacts_intact());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reopen_keeps_records() {
        let journal = temp_journal();
        journal.append(record("persisted")).unwrap();
        let path = journal.path().to_path_buf();
        drop(journal);

        let reopened = Journal::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }
}
