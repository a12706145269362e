//! Artifact persistence
//!
//! Writes synthesis payloads into the content directory under names derived
//! from the generation time. Second-resolution timestamps collide under rapid
//! repeated runs, so names carry a millisecond clock plus a process-wide
//! monotonic counter.

use atelier_core::{AtelierError, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// The kind of artifact being persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Model,
}

impl ArtifactKind {
    fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Model => "model",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "png",
            ArtifactKind::Model => "glb",
        }
    }
}

/// File-backed store for generated artifacts
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at the given content directory, creating it if
    /// missing.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| AtelierError::StorageError(format!("failed to create {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    /// Persist a payload and return its path.
    ///
    /// Names are unique within the process even for runs in the same
    /// millisecond.
    pub fn write(&self, kind: ArtifactKind, bytes: &[u8]) -> Result<PathBuf> {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let path = self.root.join(format!(
            "{}_{}_{:04}.{}",
            kind.prefix(),
            stamp,
            seq,
            kind.extension()
        ));

        std::fs::write(&path, bytes).map_err(|e| {
            AtelierError::StorageError(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
