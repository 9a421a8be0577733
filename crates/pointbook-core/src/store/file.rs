//! Draft store persisted as a single JSON document on disk.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{push_unique, DraftStore};
use crate::error::{Error, Result};
use crate::models::{Draft, DraftId};

const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DraftDocument {
    #[serde(default = "default_document_version")]
    version: u32,
    #[serde(default)]
    drafts: Vec<Draft>,
}

const fn default_document_version() -> u32 {
    DOCUMENT_VERSION
}

/// Durable store backed by one JSON file.
///
/// Every read-modify-write holds an advisory lock on `<path>.lock`, so
/// separate handles and separate processes never overwrite each other.
/// Writes go to a uniquely named temp file in the same directory and are
/// renamed into place; a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct JsonFileDraftStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileDraftStore {
    /// Opens (or prepares) the store at `path`. The file is created lazily on
    /// the first write; parent directories are created eagerly.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let lock_path = sibling_path(&path, ".lock");
        Ok(Self { path, lock_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<RwLock<File>> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        Ok(RwLock::new(file))
    }

    /// Runs `apply` while holding the exclusive lock.
    fn exclusive<T>(&self, apply: impl FnOnce() -> Result<T>) -> Result<T> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write()?;
        apply()
    }

    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn read_drafts(&self) -> Result<Vec<Draft>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let document = serde_json::from_str::<DraftDocument>(&raw).map_err(|error| {
            Error::Storage(format!(
                "failed to parse draft store at {}: {error}",
                self.path.display()
            ))
        })?;
        if document.version != DOCUMENT_VERSION {
            return Err(Error::Storage(format!(
                "unsupported draft store version {} (expected {DOCUMENT_VERSION})",
                document.version
            )));
        }
        Ok(document.drafts)
    }

    fn write_drafts(&self, drafts: Vec<Draft>) -> Result<()> {
        let document = DraftDocument {
            version: DOCUMENT_VERSION,
            drafts,
        };
        let serialized = serde_json::to_string_pretty(&document)?;

        let mut temp = NamedTempFile::new_in(self.directory())?;
        temp.write_all(serialized.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|error| error.error)?;
        Ok(())
    }

    /// Moves an unreadable document aside so it can still be recovered by hand.
    fn back_up_unreadable(&self, reason: &Error) -> Result<()> {
        let backup = sibling_path(
            &self.path,
            &format!(".{}.bak", chrono::Utc::now().timestamp_millis()),
        );
        std::fs::rename(&self.path, &backup)?;
        tracing::warn!(
            "Cleared unreadable draft store, previous contents kept at {}: {}",
            backup.display(),
            reason
        );
        Ok(())
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl DraftStore for JsonFileDraftStore {
    fn append(&self, draft: Draft) -> Result<()> {
        self.exclusive(|| {
            let mut drafts = self.read_drafts()?;
            push_unique(&mut drafts, draft)?;
            self.write_drafts(drafts)
        })
    }

    fn list(&self) -> Result<Vec<Draft>> {
        let lock = self.lock_file()?;
        let _guard = lock.read()?;
        self.read_drafts()
    }

    fn remove(&self, id: &DraftId) -> Result<bool> {
        self.exclusive(|| {
            let mut drafts = self.read_drafts()?;
            let before = drafts.len();
            drafts.retain(|draft| draft.id != *id);
            if drafts.len() == before {
                return Ok(false);
            }
            self.write_drafts(drafts)?;
            Ok(true)
        })
    }

    /// Succeeds even when the current document cannot be read; an unreadable
    /// document is renamed to `<path>.<millis>.bak` and counts as zero drafts.
    fn clear(&self) -> Result<usize> {
        self.exclusive(|| {
            let removed = match self.read_drafts() {
                Ok(drafts) => drafts.len(),
                Err(error @ Error::Storage(_)) => {
                    self.back_up_unreadable(&error)?;
                    0
                }
                Err(error) => return Err(error),
            };
            self.write_drafts(Vec::new())?;
            Ok(removed)
        })
    }

    fn replace(&self, drafts: Vec<Draft>) -> Result<()> {
        self.exclusive(|| self.write_drafts(drafts))
    }

    fn update(&self, apply: &mut dyn FnMut(Vec<Draft>) -> Vec<Draft>) -> Result<()> {
        self.exclusive(|| {
            let current = self.read_drafts()?;
            self.write_drafts(apply(current))
        })
    }
}
