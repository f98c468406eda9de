//! JSON snapshots of the books on disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::books::Books;
use crate::error::{OfficeError, OfficeResult};

pub const SNAPSHOT_FORMAT: u32 = 1;

/// On-disk layout; `B` is `&Books` when writing and `Books` when reading.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile<B> {
    format: u32,
    saved_at: DateTime<Utc>,
    books: B,
}

/// A snapshot file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> OfficeResult<Books> {
        let raw = fs::read(&self.path)?;
        let file: SnapshotFile<Books> = serde_json::from_slice(&raw)?;
        if file.format != SNAPSHOT_FORMAT {
            return Err(OfficeError::SnapshotVersion {
                found: file.format,
                expected: SNAPSHOT_FORMAT,
            });
        }
        debug!(path = %self.path.display(), saved_at = %file.saved_at, "snapshot loaded");
        Ok(file.books)
    }

    /// Empty books when the file does not exist yet.
    pub fn load_or_default(&self) -> OfficeResult<Books> {
        if self.exists() {
            self.load()
        } else {
            Ok(Books::new())
        }
    }

    /// Write the books next to the target and rename over it, so readers
    /// never see a half-written file.
    pub fn save(&self, books: &Books) -> OfficeResult<()> {
        let tmp = self.tmp_path();
        let file = SnapshotFile {
            format: SNAPSHOT_FORMAT,
            saved_at: Utc::now(),
            books,
        };
        let json = serde_json::to_vec_pretty(&file)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let written = fs::File::create(&tmp).and_then(|mut f| {
            f.write_all(&json)?;
            f.sync_all()
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        info!(path = %self.path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "books.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokerdesk_catalog::Status;
    use brokerdesk_core::StatusId;

    #[test]
    fn missing_file_loads_empty_books() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("books.json"));
        assert_eq!(store.load_or_default().unwrap(), Books::new());
        assert!(store.load().is_err());
    }

    #[test]
    fn save_then_load_returns_same_books() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("data").join("books.json"));

        let mut books = Books::new();
        let id = StatusId::new();
        books.statuses.upsert(id, Status::new(id, "W realizacji", false, 0).unwrap());
        store.save(&books).unwrap();

        assert_eq!(store.load().unwrap(), books);
        assert!(!dir.path().join("data").join("books.json.tmp").exists());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let future = serde_json::json!({
            "format": 99,
            "saved_at": "2026-01-01T00:00:00Z",
            "books": Books::new(),
        });
        fs::write(&path, serde_json::to_vec(&future).unwrap()).unwrap();

        match SnapshotStore::new(path).load() {
            Err(OfficeError::SnapshotVersion { found: 99, expected: SNAPSHOT_FORMAT }) => {}
            other => panic!("expected SnapshotVersion error, got {other:?}"),
        }
    }
}
