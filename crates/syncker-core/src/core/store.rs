//! The index file in the state directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use syncker_domain::DriveIndex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::StateConfig;
use crate::diagnostics;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} exists but is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("unable to create {}: {source}", .path.display())]
    StateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid index file: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotADirectory { .. } | Self::StateDir { .. } => diagnostics::state::STATE_DIR,
            Self::Corrupt { .. } => diagnostics::state::CORRUPT_INDEX,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotADirectory { path } | Self::StateDir { path, .. } | Self::Corrupt { path, .. } => {
                path
            }
        }
    }
}

/// Creates `dir` if needed; an existing non-directory is an error.
pub fn ensure_state_dir(dir: &Path) -> Result<(), StoreError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "creating state directory");
            fs::create_dir_all(dir).map_err(|source| StoreError::StateDir {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(StoreError::StateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Replaces `path` with `contents` via a temp file in the same directory.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage a write in {}", parent.display()))?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    /// Opens the store, creating the state directory on first use.
    pub fn open(state: &StateConfig) -> Result<Self> {
        ensure_state_dir(state.dir())?;
        Ok(Self {
            path: state.index_file(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the index, writing an empty one when none exists yet.
    pub fn load(&self) -> Result<DriveIndex> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let index = DriveIndex::default();
                self.save(&index)?;
                return Ok(index);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let index: DriveIndex =
            serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if !index.links().is_consistent_with(index.tree()) {
            warn!(
                path = %self.path.display(),
                "index links disagree with the indexed files; relink affected files"
            );
        }
        Ok(index)
    }

    pub fn save(&self, index: &DriveIndex) -> Result<()> {
        let contents = serde_json::to_vec_pretty(index)?;
        write_atomic(&self.path, &contents)?;
        debug!(path = %self.path.display(), "saved index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use syncker_domain::{RemotePath, ROOT_ID};
    use tempfile::tempdir;

    use super::*;

    fn state(dir: &Path) -> StateConfig {
        StateConfig {
            dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn first_load_creates_the_default_document() {
        let tmp = tempdir().expect("tempdir");
        let store = IndexStore::open(&state(&tmp.path().join("nested/state"))).expect("open");
        let index = store.load().expect("load");
        assert_eq!(index.tree().root().id(), ROOT_ID);
        let written: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).expect("read")).expect("json");
        assert_eq!(
            written,
            json!({
                "drive_files": { "__gdrive_id": "root", "__gdrive_folder": true },
                "links": {}
            })
        );
    }

    #[test]
    fn documents_are_pretty_printed_with_two_spaces() {
        let tmp = tempdir().expect("tempdir");
        let store = IndexStore::open(&state(tmp.path())).expect("open");
        store.save(&DriveIndex::default()).expect("save");
        let text = fs::read_to_string(store.path()).expect("read");
        assert!(text.starts_with("{\n  \"drive_files\": {\n    \"__gdrive_id\": \"root\""));
    }

    #[test]
    fn load_reads_back_saved_index() {
        let tmp = tempdir().expect("tempdir");
        let store = IndexStore::open(&state(tmp.path())).expect("open");
        fs::write(
            store.path(),
            json!({
                "drive_files": {
                    "__gdrive_id": "root",
                    "__gdrive_folder": true,
                    "Reports": {
                        "__gdrive_id": "r1",
                        "__gdrive_folder": true,
                        "Q1.pdf": { "__gdrive_id": "f1", "__gdrive_folder": false, "link": "/tmp/q1.pdf" }
                    }
                },
                "links": { "/tmp/q1.pdf": "gdrive:/Reports/Q1.pdf" }
            })
            .to_string(),
        )
        .expect("seed");
        let index = store.load().expect("load");
        let node = index
            .tree()
            .resolve(&RemotePath::parse("gdrive:/Reports/Q1.pdf").expect("path"))
            .expect("resolve");
        assert_eq!(node.id(), "f1");
        assert_eq!(index.links().len(), 1);
    }

    #[test]
    fn corrupt_index_is_reported() {
        let tmp = tempdir().expect("tempdir");
        let store = IndexStore::open(&state(tmp.path())).expect("open");
        fs::write(store.path(), "{ not json").expect("seed");
        let err = store.load().expect_err("corrupt");
        let store_err = err.downcast_ref::<StoreError>().expect("store error");
        assert_eq!(store_err.code(), diagnostics::state::CORRUPT_INDEX);
        assert_eq!(
            fs::read_to_string(store.path()).expect("read"),
            "{ not json",
            "corrupt file must be left alone"
        );
    }

    #[test]
    fn state_dir_must_be_a_directory() {
        let tmp = tempdir().expect("tempdir");
        let file = tmp.path().join("state");
        fs::write(&file, "").expect("seed");
        let err = IndexStore::open(&state(&file)).expect_err("file in the way");
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotADirectory { .. })
        ));
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("token.json");
        write_atomic(&path, b"one").expect("first write");
        write_atomic(&path, b"two").expect("second write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        let leftovers = fs::read_dir(tmp.path()).expect("list").count();
        assert_eq!(leftovers, 1);
    }
}
