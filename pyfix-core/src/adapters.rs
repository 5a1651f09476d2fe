//! Default `FileStore` implementations.

use crate::ports::FileStore;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Filesystem-backed store.
#[derive(Debug, Clone, Default)]
pub struct FsFileStore;

impl FileStore for FsFileStore {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        fs::read_to_string(path).with_context(|| format!("read {}", path))
    }

    fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }
}

/// In-memory store for embedding and testing.
#[derive(Debug, Default)]
pub struct MemFileStore {
    files: Mutex<BTreeMap<Utf8PathBuf, String>>,
}

impl MemFileStore {
    pub fn new(files: impl IntoIterator<Item = (Utf8PathBuf, String)>) -> Self {
        Self {
            files: Mutex::new(files.into_iter().collect()),
        }
    }

    pub fn contents(&self, path: &Utf8Path) -> Option<String> {
        self.files.lock().expect("lock files").get(path).cloned()
    }
}

impl FileStore for MemFileStore {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String> {
        self.files
            .lock()
            .expect("lock files")
            .get(path)
            .cloned()
            .with_context(|| format!("read {}", path))
    }

    fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()> {
        self.files
            .lock()
            .expect("lock files")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Utf8Path) -> bool {
        self.files.lock().expect("lock files").contains_key(path)
    }
}
