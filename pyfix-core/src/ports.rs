//! Port traits abstracting all file I/O away from the pipeline.

use camino::Utf8Path;

/// File access used by the orchestrator for reads, write-back, backups,
/// and rollback.
pub trait FileStore {
    fn read_to_string(&self, path: &Utf8Path) -> anyhow::Result<String>;
    fn write(&self, path: &Utf8Path, contents: &str) -> anyhow::Result<()>;
    fn exists(&self, path: &Utf8Path) -> bool;
}
