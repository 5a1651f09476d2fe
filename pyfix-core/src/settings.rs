//! Clap-free settings for pipeline runs.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Execute every step but suppress the final write-back.
    pub dry_run: bool,

    /// Suffix appended to a file's path for its backup.
    pub backup_suffix: String,

    /// Cooperative cancellation flag, checked between files only; the
    /// file in flight finishes its step sequence first.
    pub cancel: Arc<AtomicBool>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            dry_run: true,
            backup_suffix: ".pyfix.bak".to_string(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl RunSettings {
    pub fn apply() -> Self {
        Self {
            dry_run: false,
            ..Self::default()
        }
    }
}
