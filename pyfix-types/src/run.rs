use crate::plan::StepKind;
use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate result of one `(plan, target files)` pipeline run.
///
/// Ephemeral: destroyed after the caller consumes it. Persistence, if any,
/// is a front-end concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub plan_name: String,
    pub dry_run: bool,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    pub files_processed: u64,
    pub files_succeeded: u64,
    pub files_failed: u64,

    /// True when a cooperative cancellation stopped the run before all
    /// target files were processed.
    #[serde(default)]
    pub cancelled: bool,

    /// Ordered per-file logs, in the order files were processed.
    #[serde(default)]
    pub files: Vec<FileRunLog>,
}

impl RunSummary {
    pub fn new(plan_name: impl Into<String>, dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            plan_name: plan_name.into(),
            dry_run,
            started_at: Utc::now(),
            ended_at: None,
            files_processed: 0,
            files_succeeded: 0,
            files_failed: 0,
            cancelled: false,
            files: vec![],
        }
    }
}

/// Per-file record of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRunLog {
    pub path: Utf8PathBuf,
    pub state: FileState,

    #[serde(default)]
    pub steps: Vec<StepOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<Utf8PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FileFailure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    /// Would-be content length delta in bytes; reported even on dry runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_delta: Option<i64>,
}

/// Per-file pipeline state machine.
///
/// `Pending → BackedUp → Succeeded | Failed`; `BackedUp` is entered only
/// when a mutating write is imminent, so read-only outcomes go straight
/// from `Pending` to a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Pending,
    BackedUp,
    Succeeded,
    Failed,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Succeeded | FileState::Failed)
    }
}

/// Outcome of one step applied to one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub kind: StepKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,

    pub status: StepStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub bytes_before: u64,
    pub bytes_after: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step changed the file's content.
    Applied,
    /// The step ran and left the content unchanged.
    NoOp,
    /// The transformer reported a soft failure; content passed through.
    SoftFailed,
    /// The step never ran (earlier fatal failure for this file).
    Skipped,
}

/// Reason a single file's run terminated in `Failed`.
///
/// Always isolated to one file; other files in the batch continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FileFailure {
    /// A step named a plugin the registry could not resolve.
    PluginNotFound { plugin: String },
    /// A step violated a transformer's calling contract (e.g. a generator
    /// was handed non-empty input).
    ContractViolation { message: String },
    /// Reading or writing the target file failed; the original content
    /// was restored from backup where one existed.
    Io { message: String },
}

impl FileFailure {
    pub fn label(&self) -> &'static str {
        match self {
            FileFailure::PluginNotFound { .. } => "plugin_not_found",
            FileFailure::ContractViolation { .. } => "contract_violation",
            FileFailure::Io { .. } => "io",
        }
    }
}
