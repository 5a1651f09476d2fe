//! The pipeline orchestrator: execute a plan's ordered step sequence per
//! target file with backup/rollback, dry-run, and per-file failure
//! isolation.
//!
//! Failure policy: an unresolved plugin, a transformer contract
//! violation, or an I/O error is fatal to *one file's* run; remaining
//! steps for that file are skipped and the rest of the batch continues.
//! A transformer soft failure is recorded as a no-op step and execution
//! proceeds with the unchanged content.

use crate::adapters::FsFileStore;
use crate::ports::FileStore;
use crate::settings::RunSettings;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use pyfix_registry::Registry;
use pyfix_transform::TransformError;
use pyfix_types::plan::{StepKind, TransformationPlan, TransformationStep};
use pyfix_types::run::{
    FileFailure, FileRunLog, FileState, RunSummary, StepOutcome, StepStatus,
};
use sha2::{Digest, Sha256};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

/// Execute `plan` over `target_files` against the real filesystem.
pub fn run(
    plan: &TransformationPlan,
    registry: &Registry,
    target_files: &[Utf8PathBuf],
    settings: &RunSettings,
) -> RunSummary {
    run_with_store(plan, registry, target_files, settings, &FsFileStore)
}

/// Execute `plan` over `target_files` through an explicit `FileStore`.
///
/// Files are processed one at a time in caller order; there is no
/// implicit parallelism because in-place mutation with backup/rollback
/// must not race.
pub fn run_with_store(
    plan: &TransformationPlan,
    registry: &Registry,
    target_files: &[Utf8PathBuf],
    settings: &RunSettings,
    store: &dyn FileStore,
) -> RunSummary {
    let mut summary = RunSummary::new(plan.name.clone(), settings.dry_run);
    info!(
        plan = %plan.name,
        files = target_files.len(),
        dry_run = settings.dry_run,
        "pipeline run started"
    );

    for path in target_files {
        if settings.cancel.load(Ordering::Relaxed) {
            info!(remaining = target_files.len() - summary.files.len(), "run cancelled");
            summary.cancelled = true;
            break;
        }

        let log = process_file(plan, registry, path, settings, store);
        summary.files_processed += 1;
        match log.state {
            FileState::Succeeded => summary.files_succeeded += 1,
            _ => summary.files_failed += 1,
        }
        summary.files.push(log);
    }

    summary.ended_at = Some(Utc::now());
    info!(
        processed = summary.files_processed,
        succeeded = summary.files_succeeded,
        failed = summary.files_failed,
        "pipeline run finished"
    );
    summary
}

/// Run a plan's steps over one in-memory source without touching disk.
///
/// This is the preview path; [`run_with_store`] layers reads, backups,
/// and write-back on top of it.
pub fn transform_source(
    plan: &TransformationPlan,
    registry: &Registry,
    source: &str,
) -> (String, Vec<StepOutcome>, Option<FileFailure>) {
    let mut current = source.to_string();
    let mut steps = Vec::new();
    let mut failure: Option<FileFailure> = None;

    for (index, step) in plan.transformations.iter().enumerate() {
        let bytes_before = current.len() as u64;

        if failure.is_some() {
            steps.push(StepOutcome {
                index,
                kind: step.kind,
                plugin_name: step.plugin_name.clone(),
                status: StepStatus::Skipped,
                message: None,
                bytes_before,
                bytes_after: bytes_before,
            });
            continue;
        }

        let (status, message, next) = execute_step(step, registry, &current);
        if let Some(reason) = message.as_deref() {
            debug!(step = index, status = ?status, reason, "step finished");
        }
        match next {
            StepContent::Unchanged => {}
            StepContent::Replaced(content) => current = content,
            StepContent::Fatal(f) => failure = Some(f),
        }

        steps.push(StepOutcome {
            index,
            kind: step.kind,
            plugin_name: step.plugin_name.clone(),
            status,
            message,
            bytes_before,
            bytes_after: current.len() as u64,
        });
    }

    (current, steps, failure)
}

enum StepContent {
    Unchanged,
    Replaced(String),
    Fatal(FileFailure),
}

fn execute_step(
    step: &TransformationStep,
    registry: &Registry,
    current: &str,
) -> (StepStatus, Option<String>, StepContent) {
    match step.kind {
        StepKind::SimpleReplace => {
            // `find`/`replace` presence is guaranteed at plan load.
            let find = step.params.get("find").and_then(|v| v.as_str()).unwrap_or_default();
            let replace = step
                .params
                .get("replace")
                .and_then(|v| v.as_str())
                .unwrap_or_default();

            if find.is_empty() || !current.contains(find) {
                return (StepStatus::NoOp, None, StepContent::Unchanged);
            }
            (
                StepStatus::Applied,
                None,
                StepContent::Replaced(current.replace(find, replace)),
            )
        }
        StepKind::Custom if step.plugin_name.is_none() => (
            StepStatus::NoOp,
            Some("custom step without plugin; recorded as no-op".to_string()),
            StepContent::Unchanged,
        ),
        _ => {
            let name = step.plugin_name.as_deref().unwrap_or_default();
            let Some(transformer) = registry.resolve(name) else {
                return (
                    StepStatus::Skipped,
                    Some(format!("plugin `{name}` is not registered")),
                    StepContent::Fatal(FileFailure::PluginNotFound {
                        plugin: name.to_string(),
                    }),
                );
            };

            match transformer.transform(current, &step.params) {
                Ok(next) if next == current => (StepStatus::NoOp, None, StepContent::Unchanged),
                Ok(next) => (StepStatus::Applied, None, StepContent::Replaced(next)),
                Err(TransformError::Soft(diagnostic)) => {
                    warn!(plugin = name, %diagnostic, "soft failure; content passes through");
                    (
                        StepStatus::SoftFailed,
                        Some(diagnostic),
                        StepContent::Unchanged,
                    )
                }
                Err(TransformError::Usage(message)) => (
                    StepStatus::Skipped,
                    Some(message.clone()),
                    StepContent::Fatal(FileFailure::ContractViolation { message }),
                ),
            }
        }
    }
}

fn process_file(
    plan: &TransformationPlan,
    registry: &Registry,
    path: &Utf8Path,
    settings: &RunSettings,
    store: &dyn FileStore,
) -> FileRunLog {
    let original = match store.read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path, error = %e, "failed to read target file");
            return FileRunLog {
                path: path.to_path_buf(),
                state: FileState::Failed,
                steps: vec![],
                backup_path: None,
                failure: Some(FileFailure::Io {
                    message: e.to_string(),
                }),
                sha256_before: None,
                sha256_after: None,
                content_delta: None,
            };
        }
    };

    let (transformed, steps, mut failure) = transform_source(plan, registry, &original);
    let changed = transformed != original;
    let mut backup_path = None;

    if failure.is_none() && changed && !settings.dry_run {
        // First mutating write is imminent: Pending → BackedUp. One
        // backup per file per run, never overwritten mid-run.
        let backup = Utf8PathBuf::from(format!("{path}{}", settings.backup_suffix));
        match store.write(&backup, &original) {
            Ok(()) => {
                backup_path = Some(backup);
            }
            Err(e) => {
                warn!(path = %path, error = %e, "backup failed; file untouched");
                failure = Some(FileFailure::Io {
                    message: format!("backup: {e}"),
                });
            }
        }

        if failure.is_none()
            && let Err(e) = store.write(path, &transformed)
        {
            warn!(path = %path, error = %e, "write-back failed; restoring from backup");
            if let Err(restore_err) = store.write(path, &original) {
                warn!(path = %path, error = %restore_err, "rollback write failed");
            }
            failure = Some(FileFailure::Io {
                message: format!("write-back: {e}"),
            });
        }
    }

    let failed = failure.is_some();
    let state = if failed {
        FileState::Failed
    } else {
        debug!(path = %path, changed, "file processed");
        FileState::Succeeded
    };

    let final_content = if failed { &original } else { &transformed };
    FileRunLog {
        path: path.to_path_buf(),
        state,
        steps,
        backup_path,
        failure,
        sha256_before: Some(sha256_hex(original.as_bytes())),
        sha256_after: Some(sha256_hex(final_content.as_bytes())),
        content_delta: (!failed)
            .then(|| transformed.len() as i64 - original.len() as i64),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
