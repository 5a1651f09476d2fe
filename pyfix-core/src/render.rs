//! Rendering helpers (markdown, unified diff) for human-readable output.

use pyfix_types::run::{FileState, RunSummary, StepStatus};

pub fn render_summary_md(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("# pyfix run\n\n");
    out.push_str(&format!("- Plan: `{}`\n", summary.plan_name));
    out.push_str(&format!("- Dry run: `{}`\n", summary.dry_run));
    out.push_str(&format!(
        "- Files: {} processed, {} succeeded, {} failed\n",
        summary.files_processed, summary.files_succeeded, summary.files_failed
    ));
    if summary.cancelled {
        out.push_str("- Cancelled before all files were processed\n");
    }
    out.push('\n');

    out.push_str("## Files\n\n");
    if summary.files.is_empty() {
        out.push_str("_No files processed._\n");
        return out;
    }

    for log in &summary.files {
        out.push_str(&format!("### {}\n\n", log.path));
        out.push_str(&format!("- State: `{}`\n", state_label(log.state)));
        if let Some(delta) = log.content_delta {
            out.push_str(&format!("- Content delta: {delta:+} bytes\n"));
        }
        if let Some(backup) = &log.backup_path {
            out.push_str(&format!("- Backup: `{backup}`\n"));
        }
        if let Some(failure) = &log.failure {
            out.push_str(&format!("- Failure: {failure:?}\n"));
        }
        out.push('\n');

        for step in &log.steps {
            let plugin = step.plugin_name.as_deref().unwrap_or("-");
            out.push_str(&format!(
                "- step {} `{}` ({}): `{}`",
                step.index,
                step.kind.label(),
                plugin,
                status_label(step.status)
            ));
            if let Some(message) = &step.message {
                out.push_str(&format!(" — {message}"));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

/// Unified diff between one file's original and transformed content.
pub fn render_patch(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- a/{path}\n+++ b/{path}\n"));
    let patch = diffy::create_patch(before, after);
    out.push_str(&diffy::PatchFormatter::new().fmt_patch(&patch).to_string());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn state_label(state: FileState) -> &'static str {
    match state {
        FileState::Pending => "pending",
        FileState::BackedUp => "backed_up",
        FileState::Succeeded => "succeeded",
        FileState::Failed => "failed",
    }
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Applied => "applied",
        StepStatus::NoOp => "no_op",
        StepStatus::SoftFailed => "soft_failed",
        StepStatus::Skipped => "skipped",
    }
}
