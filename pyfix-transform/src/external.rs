use crate::api::{TransformError, Transformer};
use fs_err as fs;
use pyfix_types::StepParams;
use pyfix_types::transformer::TransformerInfo;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, warn};

/// Delegates a transform to an external command-line tool.
///
/// The source is written to a temporary file, the tool is invoked as
/// `command [subcommand] [derived args...] [temp_file]`, and the file is
/// read back on success. The temp file is owned by a
/// [`tempfile::NamedTempFile`], so it is removed on every exit path.
///
/// The call blocks until the process exits or the timeout fires; a
/// timeout is a soft failure, never fatal to the run.
pub struct ExternalWrapper {
    info: TransformerInfo,
    command: String,
    subcommand: Option<String>,
    timeout: Duration,
}

impl ExternalWrapper {
    pub fn new(
        info: TransformerInfo,
        command: impl Into<String>,
        subcommand: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            info,
            command: command.into(),
            subcommand,
            timeout,
        }
    }

    fn invoke(&self, args: &[String], file: &Path) -> Result<std::process::Output, String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("build runtime: {e}"))?;

        runtime.block_on(async {
            let mut cmd = tokio::process::Command::new(&self.command);
            if let Some(sub) = &self.subcommand {
                cmd.arg(sub);
            }
            cmd.args(args)
                .arg(file)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            match tokio::time::timeout(self.timeout, cmd.output()).await {
                Ok(Ok(output)) => Ok(output),
                Ok(Err(e)) => Err(format!("spawn {}: {e}", self.command)),
                Err(_) => Err(format!(
                    "{} timed out after {:?}",
                    self.command, self.timeout
                )),
            }
        })
    }
}

impl Transformer for ExternalWrapper {
    fn metadata(&self) -> TransformerInfo {
        self.info.clone()
    }

    fn transform(&self, source: &str, params: &StepParams) -> Result<String, TransformError> {
        let return_original = params
            .get("_return_original_on_error")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let mut file = tempfile::Builder::new()
            .prefix("pyfix-")
            .suffix(".py")
            .tempfile()
            .map_err(|e| TransformError::Soft(format!("create temp file: {e}")))?;
        file.write_all(source.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| TransformError::Soft(format!("write temp file: {e}")))?;

        let args = derive_args(params);
        debug!(command = %self.command, ?args, "invoking external tool");

        match self.invoke(&args, file.path()) {
            Ok(output) if output.status.success() => fs::read_to_string(file.path())
                .map_err(|e| TransformError::Soft(format!("read back temp file: {e}"))),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!(
                    command = %self.command,
                    status = ?output.status.code(),
                    stderr = %stderr.trim(),
                    "external tool failed; keeping original source"
                );
                if return_original {
                    Ok(source.to_string())
                } else {
                    Err(TransformError::Soft(format!(
                        "{} exited with {:?}: {}",
                        self.command,
                        output.status.code(),
                        stderr.trim()
                    )))
                }
            }
            // Spawn failure or timeout: soft either way, per the
            // resource model; the broken output is never returned.
            Err(message) => {
                warn!(command = %self.command, %message, "external tool did not complete");
                Err(TransformError::Soft(message))
            }
        }
    }
}

/// Derive command-line arguments from step params, in sorted key order.
///
/// Booleans become flags, arrays become a flag followed by repeated
/// values, objects become bare `key=value` pairs, everything else becomes
/// `--key value`. Keys starting with `_` are wrapper-internal and never
/// forwarded.
fn derive_args(params: &StepParams) -> Vec<String> {
    let mut args = Vec::new();
    for (key, value) in params {
        if key.starts_with('_') {
            continue;
        }
        let flag = format!("--{key}");
        match value {
            serde_json::Value::Bool(true) => args.push(flag),
            serde_json::Value::Bool(false) => {}
            serde_json::Value::Array(items) => {
                args.push(flag);
                for item in items {
                    args.push(scalar_text(item));
                }
            }
            serde_json::Value::Object(map) => {
                for (k, v) in map {
                    args.push(format!("{k}={}", scalar_text(v)));
                }
            }
            other => {
                args.push(flag);
                args.push(scalar_text(other));
            }
        }
    }
    args
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
