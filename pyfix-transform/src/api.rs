use pyfix_types::StepParams;
use pyfix_types::transformer::{Preview, TransformerInfo};
use thiserror::Error;

/// Failure modes of a single transform call.
///
/// The orchestrator, not the transformer, decides what a diagnostic means:
/// `Soft` is recorded and the original source passes through; `Usage` is a
/// caller contract violation and fatal to the file's run.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The rewrite could not be applied safely; the caller keeps the
    /// original source.
    #[error("{0}")]
    Soft(String),

    /// The caller violated the transformer's contract (e.g. a generator
    /// was handed non-empty input). Not a recoverable condition.
    #[error("usage error: {0}")]
    Usage(String),
}

/// The capability set every rewrite pass implements.
///
/// `can_transform` and `preview` have default implementations so simple
/// transformers only provide metadata and the transform itself.
pub trait Transformer: Send + Sync {
    fn metadata(&self) -> TransformerInfo;

    /// Cheap applicability probe. Must never mutate state; returns `false`
    /// rather than failing when applicability cannot be determined (e.g.
    /// on a parse failure of `source`).
    fn can_transform(&self, _source: &str) -> bool {
        true
    }

    /// Best-effort dry-run description. Must not perform the mutation;
    /// `estimated_changes` is an estimate, not an exact count.
    fn preview(&self, source: &str, _params: &StepParams) -> Preview {
        let info = self.metadata();
        Preview {
            applicable: self.can_transform(source),
            description: info.description,
            estimated_changes: 0,
        }
    }

    /// Rewrite `source`, returning the new content. `params` is the plan
    /// step's opaque configuration, forwarded verbatim.
    fn transform(&self, source: &str, params: &StepParams) -> Result<String, TransformError>;
}
