//! Built-in rewrite passes.

pub mod call_rewrite;
pub mod docstrings;
pub mod imports;
pub mod mutable_defaults;

use crate::TransformError;
use crate::python::{self, TextEdit};
use tracing::debug;
use tree_sitter::Tree;

/// Shared rewriter harness: parse, collect edits, apply, verify.
///
/// The verify step re-parses the rewritten text and discards it when it no
/// longer parses; syntax preservation is enforced here rather than trusted
/// per pass.
pub(crate) fn rewrite(
    pass: &str,
    source: &str,
    collect: impl FnOnce(&Tree, &str) -> Vec<TextEdit>,
) -> Result<String, TransformError> {
    let Some(tree) = python::parse(source) else {
        return Err(TransformError::Soft(format!("{pass}: parser unavailable")));
    };
    if tree.root_node().has_error() {
        return Err(TransformError::Soft(format!(
            "{pass}: input does not parse; source left unchanged"
        )));
    }

    let edits = collect(&tree, source);
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    let count = edits.len();
    let rewritten = python::apply_edits(source, edits);
    if !python::parses_cleanly(&rewritten) {
        return Err(TransformError::Soft(format!(
            "{pass}: rewrite produced non-parsing output; source left unchanged"
        )));
    }

    debug!(pass, edits = count, "rewrite applied");
    Ok(rewritten)
}
