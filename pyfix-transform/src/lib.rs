//! Transformer contract and the built-in rewrite passes.
//!
//! This crate owns *how* a single file's source text is rewritten. It does
//! not own scheduling, backups, or write-back; that's `pyfix-core`.
//!
//! All built-in rewriters parse with tree-sitter, compute byte-range edits,
//! apply them back-to-front, and re-parse the result. Output that fails to
//! parse is discarded and reported as a soft failure with the original
//! source preserved: a rewriter must never destroy input it cannot safely
//! rewrite.

mod api;
mod external;
mod generator;
mod passes;
pub mod python;

pub use api::{Transformer, TransformError};
pub use external::ExternalWrapper;
pub use generator::TemplateGenerator;
pub use passes::call_rewrite::CallRewriter;
pub use passes::docstrings::DocstringSynthesizer;
pub use passes::imports::UnusedImportRemover;
pub use passes::mutable_defaults::MutableDefaultRepairer;

use std::sync::Arc;

/// The transformers every registry starts with, keyed by registry key.
pub fn builtin_transformers() -> Vec<(&'static str, Arc<dyn Transformer>)> {
    vec![
        ("synthesize_docstrings", Arc::new(DocstringSynthesizer)),
        ("remove_unused_imports", Arc::new(UnusedImportRemover)),
        ("fix_mutable_defaults", Arc::new(MutableDefaultRepairer)),
        (
            "print_to_logging",
            Arc::new(CallRewriter::print_to_logging()),
        ),
        ("module_scaffold", Arc::new(TemplateGenerator::module_scaffold())),
    ]
}
