use serde::{Deserialize, Serialize};

/// Display metadata returned by every transformer instance.
///
/// Used for UI listings; plan validation uses registry keys, which are
/// distinct from the human-readable `name` here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerInfo {
    pub name: String,
    pub description: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    pub category: Category,
}

/// Transformer variant taxonomy.
///
/// The category determines whether a transformer consumes source text or
/// produces it from nothing: generators ignore input and error on
/// non-empty input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Rewriter,
    ExternalWrapper,
    Generator,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Rewriter => "rewriter",
            Category::ExternalWrapper => "external-wrapper",
            Category::Generator => "generator",
        }
    }
}

/// Best-effort dry-run description of what a transformer would do.
///
/// Produced by `Transformer::preview`; never the result of performing the
/// mutation. `estimated_changes` is an estimate, not an exact count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preview {
    pub applicable: bool,
    pub description: String,
    pub estimated_changes: u64,
}
