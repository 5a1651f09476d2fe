use crate::api::{TransformError, Transformer};
use crate::passes;
use crate::python::{self, TextEdit};
use pyfix_types::StepParams;
use pyfix_types::transformer::{Category, Preview, TransformerInfo};
use std::collections::BTreeSet;
use tree_sitter::{Node, Tree};

/// Removes import statements (and individual import aliases) that are
/// never referenced.
///
/// Two passes over the tree: first collect every identifier occurrence
/// outside import statements, then rewrite each import keeping only the
/// names present in that set. Deliberately conservative:
/// - wildcard imports are always preserved (their usage cannot be proven),
/// - a name that is reassigned locally still counts as a use, so an
///   import shadowed by a variable is never removed.
pub struct UnusedImportRemover;

impl Transformer for UnusedImportRemover {
    fn metadata(&self) -> TransformerInfo {
        TransformerInfo {
            name: "Unused import remover".to_string(),
            description: "Drops imports whose bound names are never referenced".to_string(),
            version: "1.0.0".to_string(),
            author: Some("pyfix".to_string()),
            category: Category::Rewriter,
        }
    }

    fn can_transform(&self, source: &str) -> bool {
        candidate_count(source) > 0
    }

    fn preview(&self, source: &str, _params: &StepParams) -> Preview {
        let candidates = candidate_count(source);
        Preview {
            applicable: candidates > 0,
            description: format!("{candidates} import statement(s) carry unused names"),
            estimated_changes: candidates,
        }
    }

    fn transform(&self, source: &str, _params: &StepParams) -> Result<String, TransformError> {
        passes::rewrite("remove_unused_imports", source, collect)
    }
}

fn candidate_count(source: &str) -> u64 {
    let Some(tree) = python::parse(source) else {
        return 0;
    };
    if tree.root_node().has_error() {
        return 0;
    }
    collect(&tree, source).len() as u64
}

fn collect(tree: &Tree, source: &str) -> Vec<TextEdit> {
    let mut used = BTreeSet::new();
    collect_uses(tree.root_node(), source, &mut used);

    let mut edits = Vec::new();
    python::visit(tree.root_node(), &mut |node| {
        let edit = match node.kind() {
            "import_statement" => rewrite_import(node, source, &used),
            "import_from_statement" => rewrite_from_import(node, source, &used),
            _ => None,
        };
        if let Some(edit) = edit {
            edits.push(edit);
        }
    });
    edits
}

/// Pass 1: identifier occurrences anywhere outside import statements.
///
/// Attribute names (`x.attr`) and keyword-argument names (`f(key=1)`) are
/// not references to a binding; attribute roots are. Store contexts count
/// as uses on purpose (conservative shadowing behavior).
fn collect_uses(node: Node, source: &str, used: &mut BTreeSet<String>) {
    match node.kind() {
        "import_statement" | "import_from_statement" | "future_import_statement" => return,
        "identifier" => {
            if counts_as_use(node) {
                used.insert(python::node_text(&node, source).to_string());
            }
        }
        _ => {}
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_uses(child, source, used);
        }
    }
}

fn counts_as_use(id: Node) -> bool {
    let Some(parent) = id.parent() else {
        return true;
    };
    match parent.kind() {
        "attribute" => parent.child_by_field_name("attribute") != Some(id),
        "keyword_argument" => parent.child_by_field_name("name") != Some(id),
        _ => true,
    }
}

fn rewrite_import(stmt: Node, source: &str, used: &BTreeSet<String>) -> Option<TextEdit> {
    let clauses = name_clauses(stmt);
    let kept: Vec<&str> = clauses
        .iter()
        .filter(|clause| clause_is_used(**clause, source, used))
        .map(|clause| python::node_text(clause, source))
        .collect();

    if kept.len() == clauses.len() {
        return None;
    }
    if kept.is_empty() {
        return Some(statement_deletion(stmt, source));
    }
    Some(TextEdit::replace(
        stmt.start_byte(),
        stmt.end_byte(),
        format!("import {}", kept.join(", ")),
    ))
}

fn rewrite_from_import(stmt: Node, source: &str, used: &BTreeSet<String>) -> Option<TextEdit> {
    // `from m import *`: usage cannot be proven, keep unconditionally.
    if python::find_child_by_kind(&stmt, "wildcard_import").is_some() {
        return None;
    }

    let module = stmt.child_by_field_name("module_name")?;
    let clauses = name_clauses(stmt);
    let kept: Vec<&str> = clauses
        .iter()
        .filter(|clause| clause_is_used(**clause, source, used))
        .map(|clause| python::node_text(clause, source))
        .collect();

    if kept.len() == clauses.len() {
        return None;
    }
    if kept.is_empty() {
        return Some(statement_deletion(stmt, source));
    }
    Some(TextEdit::replace(
        stmt.start_byte(),
        stmt.end_byte(),
        format!(
            "from {} import {}",
            python::node_text(&module, source),
            kept.join(", ")
        ),
    ))
}

fn name_clauses<'t>(stmt: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = stmt.walk();
    stmt.children_by_field_name("name", &mut cursor).collect()
}

fn clause_is_used(clause: Node, source: &str, used: &BTreeSet<String>) -> bool {
    match python::import_clause_binding(clause, source) {
        Some(binding) => used.contains(&binding),
        // Unrecognized clause shape: keep it rather than guess.
        None => true,
    }
}

/// Delete a statement, taking the whole line when the statement is alone
/// on it.
fn statement_deletion(stmt: Node, source: &str) -> TextEdit {
    let ls = python::line_start(source, stmt.start_byte());
    let le = python::line_end(source, stmt.end_byte());

    let prefix_blank = source[ls..stmt.start_byte()]
        .chars()
        .all(|c| c == ' ' || c == '\t');
    let suffix_blank = source[stmt.end_byte()..le]
        .chars()
        .all(|c| c == ' ' || c == '\t' || c == '\r');

    if prefix_blank && suffix_blank {
        let end = if le < source.len() { le + 1 } else { le };
        TextEdit::delete(ls, end)
    } else {
        TextEdit::delete(stmt.start_byte(), stmt.end_byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        UnusedImportRemover
            .transform(source, &StepParams::new())
            .expect("transform")
    }

    #[test]
    fn drops_fully_unused_import_line() {
        let out = run("import os\nimport sys\n\nprint(sys.argv)\n");
        assert_eq!(out, "import sys\n\nprint(sys.argv)\n");
    }

    #[test]
    fn trims_unused_aliases_from_multi_import() {
        let out = run("import os, sys\n\nprint(sys.argv)\n");
        assert_eq!(out, "import sys\n\nprint(sys.argv)\n");
    }

    #[test]
    fn respects_aliased_binding_name() {
        let out = run("import numpy as np\n\nx = np.zeros(3)\n");
        assert_eq!(out, "import numpy as np\n\nx = np.zeros(3)\n");

        let out = run("import numpy as np\n\nx = 1\n");
        assert_eq!(out, "\nx = 1\n");
    }

    #[test]
    fn dotted_import_is_kept_when_root_is_used() {
        let out = run("import os.path\n\nprint(os.path.join(\"a\", \"b\"))\n");
        assert_eq!(out, "import os.path\n\nprint(os.path.join(\"a\", \"b\"))\n");
    }

    #[test]
    fn from_import_keeps_only_used_names() {
        let out = run("from collections import OrderedDict, defaultdict\n\nd = defaultdict(list)\n");
        assert_eq!(out, "from collections import defaultdict\n\nd = defaultdict(list)\n");
    }

    #[test]
    fn from_import_dropped_entirely_when_nothing_used() {
        let out = run("from collections import OrderedDict\n\nx = 1\n");
        assert_eq!(out, "\nx = 1\n");
    }

    #[test]
    fn wildcard_import_is_always_preserved() {
        let source = "from os.path import *\n\nx = 1\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn shadowed_import_is_kept() {
        // `json` is reassigned as a local name; conservatively a use.
        let source = "import json\n\njson = None\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn attribute_name_does_not_count_as_use() {
        // `config.os` references the attribute `os`, not the module.
        let out = run("import os\n\nvalue = config.os\n");
        assert_eq!(out, "\nvalue = config.os\n");
    }

    #[test]
    fn keyword_argument_name_does_not_count_as_use() {
        let out = run("import timeout\n\nfetch(timeout=3)\n");
        assert_eq!(out, "\nfetch(timeout=3)\n");
    }

    #[test]
    fn nested_function_import_is_handled() {
        let out = run("def f():\n    import os\n    return 1\n");
        assert_eq!(out, "def f():\n    return 1\n");
    }

    #[test]
    fn relative_from_import_preserves_module_spelling() {
        let out = run("from .helpers import first, second\n\nfirst()\n");
        assert_eq!(out, "from .helpers import first\n\nfirst()\n");
    }

    #[test]
    fn running_twice_is_idempotent() {
        let source = "import os, sys\nfrom collections import OrderedDict, defaultdict\n\nprint(sys.argv)\nd = defaultdict(list)\n";
        let once = run(source);
        let twice = run(&once);
        assert_eq!(twice, once);
    }

    #[test]
    fn untouched_source_round_trips_exactly() {
        let source = "import sys\n\nprint(sys.argv)\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn soft_fails_on_invalid_input() {
        let err = UnusedImportRemover
            .transform("import (\n", &StepParams::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::Soft(_)));
    }

    #[test]
    fn preview_reports_candidate_statements() {
        let preview =
            UnusedImportRemover.preview("import os\nimport sys\n\nprint(sys.argv)\n", &StepParams::new());
        assert!(preview.applicable);
        assert_eq!(preview.estimated_changes, 1);
    }
}
