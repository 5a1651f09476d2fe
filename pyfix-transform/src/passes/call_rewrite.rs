use crate::api::{TransformError, Transformer};
use crate::passes;
use crate::python::{self, TextEdit};
use pyfix_types::StepParams;
use pyfix_types::transformer::{Category, Preview, TransformerInfo};
use tree_sitter::{Node, Tree};

/// Rewrites calls to a bare target identifier into calls to a qualified
/// attribute, e.g. `print(...)` → `logging.info(...)`.
///
/// Pure callee substitution: positional and keyword arguments pass through
/// untouched. When at least one substitution occurred and the target
/// module is not already imported, an import statement is inserted as the
/// first top-level statement (after a module docstring, which must stay
/// first to remain a docstring).
pub struct CallRewriter {
    info: TransformerInfo,
    target: String,
    replacement: String,
    import_module: Option<String>,
}

impl CallRewriter {
    pub fn new(
        info: TransformerInfo,
        target: impl Into<String>,
        replacement: impl Into<String>,
        import_module: Option<String>,
    ) -> Self {
        Self {
            info,
            target: target.into(),
            replacement: replacement.into(),
            import_module,
        }
    }

    /// The built-in preset: unconditional console prints become logging
    /// calls.
    pub fn print_to_logging() -> Self {
        Self::new(
            TransformerInfo {
                name: "Print-to-logging rewriter".to_string(),
                description: "Rewrites bare print(...) calls into logging.info(...)".to_string(),
                version: "1.0.0".to_string(),
                author: Some("pyfix".to_string()),
                category: Category::Rewriter,
            },
            "print",
            "logging.info",
            Some("logging".to_string()),
        )
    }

    /// Step params may narrow or redirect the configured rule.
    fn effective<'a>(&'a self, params: &'a StepParams, key: &str, default: &'a str) -> &'a str {
        params.get(key).and_then(|v| v.as_str()).unwrap_or(default)
    }

    fn collect(&self, tree: &Tree, source: &str, params: &StepParams) -> Vec<TextEdit> {
        let target = self.effective(params, "target", &self.target);
        let replacement = self.effective(params, "replacement", &self.replacement);
        let module = params
            .get("import_module")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| self.import_module.clone());

        let root = tree.root_node();
        let mut edits = Vec::new();
        python::visit(root, &mut |node| {
            if node.kind() == "call"
                && let Some(callee) = node.child_by_field_name("function")
                && callee.kind() == "identifier"
                && python::node_text(&callee, source) == target
            {
                edits.push(TextEdit::replace(
                    callee.start_byte(),
                    callee.end_byte(),
                    replacement,
                ));
            }
        });

        if !edits.is_empty()
            && let Some(module) = module
            && !module_imported(root, source, &module)
            && let Some(edit) = import_insertion(root, source, &module)
        {
            edits.push(edit);
        }
        edits
    }

    fn candidate_count(&self, source: &str, params: &StepParams) -> u64 {
        let Some(tree) = python::parse(source) else {
            return 0;
        };
        if tree.root_node().has_error() {
            return 0;
        }
        let target = self.effective(params, "target", &self.target);
        let mut count = 0;
        python::visit(tree.root_node(), &mut |node| {
            if node.kind() == "call"
                && let Some(callee) = node.child_by_field_name("function")
                && callee.kind() == "identifier"
                && python::node_text(&callee, source) == target
            {
                count += 1;
            }
        });
        count
    }
}

impl Transformer for CallRewriter {
    fn metadata(&self) -> TransformerInfo {
        self.info.clone()
    }

    fn can_transform(&self, source: &str) -> bool {
        self.candidate_count(source, &StepParams::new()) > 0
    }

    fn preview(&self, source: &str, params: &StepParams) -> Preview {
        let candidates = self.candidate_count(source, params);
        Preview {
            applicable: candidates > 0,
            description: format!(
                "{candidates} call(s) to `{}` would be rewritten",
                self.effective(params, "target", &self.target)
            ),
            estimated_changes: candidates,
        }
    }

    fn transform(&self, source: &str, params: &StepParams) -> Result<String, TransformError> {
        passes::rewrite("call_rewrite", source, |tree, src| {
            self.collect(tree, src, params)
        })
    }
}

/// Whether any top-level import statement binds `module`.
fn module_imported(root: Node, source: &str, module: &str) -> bool {
    for i in 0..root.named_child_count() {
        if let Some(stmt) = root.named_child(i)
            && stmt.kind() == "import_statement"
            && python::import_bindings(stmt, source).iter().any(|b| b == module)
        {
            return true;
        }
    }
    false
}

fn import_insertion(root: Node, source: &str, module: &str) -> Option<TextEdit> {
    let first = python::first_statement(root)?;

    if python::is_string_expression(first) {
        let le = python::line_end(source, first.end_byte());
        return Some(TextEdit::insert(le, format!("\nimport {module}")));
    }

    let ls = python::line_start(source, first.start_byte());
    Some(TextEdit::insert(ls, format!("import {module}\n")))
}
