use crate::api::{TransformError, Transformer};
use crate::passes;
use crate::python::{self, TextEdit};
use pyfix_types::StepParams;
use pyfix_types::transformer::{Category, Preview, TransformerInfo};
use tree_sitter::{Node, Tree};

/// Synthesizes a templated docstring for every function or method that
/// lacks a leading string-literal statement.
///
/// The template depends on the function name: constructors, `test_`-style
/// tests, and dunder string representations get fixed summaries; everything
/// else gets a generic template listing each non-`self`/`cls` parameter
/// with a TODO placeholder.
pub struct DocstringSynthesizer;

impl Transformer for DocstringSynthesizer {
    fn metadata(&self) -> TransformerInfo {
        TransformerInfo {
            name: "Docstring synthesizer".to_string(),
            description: "Adds a templated docstring to every function or method lacking one"
                .to_string(),
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
            description: format!("{candidates} function(s) lack a docstring"),
            estimated_changes: candidates,
        }
    }

    fn transform(&self, source: &str, _params: &StepParams) -> Result<String, TransformError> {
        passes::rewrite("synthesize_docstrings", source, collect)
    }
}

fn candidate_count(source: &str) -> u64 {
    let Some(tree) = python::parse(source) else {
        return 0;
    };
    if tree.root_node().has_error() {
        return 0;
    }
    let mut count = 0;
    python::visit(tree.root_node(), &mut |node| {
        if node.kind() == "function_definition" && synthesis_edit(node, source).is_some() {
            count += 1;
        }
    });
    count
}

fn collect(tree: &Tree, source: &str) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    // Pre-order visit reaches nested definitions exactly once each.
    python::visit(tree.root_node(), &mut |node| {
        if node.kind() == "function_definition"
            && let Some(edit) = synthesis_edit(node, source)
        {
            edits.push(edit);
        }
    });
    edits
}

fn synthesis_edit(func: Node, source: &str) -> Option<TextEdit> {
    let body = func.child_by_field_name("body")?;
    let first = python::first_statement(body)?;
    if python::is_string_expression(first) {
        return None;
    }

    let name_node = func.child_by_field_name("name")?;
    let name = python::node_text(&name_node, source);

    // Single-line bodies get a compact inline docstring.
    if body.start_position().row == func.start_position().row {
        let summary = summary_for(func, name, source)
            .unwrap_or_else(|| format!("TODO: Describe {name}."));
        return Some(TextEdit::insert(
            first.start_byte(),
            format!("\"\"\"{summary}\"\"\"; "),
        ));
    }

    let indent = python::node_indent(&first, source)?;
    let lines = template_lines(func, name, source);

    let mut text = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            text.push('\n');
            if !line.is_empty() {
                text.push_str(indent);
            }
        }
        text.push_str(line);
    }
    text.push('\n');
    text.push_str(indent);
    Some(TextEdit::insert(first.start_byte(), text))
}

fn template_lines(func: Node, name: &str, source: &str) -> Vec<String> {
    if let Some(summary) = summary_for(func, name, source) {
        return vec![format!("\"\"\"{summary}\"\"\"")];
    }

    let params = documented_params(func, source);
    if params.is_empty() {
        return vec![format!("\"\"\"TODO: Describe {name}.\"\"\"")];
    }

    let mut lines = vec![
        format!("\"\"\"TODO: Describe {name}."),
        String::new(),
        "Args:".to_string(),
    ];
    for param in params {
        lines.push(format!("    {param}: TODO."));
    }
    lines.push("\"\"\"".to_string());
    lines
}

/// Fixed summary for name shapes with a known meaning; `None` selects the
/// generic parameter-listing template.
fn summary_for(func: Node, name: &str, source: &str) -> Option<String> {
    match name {
        "__init__" | "__new__" => Some(match enclosing_class_name(func, source) {
            Some(class) => format!("Initializes a new {class} instance."),
            None => "Initializes a new instance.".to_string(),
        }),
        "__str__" | "__repr__" => {
            Some("Returns a string representation of the object.".to_string())
        }
        "test" => Some("Unit test.".to_string()),
        _ => name
            .strip_prefix("test_")
            .map(|rest| format!("Unit test for {}.", rest.replace('_', " "))),
    }
}

/// Parameters worth documenting: everything except `self`/`cls`, with
/// splat collectors rendered as `*args` / `**kwargs`.
fn documented_params(func: Node, source: &str) -> Vec<String> {
    let Some(params) = func.child_by_field_name("parameters") else {
        return vec![];
    };

    let mut out = Vec::new();
    for i in 0..params.named_child_count() {
        let Some(param) = params.named_child(i) else {
            continue;
        };
        let Some(id) = python::parameter_identifier(param) else {
            continue;
        };
        let name = python::node_text(&id, source);
        if name == "self" || name == "cls" {
            continue;
        }
        out.push(match param.kind() {
            "list_splat_pattern" => format!("*{name}"),
            "dictionary_splat_pattern" => format!("**{name}"),
            _ => name.to_string(),
        });
    }
    out
}

fn enclosing_class_name(func: Node, source: &str) -> Option<String> {
    let mut current = func.parent();
    while let Some(node) = current {
        match node.kind() {
            "class_definition" => {
                let name = node.child_by_field_name("name")?;
                return Some(python::node_text(&name, source).to_string());
            }
            // A nested function's constructor-ness does not reach past the
            // enclosing function.
            "function_definition" => return None,
            _ => {}
        }
        current = node.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        DocstringSynthesizer
            .transform(source, &StepParams::new())
            .expect("transform")
    }

    #[test]
    fn adds_generic_docstring_with_parameter_listing() {
        let out = run("def add(a, b):\n    return a + b\n");

        let expected = "def add(a, b):\n    \"\"\"TODO: Describe add.\n\n    Args:\n        a: TODO.\n        b: TODO.\n    \"\"\"\n    return a + b\n";
        assert_eq!(out, expected);
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn leaves_documented_function_untouched() {
        let source = "def g(): \"doc\"; return 1\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn leaves_triple_quoted_docstring_untouched() {
        let source = "def g():\n    \"\"\"Existing.\"\"\"\n    return 1\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn constructor_gets_instance_template_with_class_name() {
        let out = run("class Point:\n    def __init__(self, x):\n        self.x = x\n");
        assert!(out.contains("\"\"\"Initializes a new Point instance.\"\"\""));
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn test_prefix_gets_unit_test_template() {
        let out = run("def test_parse_header():\n    assert True\n");
        assert!(out.contains("\"\"\"Unit test for parse header.\"\"\""));
    }

    #[test]
    fn repr_gets_fixed_template() {
        let out = run("class A:\n    def __repr__(self):\n        return \"A\"\n");
        assert!(out.contains("\"\"\"Returns a string representation of the object.\"\"\""));
    }

    #[test]
    fn splat_parameters_are_listed() {
        let out = run("def call(fn, *args, **kwargs):\n    return fn(*args, **kwargs)\n");
        assert!(out.contains("        fn: TODO."));
        assert!(out.contains("        *args: TODO."));
        assert!(out.contains("        **kwargs: TODO."));
    }

    #[test]
    fn nested_functions_each_get_exactly_one_docstring() {
        let out = run("def outer():\n    def inner():\n        return 1\n    return inner\n");

        assert_eq!(out.matches("TODO: Describe outer.").count(), 1);
        assert_eq!(out.matches("TODO: Describe inner.").count(), 1);
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn single_line_body_gets_inline_docstring() {
        let out = run("def g(): return 1\n");
        assert_eq!(out, "def g(): \"\"\"TODO: Describe g.\"\"\"; return 1\n");
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn soft_fails_on_invalid_input() {
        let err = DocstringSynthesizer
            .transform("def broken(:\n", &StepParams::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::Soft(_)));
    }

    #[test]
    fn running_twice_is_idempotent() {
        let once = run("def add(a, b):\n    return a + b\n");
        let twice = run(&once);
        assert_eq!(twice, once);
    }

    #[test]
    fn preview_counts_candidates_without_mutating() {
        let source = "def a():\n    pass\n\ndef b():\n    \"doc\"\n";
        let preview = DocstringSynthesizer.preview(source, &StepParams::new());
        assert!(preview.applicable);
        assert_eq!(preview.estimated_changes, 1);
    }

    #[test]
    fn can_transform_is_false_on_parse_failure() {
        assert!(!DocstringSynthesizer.can_transform("def broken(:\n"));
    }
}
