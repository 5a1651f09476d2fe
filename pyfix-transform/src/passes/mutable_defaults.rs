use crate::api::{TransformError, Transformer};
use crate::passes;
use crate::python::{self, TextEdit};
use pyfix_types::StepParams;
use pyfix_types::transformer::{Category, Preview, TransformerInfo};
use tree_sitter::{Node, Tree};

/// Repairs the mutable-default-argument pitfall.
///
/// The three unsafe literal defaults (`[]`, `{}`, zero-argument `set()`)
/// are replaced with `None`, and a guard assigning the intended value is
/// prepended to the body, one guard per affected parameter in
/// left-to-right order. Callers who pass a value explicitly are
/// unaffected: the guard only fires on the sentinel.
pub struct MutableDefaultRepairer;

impl Transformer for MutableDefaultRepairer {
    fn metadata(&self) -> TransformerInfo {
        TransformerInfo {
            name: "Mutable default repairer".to_string(),
            description: "Replaces mutable default arguments with a None sentinel plus a guard"
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
            description: format!("{candidates} parameter(s) carry a mutable default"),
            estimated_changes: candidates,
        }
    }

    fn transform(&self, source: &str, _params: &StepParams) -> Result<String, TransformError> {
        passes::rewrite("fix_mutable_defaults", source, collect)
    }
}

struct Repair<'t> {
    name: String,
    original: String,
    value: Node<'t>,
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
        if node.kind() == "function_definition" {
            count += repairs_for(node, source).len() as u64;
        }
    });
    count
}

fn collect(tree: &Tree, source: &str) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    python::visit(tree.root_node(), &mut |node| {
        if node.kind() == "function_definition" {
            edits.extend(function_edits(node, source));
        }
    });
    edits
}

fn function_edits(func: Node, source: &str) -> Vec<TextEdit> {
    let repairs = repairs_for(func, source);
    if repairs.is_empty() {
        return vec![];
    }
    let Some(body) = func.child_by_field_name("body") else {
        return vec![];
    };

    // Single-line bodies cannot hold a guard; rebuild into block form.
    if body.start_position().row == func.start_position().row {
        return rebuild_single_line(func, body, source, &repairs)
            .into_iter()
            .collect();
    }

    let mut edits: Vec<TextEdit> = repairs
        .iter()
        .map(|r| TextEdit::replace(r.value.start_byte(), r.value.end_byte(), "None"))
        .collect();
    match guard_insertion(body, source, &repairs) {
        Some(edit) => edits.push(edit),
        // No usable insertion point: leave the function alone entirely.
        None => return vec![],
    }
    edits
}

fn repairs_for<'t>(func: Node<'t>, source: &str) -> Vec<Repair<'t>> {
    let Some(params) = func.child_by_field_name("parameters") else {
        return vec![];
    };

    let mut repairs = Vec::new();
    for i in 0..params.named_child_count() {
        let Some(param) = params.named_child(i) else {
            continue;
        };
        if !matches!(param.kind(), "default_parameter" | "typed_default_parameter") {
            continue;
        }
        let Some(value) = param.child_by_field_name("value") else {
            continue;
        };
        if !is_mutable_literal(value, source) {
            continue;
        }
        let Some(name) = param.child_by_field_name("name") else {
            continue;
        };
        if name.kind() != "identifier" {
            continue;
        }
        repairs.push(Repair {
            name: python::node_text(&name, source).to_string(),
            original: python::node_text(&value, source).to_string(),
            value,
        });
    }
    repairs
}

/// The three unsafe default shapes: `[]`, `{}`, `set()`.
fn is_mutable_literal(value: Node, source: &str) -> bool {
    match value.kind() {
        "list" | "dictionary" => value.named_child_count() == 0,
        "call" => {
            let Some(callee) = value.child_by_field_name("function") else {
                return false;
            };
            callee.kind() == "identifier"
                && python::node_text(&callee, source) == "set"
                && value
                    .child_by_field_name("arguments")
                    .is_some_and(|args| args.named_child_count() == 0)
        }
        _ => false,
    }
}

fn guard_lines(repairs: &[Repair]) -> Vec<String> {
    let mut lines = Vec::new();
    for r in repairs {
        lines.push(format!("if {} is None:", r.name));
        lines.push(format!("    {} = {}", r.name, r.original));
    }
    lines
}

fn guard_insertion(body: Node, source: &str, repairs: &[Repair]) -> Option<TextEdit> {
    let first = python::first_statement(body)?;
    let lines = guard_lines(repairs);

    // A docstring must stay the first statement to remain a docstring.
    if python::is_string_expression(first) {
        if let Some(stmt) = python::next_statement(body, first) {
            let indent = python::node_indent(&stmt, source)?;
            return Some(TextEdit::insert(
                stmt.start_byte(),
                block_before_statement(&lines, indent),
            ));
        }
        // Docstring is the entire body: append the guards after it.
        let indent = python::node_indent(&first, source)?;
        let le = python::line_end(source, first.end_byte());
        let mut text = String::new();
        for line in &lines {
            text.push('\n');
            text.push_str(indent);
            text.push_str(line);
        }
        return Some(TextEdit::insert(le, text));
    }

    let indent = python::node_indent(&first, source)?;
    Some(TextEdit::insert(
        first.start_byte(),
        block_before_statement(&lines, indent),
    ))
}

fn block_before_statement(lines: &[String], indent: &str) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line);
        text.push('\n');
        text.push_str(indent);
    }
    text
}

fn rebuild_single_line(
    func: Node,
    body: Node,
    source: &str,
    repairs: &[Repair],
) -> Option<TextEdit> {
    let colon = python::find_child_by_kind(&func, ":")?;
    let base_indent = python::node_indent(&func, source)?;
    let body_indent = format!("{base_indent}    ");

    // Apply the None replacements within the signature slice.
    let offset = func.start_byte();
    let signature_edits: Vec<TextEdit> = repairs
        .iter()
        .map(|r| {
            TextEdit::replace(
                r.value.start_byte() - offset,
                r.value.end_byte() - offset,
                "None",
            )
        })
        .collect();
    let signature = python::apply_edits(&source[offset..colon.end_byte()], signature_edits);

    let mut text = signature;
    for line in guard_lines(repairs) {
        text.push('\n');
        text.push_str(&body_indent);
        text.push_str(&line);
    }
    for i in 0..body.named_child_count() {
        if let Some(stmt) = body.named_child(i) {
            text.push('\n');
            text.push_str(&body_indent);
            text.push_str(python::node_text(&stmt, source));
        }
    }
    Some(TextEdit::replace(func.start_byte(), func.end_byte(), text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        MutableDefaultRepairer
            .transform(source, &StepParams::new())
            .expect("transform")
    }

    #[test]
    fn repairs_single_line_function() {
        let out = run("def f(x=[]): x.append(1)\n");

        let expected =
            "def f(x=None):\n    if x is None:\n        x = []\n    x.append(1)\n";
        assert_eq!(out, expected);
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn repairs_list_and_dict_defaults_in_order() {
        let out = run("def f(x=[], y={}):\n    return x, y\n");

        let expected = "def f(x=None, y=None):\n    if x is None:\n        x = []\n    if y is None:\n        y = {}\n    return x, y\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn repairs_empty_set_call() {
        let out = run("def f(seen=set()):\n    seen.add(1)\n");

        let expected =
            "def f(seen=None):\n    if seen is None:\n        seen = set()\n    seen.add(1)\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn leaves_populated_literals_alone() {
        let source = "def f(x=[1], y={\"a\": 1}, z=set([1])):\n    return x, y, z\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn leaves_safe_defaults_alone() {
        let source = "def f(x=None, y=0, z=\"\"):\n    return x, y, z\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn guard_goes_after_docstring() {
        let out = run("def f(x=[]):\n    \"\"\"Doc.\"\"\"\n    return x\n");

        let expected = "def f(x=None):\n    \"\"\"Doc.\"\"\"\n    if x is None:\n        x = []\n    return x\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn docstring_only_body_still_gets_guard() {
        let out = run("def f(x=[]):\n    \"\"\"Doc.\"\"\"\n");

        let expected = "def f(x=None):\n    \"\"\"Doc.\"\"\"\n    if x is None:\n        x = []\n";
        assert_eq!(out, expected);
        assert!(crate::python::parses_cleanly(&out));
    }

    #[test]
    fn repairs_method_with_class_indentation() {
        let out = run("class C:\n    def add(self, items=[]):\n        return items\n");

        let expected = "class C:\n    def add(self, items=None):\n        if items is None:\n            items = []\n        return items\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn typed_default_parameter_is_repaired() {
        let out = run("def f(x: list = []):\n    return x\n");

        let expected =
            "def f(x: list = None):\n    if x is None:\n        x = []\n    return x\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn running_twice_is_idempotent() {
        let once = run("def f(x=[], y={}):\n    return x, y\n");
        let twice = run(&once);
        assert_eq!(twice, once);
    }

    #[test]
    fn soft_fails_on_invalid_input() {
        let err = MutableDefaultRepairer
            .transform("def f(x=[:\n", &StepParams::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::Soft(_)));
    }

    #[test]
    fn preview_counts_affected_parameters() {
        let preview = MutableDefaultRepairer
            .preview("def f(x=[], y={}, z=1):\n    pass\n", &StepParams::new());
        assert!(preview.applicable);
        assert_eq!(preview.estimated_changes, 2);
    }
}
