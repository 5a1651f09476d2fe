//! Tree-sitter helpers shared by the built-in rewrite passes.
//!
//! Passes decide on the tree and cut with byte ranges: every rewrite is a
//! set of [`TextEdit`]s applied back-to-front, so original formatting
//! outside the edited spans survives untouched.

use tree_sitter::{Node, Parser, Tree};

/// Parse Python source. `None` when the grammar fails to load or the
/// parser gives up entirely; a returned tree may still contain error
/// nodes (see [`parses_cleanly`]).
pub fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::language()).ok()?;
    parser.parse(source, None)
}

/// True when `source` parses without any error nodes.
pub fn parses_cleanly(source: &str) -> bool {
    parse(source).is_some_and(|tree| !tree.root_node().has_error())
}

pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Find a direct child node by kind.
pub fn find_child_by_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i)
            && child.kind() == kind
        {
            return Some(child);
        }
    }
    None
}

/// Depth-first pre-order visit of every node, each exactly once.
pub fn visit<'t>(node: Node<'t>, f: &mut impl FnMut(Node<'t>)) {
    f(node);
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            visit(child, f);
        }
    }
}

/// First real statement of a block or module, skipping comments.
pub fn first_statement<'t>(body: Node<'t>) -> Option<Node<'t>> {
    for i in 0..body.named_child_count() {
        if let Some(child) = body.named_child(i)
            && child.kind() != "comment"
        {
            return Some(child);
        }
    }
    None
}

/// Statement following `stmt` within the same block, skipping comments.
pub fn next_statement<'t>(body: Node<'t>, stmt: Node<'t>) -> Option<Node<'t>> {
    let mut seen = false;
    for i in 0..body.named_child_count() {
        let Some(child) = body.named_child(i) else {
            continue;
        };
        if child.kind() == "comment" {
            continue;
        }
        if seen {
            return Some(child);
        }
        if child == stmt {
            seen = true;
        }
    }
    None
}

/// Whether a statement is a bare string literal (a docstring position).
pub fn is_string_expression(stmt: Node) -> bool {
    stmt.kind() == "expression_statement"
        && stmt.child(0).is_some_and(|c| c.kind() == "string")
}

/// Byte offset of the start of the line containing `byte`.
pub fn line_start(source: &str, byte: usize) -> usize {
    source[..byte].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Byte offset of the `\n` ending the line containing `byte` (or EOF).
pub fn line_end(source: &str, byte: usize) -> usize {
    source[byte..].find('\n').map(|i| byte + i).unwrap_or(source.len())
}

/// Leading whitespace of the line a node starts on, when the node is the
/// first thing on that line.
pub fn node_indent<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    let ls = line_start(source, node.start_byte());
    let prefix = &source[ls..node.start_byte()];
    prefix
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(prefix)
}

/// Names bound at module scope by an `import` statement.
///
/// `import a.b` binds `a`; `import a.b as c` binds `c`.
pub fn import_bindings(stmt: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = stmt.walk();
    for clause in stmt.children_by_field_name("name", &mut cursor) {
        if let Some(name) = import_clause_binding(clause, source) {
            out.push(name);
        }
    }
    out
}

/// The name one import clause binds: its alias, or the root component of
/// the dotted name.
pub fn import_clause_binding(clause: Node, source: &str) -> Option<String> {
    match clause.kind() {
        "aliased_import" => {
            let alias = clause.child_by_field_name("alias")?;
            Some(node_text(&alias, source).to_string())
        }
        "dotted_name" => {
            let root = clause.named_child(0)?;
            Some(node_text(&root, source).to_string())
        }
        _ => None,
    }
}

/// Identifier node of a parameter, for any parameter shape that binds a
/// single name (`a`, `a: int`, `a=1`, `a: int = 1`, `*args`, `**kwargs`).
pub fn parameter_identifier<'t>(param: Node<'t>) -> Option<Node<'t>> {
    match param.kind() {
        "identifier" => Some(param),
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => {
            find_child_by_kind(&param, "identifier")
        }
        "default_parameter" | "typed_default_parameter" => {
            let name = param.child_by_field_name("name")?;
            (name.kind() == "identifier").then_some(name)
        }
        _ => None,
    }
}

/// One byte-range replacement. An empty range is an insertion; an empty
/// replacement is a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at, at, text)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, "")
    }
}

/// Apply non-overlapping edits to `source`.
///
/// Edits are applied back-to-front so earlier offsets stay valid.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    let mut out = source.to_string();
    for edit in edits {
        out.replace_range(edit.start..edit.end, &edit.replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_python() {
        assert!(parses_cleanly("def foo():\n    return 1\n"));
    }

    #[test]
    fn flags_invalid_python() {
        assert!(!parses_cleanly("def foo(:\n"));
    }

    #[test]
    fn first_statement_skips_comments() {
        let source = "# header\nx = 1\n";
        let tree = parse(source).unwrap();
        let stmt = first_statement(tree.root_node()).unwrap();
        assert_eq!(node_text(&stmt, source), "x = 1");
    }

    #[test]
    fn docstring_position_detection() {
        let source = "def f():\n    \"doc\"\n    return 1\n";
        let tree = parse(source).unwrap();
        let func = first_statement(tree.root_node()).unwrap();
        let body = func.child_by_field_name("body").unwrap();
        let first = first_statement(body).unwrap();
        assert!(is_string_expression(first));
    }

    #[test]
    fn import_bindings_cover_aliases_and_dotted_roots() {
        let source = "import os.path, json as j\n";
        let tree = parse(source).unwrap();
        let stmt = first_statement(tree.root_node()).unwrap();
        assert_eq!(stmt.kind(), "import_statement");
        assert_eq!(import_bindings(stmt, source), vec!["os", "j"]);
    }

    #[test]
    fn parameter_identifier_handles_splats() {
        let source = "def f(a, b: int, c=1, *args, **kwargs): pass\n";
        let tree = parse(source).unwrap();
        let func = first_statement(tree.root_node()).unwrap();
        let params = func.child_by_field_name("parameters").unwrap();

        let mut names = Vec::new();
        for i in 0..params.named_child_count() {
            if let Some(p) = params.named_child(i)
                && let Some(id) = parameter_identifier(p)
            {
                names.push(node_text(&id, source).to_string());
            }
        }
        assert_eq!(names, vec!["a", "b", "c", "args", "kwargs"]);
    }

    #[test]
    fn edits_apply_back_to_front() {
        let out = apply_edits(
            "abcdef",
            vec![TextEdit::replace(0, 1, "X"), TextEdit::delete(3, 5)],
        );
        assert_eq!(out, "Xbcf");
    }

    #[test]
    fn insertion_edit() {
        let out = apply_edits("abc", vec![TextEdit::insert(1, "--")]);
        assert_eq!(out, "a--bc");
    }
}
