// tests/parser_tests.rs

use hoist::errors::{ErrorKind, SourceContext};
use hoist::parser::parse_method;
use hoist::printer;
use hoist::syntax::{NodeId, NodeKind, Position, Range, SyntaxTree};

fn parse(source: &str) -> SyntaxTree {
    parse_method(source, SourceContext::from_file("test", source)).expect("source should parse")
}

fn range(begin: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(
        Position::new(begin.0, begin.1),
        Position::new(end.0, end.1),
    )
}

// A helper to find the node occupying an exact source range.
fn node_at(tree: &SyntaxTree, from: NodeId, range: Range) -> Option<NodeId> {
    if tree.range(from) == Some(range) {
        return Some(from);
    }
    tree.children(from)
        .into_iter()
        .find_map(|child| node_at(tree, child, range))
}

#[test]
fn test_method_root_starts_at_line_one() {
    let tree = parse("void f() { g(); }");
    let root_range = tree.range(tree.root()).expect("parsed root has a range");
    assert_eq!(root_range.begin, Position::new(1, 1));
    assert_eq!(root_range.end, Position::new(1, 17));
}

#[test]
fn test_nested_argument_spans_are_exact() {
    let source = "void f() {\n    if (m.has(k)) use(m.get(k));\n}";
    let tree = parse(source);

    let call = node_at(&tree, tree.root(), range((2, 23), (2, 30)));
    assert!(
        matches!(call.map(|c| tree.kind(c)), Some(NodeKind::MethodCall { name, .. }) if name == "get")
    );

    let receiver = node_at(&tree, tree.root(), range((2, 23), (2, 23)));
    assert!(matches!(
        receiver.map(|r| tree.kind(r)),
        Some(NodeKind::Name(n)) if n == "m"
    ));
}

#[test]
fn test_unary_span_includes_the_operator() {
    let source = "void f() {\n    if (!m.has(k)) add(k);\n}";
    let tree = parse(source);
    let not = node_at(&tree, tree.root(), range((2, 9), (2, 17)));
    assert!(matches!(
        not.map(|n| tree.kind(n)),
        Some(NodeKind::Unary { .. })
    ));
}

#[test]
fn test_binary_spans_cover_both_operands() {
    let source = "void f() {\n    int n = a + b * c;\n}";
    let tree = parse(source);
    // The whole initializer: `a + b * c`.
    let sum = node_at(&tree, tree.root(), range((2, 13), (2, 21)));
    assert!(matches!(
        sum.map(|n| tree.kind(n)),
        Some(NodeKind::Binary { .. })
    ));
    // Multiplication binds tighter: `b * c` is its own node.
    let product = node_at(&tree, tree.root(), range((2, 17), (2, 21)));
    assert!(matches!(
        product.map(|n| tree.kind(n)),
        Some(NodeKind::Binary { .. })
    ));
    // `a + b` is not a node under this precedence.
    assert!(node_at(&tree, tree.root(), range((2, 13), (2, 17))).is_none());
}

#[test]
fn test_comments_attach_to_the_next_statement() {
    let source = "void f() {\n    //setup\n    init();\n    done();\n    //trailing\n}";
    let tree = parse(source);
    assert_eq!(
        concat!(
            "void f() {\n",
            "    // setup\n",
            "    init();\n",
            "    done();\n",
            "    // trailing\n",
            "}",
        ),
        printer::print(&tree),
    );
}

#[test]
fn test_keyword_prefixed_identifiers_parse() {
    // `newValue`, `iff`, `forEach` must not lex as keywords.
    let source = "void f() {\n    int newValue = iff + forEach;\n}";
    let tree = parse(source);
    assert_eq!(
        "void f() {\n    int newValue = iff + forEach;\n}",
        printer::print(&tree),
    );
}

#[test]
fn test_foreach_parts_are_captured() {
    let tree = parse("void f(Edge[] edges) { for (Edge e : edges) visit(e); }");
    let body = tree.children(tree.root())[0];
    let for_stmt = tree.children(body)[0];
    match tree.kind(for_stmt) {
        NodeKind::ForEach {
            elem_type,
            var,
            iterable,
            body,
        } => {
            assert_eq!(elem_type.to_string(), "Edge");
            assert_eq!(var, "e");
            assert!(matches!(tree.kind(*iterable), NodeKind::Name(n) if n == "edges"));
            assert!(matches!(tree.kind(*body), NodeKind::ExprStmt { .. }));
        }
        other => panic!("expected a for-each statement, got {}", other.type_name()),
    }
}

#[test]
fn test_parent_links_are_consistent() {
    let source = "void f() {\n    if (m.has(k)) use(m.get(k));\n}";
    let tree = parse(source);
    fn check(tree: &SyntaxTree, id: NodeId) {
        for child in tree.children(id) {
            assert_eq!(tree.parent(child), Some(id));
            check(tree, child);
        }
    }
    assert_eq!(tree.parent(tree.root()), None);
    check(&tree, tree.root());
}

#[test]
fn test_missing_semicolon_is_a_parse_error() {
    let source = "void f() { g() }";
    let err = parse_method(source, SourceContext::from_file("test", source)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedConstruct { .. }));
}

#[test]
fn test_unclosed_block_is_a_parse_error() {
    let source = "void f() { g();";
    assert!(parse_method(source, SourceContext::from_file("test", source)).is_err());
}
