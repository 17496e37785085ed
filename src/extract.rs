//! Expression-to-local-variable extraction.
//!
//! Given a tree, a source range, a variable name, and a declared type,
//! [`extract`] lifts the expression occupying exactly that range into a new
//! local declaration placed immediately before its enclosing statement, and
//! replaces the original occurrence with a reference to the new variable.
//!
//! The operation has exactly two terminal outcomes: Rejected (no expression
//! matches the range exactly, or the match is already the whole initializer
//! of an existing declaration) returns `false` and leaves the tree untouched;
//! Applied mutates the tree and returns `true`. All analysis happens before
//! the first mutation, so there is no partial-application state. Malformed
//! trees (an expression with no statement ancestor, a child missing from its
//! parent's slot) are programming errors and panic.

use crate::syntax::{NodeId, NodeKind, Range, SyntaxTree, TypeNode};

/// Extract the expression at `range` into `<ty> <name> = <expr>;`.
///
/// The name is taken as-is: collision and shadowing analysis, identifier
/// legality, and assignability of `ty` are the caller's responsibility.
pub fn extract(tree: &mut SyntaxTree, range: Range, name: &str, ty: TypeNode) -> bool {
    let Some(target) = find_expression(tree, tree.root(), range) else {
        return false;
    };
    if is_whole_initializer(tree, target) {
        return false;
    }

    let anchor = enclosing_statement(tree, target);
    let (block, index) = insertion_point(tree, anchor);
    apply(tree, target, block, index, name, ty);
    true
}

/// Finds the expression node whose range equals `range` exactly. Partial
/// overlap never matches, and a range that lands exactly on a statement is
/// not a match either: only expressions are extractable.
fn find_expression(tree: &SyntaxTree, from: NodeId, range: Range) -> Option<NodeId> {
    // Parsed ranges nest, so a subtree whose span does not contain the
    // request cannot hold the match. Synthesized nodes have no range and are
    // searched unconditionally.
    if let Some(r) = tree.range(from) {
        if !r.contains(&range) {
            return None;
        }
    }
    if tree.is_expression(from) && tree.range(from) == Some(range) {
        return Some(from);
    }
    tree.children(from)
        .into_iter()
        .find_map(|child| find_expression(tree, child, range))
}

/// True when `expr` is precisely the initializer of a variable declaration.
/// Such an expression is already bound to a variable; extracting it again
/// would only bind the same value twice. Strict sub-expressions of an
/// initializer do not count.
fn is_whole_initializer(tree: &SyntaxTree, expr: NodeId) -> bool {
    match tree.parent(expr).map(|p| tree.kind(p)) {
        Some(NodeKind::LocalDecl { init, .. }) => *init == expr,
        _ => false,
    }
}

/// Walks parent links to the nearest statement ancestor: the statement the
/// new declaration will be inserted before.
fn enclosing_statement(tree: &SyntaxTree, expr: NodeId) -> NodeId {
    let mut current = expr;
    loop {
        let parent = tree
            .parent(current)
            .expect("malformed tree: expression has no statement ancestor");
        if tree.is_statement(parent) {
            return parent;
        }
        current = parent;
    }
}

/// Resolves where the new declaration goes. A statement already inside a
/// block is preceded in place; a statement that is the bare body of a
/// control construct first gets its body normalized into a one-element
/// block, and insertion happens at that block's front.
fn insertion_point(tree: &mut SyntaxTree, anchor: NodeId) -> (NodeId, usize) {
    let container = tree
        .parent(anchor)
        .expect("malformed tree: statement has no container");

    if let NodeKind::Block { stmts, .. } = tree.kind(container) {
        let index = stmts
            .iter()
            .position(|&s| s == anchor)
            .expect("malformed tree: statement missing from its block");
        return (container, index);
    }

    match tree.kind(container) {
        NodeKind::If { .. } | NodeKind::While { .. } | NodeKind::ForEach { .. } => {}
        other => panic!(
            "malformed tree: {} cannot contain a statement",
            other.type_name()
        ),
    }
    (tree.wrap_body_in_block(container, anchor), 0)
}

/// The single mutating step: substitute a name reference for the matched
/// expression, move the expression into a fresh declaration, and insert the
/// declaration at the resolved point. The expression is never duplicated;
/// detach and reattach are the same edit.
fn apply(
    tree: &mut SyntaxTree,
    target: NodeId,
    block: NodeId,
    index: usize,
    name: &str,
    ty: TypeNode,
) {
    let slot_parent = tree
        .parent(target)
        .expect("malformed tree: matched expression has no parent");

    let reference = tree.alloc(NodeKind::Name(name.to_string()), None);
    tree.replace_expr_child(slot_parent, target, reference);

    let decl = tree.alloc(
        NodeKind::LocalDecl {
            ty,
            name: name.to_string(),
            init: target,
        },
        None,
    );
    tree.set_parent(target, Some(decl));
    tree.insert_stmt(block, index, decl);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;
    use crate::parser::parse_method;
    use crate::syntax::{Position, Primitive};

    fn parse(source: &str) -> SyntaxTree {
        parse_method(source, SourceContext::from_file("test", source)).unwrap()
    }

    fn range(a: (u32, u32), b: (u32, u32)) -> Range {
        Range::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    #[test]
    fn test_match_requires_exact_endpoints() {
        let source = "void f() { g(a.b); }";
        let tree = parse(source);
        // `a.b` occupies columns 14-16 on line 1.
        assert!(find_expression(&tree, tree.root(), range((1, 14), (1, 16))).is_some());
        assert!(find_expression(&tree, tree.root(), range((1, 14), (1, 17))).is_none());
        assert!(find_expression(&tree, tree.root(), range((1, 15), (1, 16))).is_none());
    }

    #[test]
    fn test_statement_range_is_no_match() {
        let source = "void f() { g(a); }";
        let tree = parse(source);
        // Columns 12-16 span the whole statement `g(a);`, not an expression.
        assert!(find_expression(&tree, tree.root(), range((1, 12), (1, 16))).is_none());
    }

    #[test]
    fn test_whole_initializer_is_redundant() {
        let source = "void f() { int n = a + b; }";
        let tree = parse(source);
        let init = find_expression(&tree, tree.root(), range((1, 20), (1, 24))).unwrap();
        assert!(is_whole_initializer(&tree, init));
        // `a` alone is a strict sub-expression of the initializer.
        let lhs = find_expression(&tree, tree.root(), range((1, 20), (1, 20))).unwrap();
        assert!(!is_whole_initializer(&tree, lhs));
    }

    #[test]
    fn test_enclosing_statement_of_condition_operand() {
        let source = "void f() { if (a.b) g(); }";
        let tree = parse(source);
        let cond_operand = find_expression(&tree, tree.root(), range((1, 16), (1, 18))).unwrap();
        let anchor = enclosing_statement(&tree, cond_operand);
        assert!(matches!(tree.kind(anchor), NodeKind::If { .. }));
    }

    #[test]
    fn test_insertion_point_wraps_bare_while_body() {
        let source = "void f() { while (a) g(b.c); }";
        let mut tree = parse(source);
        assert!(extract(
            &mut tree,
            range((1, 24), (1, 26)),
            "x",
            TypeNode::Primitive(Primitive::Int),
        ));
        let method_body = tree.children(tree.root())[0];
        let while_stmt = tree.children(method_body)[0];
        let NodeKind::While { body, .. } = tree.kind(while_stmt) else {
            panic!("expected a while statement");
        };
        let NodeKind::Block { stmts, .. } = tree.kind(*body) else {
            panic!("while body was not normalized into a block");
        };
        assert_eq!(stmts.len(), 2);
        assert!(matches!(tree.kind(stmts[0]), NodeKind::LocalDecl { .. }));
        assert!(matches!(tree.kind(stmts[1]), NodeKind::ExprStmt { .. }));
    }

    #[test]
    fn test_rejection_leaves_tree_untouched() {
        let source = "void f() { g(a); }";
        let mut tree = parse(source);
        let before = tree.clone();
        assert!(!extract(
            &mut tree,
            range((9, 1), (9, 4)),
            "x",
            TypeNode::named("T"),
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_second_extraction_of_same_range_is_rejected() {
        let source = "void f() { g(a.b); }";
        let mut tree = parse(source);
        let r = range((1, 14), (1, 16));
        assert!(extract(&mut tree, r, "x", TypeNode::named("T")));
        // The span no longer exists; the synthesized nodes carry no range.
        assert!(!extract(&mut tree, r, "y", TypeNode::named("T")));
    }
}
