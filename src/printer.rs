//! Canonical, whitespace-normalizing printer.
//!
//! Serializes a tree back to source text in one fixed layout: 4-space
//! indentation, `{` on the construct's own line, unbraced control bodies on
//! the following line one level deeper, comments normalized to `// text`,
//! blank lines dropped. Parentheses are re-derived from the tree structure,
//! so grouping survives printing even though the parser keeps no paren nodes.

use crate::syntax::{NodeId, NodeKind, SyntaxTree};

const PREC_PRIMARY: u8 = 9;
const PREC_POSTFIX: u8 = 8;
const PREC_UNARY: u8 = 7;

/// Serialize the tree rooted at its root node. No trailing newline.
pub fn print(tree: &SyntaxTree) -> String {
    let mut out = String::new();
    let root = tree.root();
    match tree.kind(root) {
        NodeKind::Method { .. } => print_method(tree, root, &mut out),
        kind if kind.is_statement() => print_stmt(tree, root, 0, &mut out),
        _ => out.push_str(&expr_to_string(tree, root)),
    }
    while out.ends_with('\n') {
        out.pop();
    }
    out
}

fn line(out: &mut String, level: usize, text: &str) {
    for _ in 0..level {
        out.push_str("    ");
    }
    out.push_str(text);
    out.push('\n');
}

fn comment_line(raw: &str) -> String {
    let content = raw.trim();
    if content.is_empty() {
        "//".to_string()
    } else {
        format!("// {}", content)
    }
}

fn print_method(tree: &SyntaxTree, id: NodeId, out: &mut String) {
    let NodeKind::Method {
        modifiers,
        return_type,
        name,
        params,
        body,
    } = tree.kind(id)
    else {
        unreachable!()
    };

    let mut sig = String::new();
    for m in modifiers {
        sig.push_str(m);
        sig.push(' ');
    }
    sig.push_str(&format!("{} {}(", return_type, name));
    let params: Vec<String> = params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    sig.push_str(&params.join(", "));
    sig.push_str(") {");

    line(out, 0, &sig);
    print_block_contents(tree, *body, 1, out);
    line(out, 0, "}");
}

fn print_block_contents(tree: &SyntaxTree, id: NodeId, level: usize, out: &mut String) {
    let NodeKind::Block {
        stmts,
        orphan_comments,
    } = tree.kind(id)
    else {
        panic!("expected a block, got {}", tree.kind(id).type_name())
    };
    for stmt in stmts {
        print_stmt(tree, *stmt, level, out);
    }
    for c in orphan_comments {
        line(out, level, &comment_line(c));
    }
}

fn print_stmt(tree: &SyntaxTree, id: NodeId, level: usize, out: &mut String) {
    for c in &tree.node(id).leading_comments {
        line(out, level, &comment_line(c));
    }

    match tree.kind(id) {
        NodeKind::Block { .. } => {
            line(out, level, "{");
            print_block_contents(tree, id, level + 1, out);
            line(out, level, "}");
        }

        NodeKind::LocalDecl { ty, name, init } => {
            let text = format!("{} {} = {};", ty, name, expr_to_string(tree, *init));
            line(out, level, &text);
        }

        NodeKind::ExprStmt { expr } => {
            line(out, level, &format!("{};", expr_to_string(tree, *expr)));
        }

        NodeKind::Assign { target, value } => {
            let text = format!(
                "{} = {};",
                expr_to_string(tree, *target),
                expr_to_string(tree, *value)
            );
            line(out, level, &text);
        }

        NodeKind::Return { value } => match value {
            Some(v) => line(out, level, &format!("return {};", expr_to_string(tree, *v))),
            None => line(out, level, "return;"),
        },

        NodeKind::If {
            cond,
            then_body,
            else_body,
        } => {
            let header = format!("if ({})", expr_to_string(tree, *cond));
            if is_block(tree, *then_body) {
                line(out, level, &format!("{} {{", header));
                print_block_contents(tree, *then_body, level + 1, out);
                match else_body {
                    None => line(out, level, "}"),
                    Some(e) if is_block(tree, *e) => {
                        line(out, level, "} else {");
                        print_block_contents(tree, *e, level + 1, out);
                        line(out, level, "}");
                    }
                    Some(e) => {
                        line(out, level, "} else");
                        print_stmt(tree, *e, level + 1, out);
                    }
                }
            } else {
                line(out, level, &header);
                print_stmt(tree, *then_body, level + 1, out);
                match else_body {
                    None => {}
                    Some(e) if is_block(tree, *e) => {
                        line(out, level, "else {");
                        print_block_contents(tree, *e, level + 1, out);
                        line(out, level, "}");
                    }
                    Some(e) => {
                        line(out, level, "else");
                        print_stmt(tree, *e, level + 1, out);
                    }
                }
            }
        }

        NodeKind::While { cond, body } => {
            let header = format!("while ({})", expr_to_string(tree, *cond));
            print_controlled(tree, &header, *body, level, out);
        }

        NodeKind::ForEach {
            elem_type,
            var,
            iterable,
            body,
        } => {
            let header = format!(
                "for ({} {} : {})",
                elem_type,
                var,
                expr_to_string(tree, *iterable)
            );
            print_controlled(tree, &header, *body, level, out);
        }

        other => panic!("not a statement: {}", other.type_name()),
    }
}

fn print_controlled(tree: &SyntaxTree, header: &str, body: NodeId, level: usize, out: &mut String) {
    if is_block(tree, body) {
        line(out, level, &format!("{} {{", header));
        print_block_contents(tree, body, level + 1, out);
        line(out, level, "}");
    } else {
        line(out, level, header);
        print_stmt(tree, body, level + 1, out);
    }
}

fn is_block(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(tree.kind(id), NodeKind::Block { .. })
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn expr_to_string(tree: &SyntaxTree, id: NodeId) -> String {
    expr_with_prec(tree, id, 0)
}

/// Prints `id`, parenthesizing it when its own precedence is below what the
/// surrounding context requires.
fn expr_with_prec(tree: &SyntaxTree, id: NodeId, min: u8) -> String {
    let (text, prec) = match tree.kind(id) {
        NodeKind::Name(name) => (name.clone(), PREC_PRIMARY),
        NodeKind::Literal(text) => (text.clone(), PREC_PRIMARY),

        NodeKind::FieldAccess { receiver, field } => (
            format!("{}.{}", expr_with_prec(tree, *receiver, PREC_POSTFIX), field),
            PREC_POSTFIX,
        ),

        NodeKind::MethodCall {
            receiver,
            name,
            args,
        } => {
            let args = args_to_string(tree, args);
            let text = match receiver {
                Some(r) => format!(
                    "{}.{}({})",
                    expr_with_prec(tree, *r, PREC_POSTFIX),
                    name,
                    args
                ),
                None => format!("{}({})", name, args),
            };
            (text, PREC_POSTFIX)
        }

        NodeKind::ObjectCreation { class, args } => (
            format!("new {}({})", class, args_to_string(tree, args)),
            PREC_POSTFIX,
        ),

        NodeKind::ArrayAccess { array, index } => (
            format!(
                "{}[{}]",
                expr_with_prec(tree, *array, PREC_POSTFIX),
                expr_to_string(tree, *index)
            ),
            PREC_POSTFIX,
        ),

        NodeKind::Unary { op, operand } => (
            // Operand one level tighter so nested unaries keep their parens
            // and never fuse into a `--`/`!!` token.
            format!(
                "{}{}",
                op.as_str(),
                expr_with_prec(tree, *operand, PREC_UNARY + 1)
            ),
            PREC_UNARY,
        ),

        NodeKind::Binary { lhs, op, rhs } => {
            let p = op.precedence();
            let text = format!(
                "{} {} {}",
                expr_with_prec(tree, *lhs, p),
                op.as_str(),
                expr_with_prec(tree, *rhs, p + 1)
            );
            (text, p)
        }

        other => panic!("not an expression: {}", other.type_name()),
    };

    if prec < min {
        format!("({})", text)
    } else {
        text
    }
}

fn args_to_string(tree: &SyntaxTree, args: &[NodeId]) -> String {
    args.iter()
        .map(|a| expr_to_string(tree, *a))
        .collect::<Vec<_>>()
        .join(", ")
}
