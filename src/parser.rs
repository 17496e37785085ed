//! Parser for the Java-like statement subset.
//!
//! Converts source text into an arena [`SyntaxTree`] with exact source
//! location tracking. Purely syntactic: no name resolution, no type checking.
//! Every parsed node carries the 1-indexed, end-inclusive [`Range`] it
//! occupied in the source, which is what the extraction engine matches
//! requests against.

use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use std::iter::Peekable;

use crate::errors::{ErrorKind, HoistError, SourceContext};
use crate::syntax::{
    BinaryOp, NodeId, NodeKind, Param, Position, Primitive, Range, SyntaxTree, TypeNode, UnaryOp,
};

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct HoistParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a single method declaration into a syntax tree.
pub fn parse_method(source: &str, ctx: SourceContext) -> Result<SyntaxTree, HoistError> {
    let mut pairs = HoistParser::parse(Rule::program, source)
        .map_err(|e| convert_parse_error(e, &ctx))?;

    let program = pairs.next().unwrap(); // pest guarantees the program rule exists
    let method = program
        .into_inner()
        .find(|p| p.as_rule() == Rule::method_decl)
        .unwrap(); // grammar guarantees a method declaration

    let lines = LineIndex::new(source);
    let mut tree = SyntaxTree::new();
    let root = build_method(method, &mut tree, &lines, &ctx)?;
    tree.set_root(root);
    Ok(tree)
}

// ============================================================================
// SOURCE POSITIONS
// ============================================================================

struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// 1-indexed position of the character starting at byte `offset`.
    fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&s| s <= offset);
        let start = self.line_starts[line - 1];
        let column = self.source[start..offset].chars().count() + 1;
        Position::new(line as u32, column as u32)
    }

    /// Range covering a pest span, with the inclusive-end convention.
    fn range_of(&self, span: pest::Span<'_>) -> Range {
        let begin = self.position(span.start());
        let last = span
            .as_str()
            .chars()
            .next_back()
            .map_or(span.start(), |c| span.end() - c.len_utf8());
        Range::new(begin, self.position(last))
    }
}

// ============================================================================
// DECLARATION AND STATEMENT BUILDERS
// ============================================================================

/// Points every child of `id` back at `id`. Builders call this once the
/// node's child links are in place.
fn adopt(tree: &mut SyntaxTree, id: NodeId) {
    for child in tree.children(id) {
        tree.set_parent(child, Some(id));
    }
}

fn build_method(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let range = lines.range_of(pair.as_span());
    let mut modifiers = Vec::new();
    let mut return_type = None;
    let mut name = None;
    let mut params = Vec::new();
    let mut body = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::modifier => modifiers.push(p.as_str().to_string()),
            Rule::ty => return_type = Some(build_type(&p)),
            Rule::ident => name = Some(p.as_str().to_string()),
            Rule::param_list => {
                for param in p.into_inner() {
                    let mut parts = param.into_inner();
                    let ty = build_type(&parts.next().unwrap());
                    let pname = parts.next().unwrap().as_str().to_string();
                    params.push(Param { ty, name: pname });
                }
            }
            Rule::block => body = Some(build_block(p, tree, lines, ctx)?),
            _ => {}
        }
    }

    let id = tree.alloc(
        NodeKind::Method {
            modifiers,
            return_type: return_type.unwrap(), // grammar guarantees a return type
            name: name.unwrap(),               // grammar guarantees a name
            params,
            body: body.unwrap(), // grammar guarantees a body block
        },
        Some(range),
    );
    adopt(tree, id);
    Ok(id)
}

fn build_type(pair: &Pair<Rule>) -> TypeNode {
    // `ty` is non-atomic, so whitespace consumed before its failing optional
    // suffixes ends up inside the span. Trim it off the captured text.
    let text = pair.as_str().trim_end();
    match Primitive::from_str(text) {
        Some(p) => TypeNode::Primitive(p),
        None => TypeNode::Named(text.to_string()),
    }
}

fn build_block(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let range = lines.range_of(pair.as_span());
    let block = tree.alloc(
        NodeKind::Block {
            stmts: Vec::new(),
            orphan_comments: Vec::new(),
        },
        Some(range),
    );

    // Comments accumulate until the next statement claims them; whatever is
    // left at the closing brace belongs to the block itself.
    let mut pending: Vec<String> = Vec::new();
    let mut stmts = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::line_comment => pending.push(p.as_str()[2..].to_string()),
            Rule::stmt => {
                let id = build_stmt(p, tree, lines, ctx)?;
                tree.node_mut(id).leading_comments = std::mem::take(&mut pending);
                tree.set_parent(id, Some(block));
                stmts.push(id);
            }
            _ => {}
        }
    }

    match &mut tree.node_mut(block).kind {
        NodeKind::Block {
            stmts: slot,
            orphan_comments,
        } => {
            *slot = stmts;
            *orphan_comments = pending;
        }
        _ => unreachable!(),
    }
    Ok(block)
}

fn build_stmt(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let inner = pair.into_inner().next().unwrap(); // grammar guarantees one variant
    let range = lines.range_of(inner.as_span());

    match inner.as_rule() {
        Rule::local_decl => {
            let mut parts = inner.into_inner();
            let ty = build_type(&parts.next().unwrap());
            let name = parts.next().unwrap().as_str().to_string();
            let init = build_expr(parts.next().unwrap(), tree, lines, ctx)?;
            let id = tree.alloc(NodeKind::LocalDecl { ty, name, init }, Some(range));
            adopt(tree, id);
            Ok(id)
        }

        Rule::assign_stmt => {
            let mut parts = inner.into_inner();
            let target = build_expr(parts.next().unwrap(), tree, lines, ctx)?;
            let value = build_expr(parts.next().unwrap(), tree, lines, ctx)?;
            let id = tree.alloc(NodeKind::Assign { target, value }, Some(range));
            adopt(tree, id);
            Ok(id)
        }

        Rule::expr_stmt => {
            let expr = build_expr(inner.into_inner().next().unwrap(), tree, lines, ctx)?;
            let id = tree.alloc(NodeKind::ExprStmt { expr }, Some(range));
            adopt(tree, id);
            Ok(id)
        }

        Rule::if_stmt => {
            let mut cond = None;
            let mut bodies = Vec::new();
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::expr => cond = Some(build_expr(p, tree, lines, ctx)?),
                    Rule::stmt => bodies.push(build_stmt(p, tree, lines, ctx)?),
                    _ => {}
                }
            }
            let mut bodies = bodies.into_iter();
            let id = tree.alloc(
                NodeKind::If {
                    cond: cond.unwrap(), // grammar guarantees a condition
                    then_body: bodies.next().unwrap(),
                    else_body: bodies.next(),
                },
                Some(range),
            );
            adopt(tree, id);
            Ok(id)
        }

        Rule::while_stmt => {
            let mut parts = inner.into_inner().filter(|p| {
                matches!(p.as_rule(), Rule::expr | Rule::stmt)
            });
            let cond = build_expr(parts.next().unwrap(), tree, lines, ctx)?;
            let body = build_stmt(parts.next().unwrap(), tree, lines, ctx)?;
            let id = tree.alloc(NodeKind::While { cond, body }, Some(range));
            adopt(tree, id);
            Ok(id)
        }

        Rule::foreach_stmt => {
            let mut elem_type = None;
            let mut var = None;
            let mut iterable = None;
            let mut body = None;
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::ty => elem_type = Some(build_type(&p)),
                    Rule::ident => var = Some(p.as_str().to_string()),
                    Rule::expr => iterable = Some(build_expr(p, tree, lines, ctx)?),
                    Rule::stmt => body = Some(build_stmt(p, tree, lines, ctx)?),
                    _ => {}
                }
            }
            let id = tree.alloc(
                NodeKind::ForEach {
                    elem_type: elem_type.unwrap(), // grammar guarantees all four parts
                    var: var.unwrap(),
                    iterable: iterable.unwrap(),
                    body: body.unwrap(),
                },
                Some(range),
            );
            adopt(tree, id);
            Ok(id)
        }

        Rule::return_stmt => {
            let value = match inner.into_inner().find(|p| p.as_rule() == Rule::expr) {
                Some(p) => Some(build_expr(p, tree, lines, ctx)?),
                None => None,
            };
            let id = tree.alloc(NodeKind::Return { value }, Some(range));
            adopt(tree, id);
            Ok(id)
        }

        Rule::block => build_block(inner, tree, lines, ctx),

        rule => Err(unexpected(ctx, "statement", rule, range, lines)),
    }
}

// ============================================================================
// EXPRESSION BUILDERS
// ============================================================================

fn build_expr(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let mut rest = pair.into_inner().peekable();
    let first = rest.next().unwrap(); // grammar guarantees a leading operand
    let lhs = build_unary(first, tree, lines, ctx)?;
    climb(lhs, 0, &mut rest, tree, lines, ctx)
}

/// Precedence climbing over the flat `unary (bin_op unary)*` sequence.
fn climb(
    mut lhs: NodeId,
    min_prec: u8,
    rest: &mut Peekable<Pairs<Rule>>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    while let Some(op) = rest.peek().map(|p| bin_op_from(p.as_str())) {
        let prec = op.precedence();
        if prec < min_prec {
            break;
        }
        rest.next();
        let operand = rest.next().unwrap(); // grammar guarantees an operand after an operator
        let mut rhs = build_unary(operand, tree, lines, ctx)?;
        while let Some(next_prec) = rest.peek().map(|p| bin_op_from(p.as_str()).precedence()) {
            if next_prec <= prec {
                break;
            }
            rhs = climb(rhs, prec + 1, rest, tree, lines, ctx)?;
        }
        let range = join_ranges(tree.range(lhs), tree.range(rhs));
        let id = tree.alloc(NodeKind::Binary { lhs, op, rhs }, range);
        adopt(tree, id);
        lhs = id;
    }
    Ok(lhs)
}

fn bin_op_from(text: &str) -> BinaryOp {
    match text {
        "||" => BinaryOp::Or,
        "&&" => BinaryOp::And,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        other => unreachable!("grammar admits no operator {:?}", other),
    }
}

fn join_ranges(a: Option<Range>, b: Option<Range>) -> Option<Range> {
    Some(Range::new(a?.begin, b?.end))
}

fn build_unary(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let mut ops = Vec::new();
    let mut node = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::un_op => ops.push(p),
            Rule::postfix => node = Some(build_postfix(p, tree, lines, ctx)?),
            _ => {}
        }
    }
    let mut node = node.unwrap(); // grammar guarantees an operand

    for op_pair in ops.into_iter().rev() {
        let op = match op_pair.as_str() {
            "!" => UnaryOp::Not,
            "-" => UnaryOp::Neg,
            other => unreachable!("grammar admits no unary operator {:?}", other),
        };
        let begin = lines.position(op_pair.as_span().start());
        let range = tree.range(node).map(|r| Range::new(begin, r.end));
        let id = tree.alloc(NodeKind::Unary { op, operand: node }, range);
        adopt(tree, id);
        node = id;
    }
    Ok(node)
}

fn build_postfix(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let mut inner = pair.into_inner();
    let mut node = build_primary(inner.next().unwrap(), tree, lines, ctx)?;

    for op in inner {
        let op_range = lines.range_of(op.as_span());
        let range = tree.range(node).map(|r| Range::new(r.begin, op_range.end));
        let suffix = op.into_inner().next().unwrap(); // postfix_op wraps one variant
        let kind = match suffix.as_rule() {
            Rule::call_suffix => {
                let mut parts = suffix.into_inner();
                let name = parts.next().unwrap().as_str().to_string();
                let args = build_call_args(parts.next().unwrap(), tree, lines, ctx)?;
                NodeKind::MethodCall {
                    receiver: Some(node),
                    name,
                    args,
                }
            }
            Rule::field_suffix => NodeKind::FieldAccess {
                receiver: node,
                field: suffix.into_inner().next().unwrap().as_str().to_string(),
            },
            Rule::index_suffix => NodeKind::ArrayAccess {
                array: node,
                index: build_expr(suffix.into_inner().next().unwrap(), tree, lines, ctx)?,
            },
            rule => {
                return Err(unexpected(
                    ctx,
                    "postfix operator",
                    rule,
                    range.unwrap_or(op_range),
                    lines,
                ))
            }
        };
        let id = tree.alloc(kind, range);
        adopt(tree, id);
        node = id;
    }
    Ok(node)
}

fn build_primary(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<NodeId, HoistError> {
    let inner = pair.into_inner().next().unwrap(); // grammar guarantees one variant
    let range = lines.range_of(inner.as_span());

    match inner.as_rule() {
        Rule::literal => Ok(tree.alloc(NodeKind::Literal(inner.as_str().to_string()), Some(range))),

        Rule::ident => Ok(tree.alloc(NodeKind::Name(inner.as_str().to_string()), Some(range))),

        Rule::ident_call => {
            let mut parts = inner.into_inner();
            let name = parts.next().unwrap().as_str().to_string();
            let args = build_call_args(parts.next().unwrap(), tree, lines, ctx)?;
            let id = tree.alloc(
                NodeKind::MethodCall {
                    receiver: None,
                    name,
                    args,
                },
                Some(range),
            );
            adopt(tree, id);
            Ok(id)
        }

        Rule::creation => {
            let mut class = None;
            let mut args = Vec::new();
            for p in inner.into_inner() {
                match p.as_rule() {
                    Rule::ty => class = Some(build_type(&p)),
                    Rule::call_args => args = build_call_args(p, tree, lines, ctx)?,
                    _ => {}
                }
            }
            let id = tree.alloc(
                NodeKind::ObjectCreation {
                    class: class.unwrap(), // grammar guarantees a class type
                    args,
                },
                Some(range),
            );
            adopt(tree, id);
            Ok(id)
        }

        // Parentheses group but are not represented as nodes; the inner
        // expression keeps its own exact range.
        Rule::paren_expr => build_expr(inner.into_inner().next().unwrap(), tree, lines, ctx),

        rule => Err(unexpected(ctx, "expression", rule, range, lines)),
    }
}

fn build_call_args(
    pair: Pair<Rule>,
    tree: &mut SyntaxTree,
    lines: &LineIndex,
    ctx: &SourceContext,
) -> Result<Vec<NodeId>, HoistError> {
    pair.into_inner()
        .map(|p| build_expr(p, tree, lines, ctx))
        .collect()
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn unexpected(
    ctx: &SourceContext,
    expected: &str,
    found: Rule,
    range: Range,
    lines: &LineIndex,
) -> HoistError {
    // Recover a byte offset for the diagnostic label from the line index.
    let offset = lines.line_starts[range.begin.line as usize - 1] + range.begin.column as usize - 1;
    HoistError::parse(
        ErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: format!("{:?}", found),
        },
        ctx,
        (offset, 0).into(),
    )
}

fn convert_parse_error(error: pest::error::Error<Rule>, ctx: &SourceContext) -> HoistError {
    let span: miette::SourceSpan = match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, 0).into(),
        pest::error::InputLocation::Span((start, end)) => (start, end - start).into(),
    };

    let rendered = error.to_string();
    let construct = if rendered.contains("expected \"}\"") {
        "missing closing brace"
    } else if rendered.contains("expected \")\"") {
        "missing closing parenthesis"
    } else if rendered.contains("expected \";\"") {
        "missing semicolon"
    } else {
        "syntax error"
    };

    HoistError::parse(
        ErrorKind::MalformedConstruct {
            construct: construct.to_string(),
        },
        ctx,
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<SyntaxTree, HoistError> {
        parse_method(source, SourceContext::from_file("test", source))
    }

    #[test]
    fn test_minimal_method() {
        let tree = parse("void f() { }").unwrap();
        assert!(matches!(
            tree.kind(tree.root()),
            NodeKind::Method { name, .. } if name == "f"
        ));
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        assert!(parse("void f() {").is_err());
    }

    #[test]
    fn test_type_text_carries_no_trailing_space() {
        let tree = parse("Graph f(Edge[] edges) { Graph graph = g(); int n = 0; }").unwrap();
        let NodeKind::Method {
            return_type,
            params,
            body,
            ..
        } = tree.kind(tree.root())
        else {
            panic!("expected a method root");
        };
        assert_eq!(*return_type, TypeNode::named("Graph"));
        assert_eq!(params[0].ty, TypeNode::named("Edge[]"));

        let stmts = tree.children(*body);
        assert!(matches!(
            tree.kind(stmts[0]),
            NodeKind::LocalDecl { ty, .. } if *ty == TypeNode::named("Graph")
        ));
        // Primitives must round-trip through Primitive::from_str, which an
        // untrimmed "int " would miss.
        assert!(matches!(
            tree.kind(stmts[1]),
            NodeKind::LocalDecl { ty: TypeNode::Primitive(Primitive::Int), .. }
        ));
    }

    #[test]
    fn test_field_access_range_is_exact() {
        let source = "void f() { int n = edges.length; }";
        let tree = parse(source).unwrap();
        let range = Range::new(Position::new(1, 20), Position::new(1, 31));
        let found = tree
            .children(tree.root())
            .iter()
            .flat_map(|&b| tree.children(b))
            .flat_map(|s| tree.children(s))
            .find(|&e| tree.range(e) == Some(range));
        assert!(found.is_some(), "expected edges.length at {:?}", range);
    }

    #[test]
    fn test_bare_if_body_is_not_a_block() {
        let tree = parse("void f() { if (a) g(); }").unwrap();
        let body = tree.children(tree.root())[0];
        let if_stmt = tree.children(body)[0];
        match tree.kind(if_stmt) {
            NodeKind::If { then_body, .. } => {
                assert!(matches!(tree.kind(*then_body), NodeKind::ExprStmt { .. }));
            }
            other => panic!("expected an if statement, got {}", other.type_name()),
        }
    }
}
