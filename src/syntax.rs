//! Arena-backed syntax tree for a statement-oriented, Java-like language.
//!
//! Nodes live in a single arena owned by [`SyntaxTree`] and refer to each
//! other through [`NodeId`] handles, including the parent back-link. The tree
//! is built once by the parser and mutated in place only through the editing
//! operations defined here: expression-slot replacement, statement insertion
//! into a block, and wrapping a bare control body into a block.

use serde::{Deserialize, Serialize};

/// A 1-indexed (line, column) position in source text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// The exact source span a node occupied at parse time.
///
/// `end` is the position of the span's last character, so a range covers
/// `begin..=end`. Range equality is exact endpoint equality; partial overlap
/// never counts as a match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub begin: Position,
    pub end: Position,
}

impl Range {
    pub fn new(begin: Position, end: Position) -> Self {
        Self { begin, end }
    }

    /// True if `other` lies entirely within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

/// Handle into the tree arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Java primitive types recognized by the parser.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Char => "char",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn from_str(text: &str) -> Option<Self> {
        Some(match text {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "char" => Primitive::Char,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            _ => return None,
        })
    }
}

/// A declared type, opaque to the extraction engine.
///
/// Named types keep their source text verbatim, generic arguments and array
/// dimensions included (`HashMap<>`, `Edge[]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeNode {
    Primitive(Primitive),
    Named(String),
}

impl TypeNode {
    pub fn named(text: impl Into<String>) -> Self {
        TypeNode::Named(text.into())
    }
}

impl std::fmt::Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::Primitive(p) => f.write_str(p.as_str()),
            TypeNode::Named(text) => f.write_str(text),
        }
    }
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub ty: TypeNode,
    pub name: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Java binding strength, higher binds tighter. Shared by the parser's
    /// precedence climbing and the printer's parenthesization.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Le | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Gt => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// The closed sum of node shapes: one declaration kind, the statement kinds,
/// and the expression kinds. Child links are arena handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // Declaration
    Method {
        modifiers: Vec<String>,
        return_type: TypeNode,
        name: String,
        params: Vec<Param>,
        body: NodeId,
    },

    // Statements
    Block {
        stmts: Vec<NodeId>,
        /// Line comments trailing the last statement of the block.
        orphan_comments: Vec<String>,
    },
    LocalDecl {
        ty: TypeNode,
        name: String,
        init: NodeId,
    },
    ExprStmt {
        expr: NodeId,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    If {
        cond: NodeId,
        then_body: NodeId,
        else_body: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    ForEach {
        elem_type: TypeNode,
        var: String,
        iterable: NodeId,
        body: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },

    // Expressions
    Name(String),
    Literal(String),
    FieldAccess {
        receiver: NodeId,
        field: String,
    },
    MethodCall {
        receiver: Option<NodeId>,
        name: String,
        args: Vec<NodeId>,
    },
    ObjectCreation {
        class: TypeNode,
        args: Vec<NodeId>,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        lhs: NodeId,
        op: BinaryOp,
        rhs: NodeId,
    },
}

impl NodeKind {
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Name(_)
                | NodeKind::Literal(_)
                | NodeKind::FieldAccess { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::ObjectCreation { .. }
                | NodeKind::ArrayAccess { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
        )
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::LocalDecl { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::Assign { .. }
                | NodeKind::If { .. }
                | NodeKind::While { .. }
                | NodeKind::ForEach { .. }
                | NodeKind::Return { .. }
        )
    }

    /// Name of this node shape, for diagnostics and debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Method { .. } => "Method",
            NodeKind::Block { .. } => "Block",
            NodeKind::LocalDecl { .. } => "LocalDecl",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::Assign { .. } => "Assign",
            NodeKind::If { .. } => "If",
            NodeKind::While { .. } => "While",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::Return { .. } => "Return",
            NodeKind::Name(_) => "Name",
            NodeKind::Literal(_) => "Literal",
            NodeKind::FieldAccess { .. } => "FieldAccess",
            NodeKind::MethodCall { .. } => "MethodCall",
            NodeKind::ObjectCreation { .. } => "ObjectCreation",
            NodeKind::ArrayAccess { .. } => "ArrayAccess",
            NodeKind::Unary { .. } => "Unary",
            NodeKind::Binary { .. } => "Binary",
        }
    }
}

/// One arena slot.
///
/// `range` is `Some` only for parsed nodes; nodes synthesized by an edit
/// occupied no source span. `leading_comments` is meaningful on statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Option<Range>,
    pub parent: Option<NodeId>,
    pub leading_comments: Vec<String>,
}

/// The arena. Sole owner of node storage; handles stay valid across edits
/// because nodes are never removed, only re-linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn alloc(&mut self, kind: NodeKind, range: Option<Range>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            parent: None,
            leading_comments: Vec::new(),
        });
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn range(&self, id: NodeId) -> Option<Range> {
        self.node(id).range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.node_mut(id).parent = parent;
    }

    pub fn is_expression(&self, id: NodeId) -> bool {
        self.kind(id).is_expression()
    }

    pub fn is_statement(&self, id: NodeId) -> bool {
        self.kind(id).is_statement()
    }

    /// Child handles of a node, in syntactic order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.kind(id) {
            NodeKind::Method { body, .. } => vec![*body],
            NodeKind::Block { stmts, .. } => stmts.clone(),
            NodeKind::LocalDecl { init, .. } => vec![*init],
            NodeKind::ExprStmt { expr } => vec![*expr],
            NodeKind::Assign { target, value } => vec![*target, *value],
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let mut out = vec![*cond, *then_body];
                out.extend(*else_body);
                out
            }
            NodeKind::While { cond, body } => vec![*cond, *body],
            NodeKind::ForEach { iterable, body, .. } => vec![*iterable, *body],
            NodeKind::Return { value } => value.iter().copied().collect(),
            NodeKind::Name(_) | NodeKind::Literal(_) => vec![],
            NodeKind::FieldAccess { receiver, .. } => vec![*receiver],
            NodeKind::MethodCall { receiver, args, .. } => {
                let mut out: Vec<NodeId> = receiver.iter().copied().collect();
                out.extend(args.iter().copied());
                out
            }
            NodeKind::ObjectCreation { args, .. } => args.clone(),
            NodeKind::ArrayAccess { array, index } => vec![*array, *index],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
        }
    }

    /// Replaces the expression child `old` of `parent` with `new` and points
    /// `new` back at `parent`. `old` keeps its stale parent link; the caller
    /// re-attaches it as part of the same edit.
    ///
    /// Panics if `old` is not an expression child of `parent`: that is a
    /// malformed tree, not a recoverable condition.
    pub fn replace_expr_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        let replaced = {
            let slot = |id: &mut NodeId| {
                if *id == old {
                    *id = new;
                    true
                } else {
                    false
                }
            };
            match &mut self.nodes[parent.index()].kind {
                NodeKind::LocalDecl { init, .. } => slot(init),
                NodeKind::ExprStmt { expr } => slot(expr),
                NodeKind::Assign { target, value } => slot(target) || slot(value),
                NodeKind::If { cond, .. } => slot(cond),
                NodeKind::While { cond, .. } => slot(cond),
                NodeKind::ForEach { iterable, .. } => slot(iterable),
                NodeKind::Return { value } => value.as_mut().map_or(false, slot),
                NodeKind::FieldAccess { receiver, .. } => slot(receiver),
                NodeKind::MethodCall { receiver, args, .. } => {
                    receiver.as_mut().map_or(false, slot) || args.iter_mut().any(slot)
                }
                NodeKind::ObjectCreation { args, .. } => args.iter_mut().any(slot),
                NodeKind::ArrayAccess { array, index } => slot(array) || slot(index),
                NodeKind::Unary { operand, .. } => slot(operand),
                NodeKind::Binary { lhs, rhs, .. } => slot(lhs) || slot(rhs),
                other => panic!(
                    "node kind {} has no expression slots",
                    other.type_name()
                ),
            }
        };
        assert!(
            replaced,
            "malformed tree: node is not an expression child of its parent"
        );
        self.set_parent(new, Some(parent));
    }

    /// Inserts `stmt` into `block` at `index` without disturbing the order of
    /// the remaining statements.
    pub fn insert_stmt(&mut self, block: NodeId, index: usize, stmt: NodeId) {
        match &mut self.nodes[block.index()].kind {
            NodeKind::Block { stmts, .. } => stmts.insert(index, stmt),
            other => panic!("cannot insert a statement into {}", other.type_name()),
        }
        self.set_parent(stmt, Some(block));
    }

    /// "Ensure body is a Block": wraps `stmt`, the bare single-statement body
    /// of the control statement `control`, into a freshly allocated one-element
    /// block and installs that block in the body slot `stmt` occupied.
    ///
    /// The statement keeps its identity, internal structure, and attached
    /// comments; only its container changes. Returns the new block's handle.
    pub fn wrap_body_in_block(&mut self, control: NodeId, stmt: NodeId) -> NodeId {
        let block = self.alloc(
            NodeKind::Block {
                stmts: vec![stmt],
                orphan_comments: Vec::new(),
            },
            None,
        );
        let installed = match &mut self.nodes[control.index()].kind {
            NodeKind::If {
                then_body,
                else_body,
                ..
            } => {
                if *then_body == stmt {
                    *then_body = block;
                    true
                } else if *else_body == Some(stmt) {
                    *else_body = Some(block);
                    true
                } else {
                    false
                }
            }
            NodeKind::While { body, .. } | NodeKind::ForEach { body, .. } => {
                if *body == stmt {
                    *body = block;
                    true
                } else {
                    false
                }
            }
            other => panic!("{} has no single-statement body slot", other.type_name()),
        };
        assert!(
            installed,
            "malformed tree: statement is not the body of the control statement"
        );
        self.set_parent(block, Some(control));
        self.set_parent(stmt, Some(block));
        block
    }
}
