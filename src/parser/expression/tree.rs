use compact_str::CompactString;

use super::{InfixOperator, InfixShortCircuitOperator, PrefixOperator};
use crate::{lexer::Span, string::Ident};

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAtomKind {
    Number(f64),
    Bool(bool),
    Nil,
    This,
    Identifier(CompactString),
    StringLiteral(CompactString),
}

#[derive(Debug, Clone)]
pub struct ExpressionAtom {
    pub kind: ExpressionAtomKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionNodeRef(u32);

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Atom(ExpressionAtom),
    Group {
        inner: ExpressionNodeRef,
    },
    Prefix {
        operator: PrefixOperator,
        rhs: ExpressionNodeRef,
    },
    Infix {
        operator: InfixOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    InfixAssignment {
        lhs: Ident,
        rhs: ExpressionNodeRef,
    },
    InfixShortCircuit {
        operator: InfixShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    Call {
        callee: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
    },
    Get {
        object: ExpressionNodeRef,
        name: Ident,
    },
    Set {
        object: ExpressionNodeRef,
        name: Ident,
        value: ExpressionNodeRef,
    },
}

/// An expression tree still under construction by the parser.
#[derive(Debug, Clone, Default)]
pub struct IncompleteExpression {
    nodes: Vec<ExpressionNode>,
    spans: Vec<Span>,
}

impl IncompleteExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ExpressionNode, span: Span) -> ExpressionNodeRef {
        self.nodes.push(node);
        self.spans.push(span);
        ExpressionNodeRef(self.nodes.len() as u32 - 1)
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_span(&self, node: ExpressionNodeRef) -> Option<Span> {
        self.spans.get(node.0 as usize).copied()
    }
}

/// A flat, index-linked expression tree.
#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<ExpressionNode>,
    spans: Vec<Span>,
    root: ExpressionNodeRef,
}

impl Expression {
    pub fn new(tree: IncompleteExpression, root: ExpressionNodeRef) -> Option<Self> {
        if !(0..tree.nodes.len()).contains(&(root.0 as usize)) {
            None
        } else {
            Some(Self {
                nodes: tree.nodes,
                spans: tree.spans,
                root,
            })
        }
    }

    pub fn get_root_ref(&self) -> ExpressionNodeRef {
        self.root
    }

    pub fn get_root(&self) -> &ExpressionNode {
        self.get_node(self.root)
            .expect("The root exists within the tree.")
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_span(&self) -> Span {
        self.get_subspan(self.root)
            .expect("The root exists within the tree.")
    }

    pub fn get_subspan(&self, node: ExpressionNodeRef) -> Option<Span> {
        self.spans.get(node.0 as usize).copied()
    }
}
