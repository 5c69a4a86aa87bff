mod operator;
mod tree;

pub use operator::{InfixOperator, InfixShortCircuitOperator, Precedence, PrefixOperator};
pub use tree::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression,
};
