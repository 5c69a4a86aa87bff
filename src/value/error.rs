use super::LoxValue;
use crate::{lexer::Span, string::IdentName};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeErrorKind {
    #[error("Operand must be a number but got {0}.")]
    NonNumeric(LoxValue),
    #[error("Operands must be numbers but got {0} and {1}.")]
    NonNumerics(LoxValue, LoxValue),
    #[error("Operands must be two numbers or two strings but got {0} and {1}.")]
    NonAddable(LoxValue, LoxValue),
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(IdentName),
    #[error("Can only call functions and classes but got {0}.")]
    InvalidCallee(LoxValue),
    #[error("Expected {expected} arguments but got {actual}.")]
    InvalidArgumentCount { actual: usize, expected: usize },
    #[error("Only instances have properties but got {0}.")]
    InvalidInstanceGet(LoxValue),
    #[error("Only instances have fields but got {0}.")]
    InvalidInstanceSet(LoxValue),
    #[error("Undefined property '{name}' on {object}.")]
    UndefinedProperty { object: LoxValue, name: IdentName },
    #[error("Division by zero.")]
    DivisionByZero,
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("{0}")]
    NativeFailure(String),
}

#[derive(Debug, Error, Clone)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::NonNumeric(_) => "RT001",
            RuntimeErrorKind::NonNumerics(_, _) => "RT002",
            RuntimeErrorKind::NonAddable(_, _) => "RT003",
            RuntimeErrorKind::UndefinedVariable(_) => "RT004",
            RuntimeErrorKind::InvalidCallee(_) => "RT005",
            RuntimeErrorKind::InvalidArgumentCount { .. } => "RT006",
            RuntimeErrorKind::InvalidInstanceGet(_) => "RT007",
            RuntimeErrorKind::InvalidInstanceSet(_) => "RT008",
            RuntimeErrorKind::UndefinedProperty { .. } => "RT009",
            RuntimeErrorKind::DivisionByZero => "RT010",
            RuntimeErrorKind::StackOverflow => "RT011",
            RuntimeErrorKind::NativeFailure(_) => "RT012",
        }
    }
}
