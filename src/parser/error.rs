use crate::lexer::{LexicalError, Span, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("Expect {expected} but got {actual}.")]
    UnexpectedToken {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("Expect expression but got {0}.")]
    NonExpression(TokenKind),
    #[error("Unexpected end of input.")]
    UnexpectedEof,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Can't return from top-level code.")]
    ReturnOutsideFunction,
    #[error("Can't use 'this' outside of a class.")]
    ThisOutsideClass,
    #[error("Can't have more than {0} arguments.")]
    TooManyArguments(usize),
    #[error("Can't nest more than {0} levels deep.")]
    TooDeeplyNested(u32),
    #[error("{0}")]
    LexicalError(#[from] LexicalError),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub span: Span,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "PA001",
            ParserErrorKind::NonExpression(_) => "PA002",
            ParserErrorKind::UnexpectedEof => "PA003",
            ParserErrorKind::InvalidAssignmentTarget => "PA004",
            ParserErrorKind::ReturnOutsideFunction => "PA005",
            ParserErrorKind::ThisOutsideClass => "PA006",
            ParserErrorKind::TooManyArguments(_) => "PA007",
            ParserErrorKind::TooDeeplyNested(_) => "PA008",
            ParserErrorKind::LexicalError(ref e) => e.code(),
        }
    }

    /// The source ended while a construct was still open, so appending more
    /// source may still make it parse.
    pub fn is_incomplete(&self) -> bool {
        match self.kind {
            ParserErrorKind::UnexpectedEof => true,
            ParserErrorKind::LexicalError(ref e) => e.is_incomplete(),
            _ => false,
        }
    }
}

impl From<LexicalError> for ParserError {
    fn from(value: LexicalError) -> Self {
        Self {
            span: value.span,
            kind: ParserErrorKind::LexicalError(value),
        }
    }
}
