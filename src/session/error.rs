use crate::{
    lexer::{LineBreaks, Span},
    parser::ParserError,
    resolver::ResolutionError,
    value::error::RuntimeError,
};
use thiserror::Error;

/// A unit that failed to parse. `incomplete` marks failures that more source could still fix.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] SyntaxError: {message}")]
pub struct SyntaxError {
    pub code: &'static str,
    pub message: String,
    /// 1-based line within the submitted text.
    pub line: usize,
    pub span: Span,
    pub incomplete: bool,
}

impl SyntaxError {
    pub fn from_parser(error: &ParserError, line_breaks: &LineBreaks) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            line: line_breaks.get_line_from_span(error.span) as usize,
            span: error.span,
            incomplete: error.is_incomplete(),
        }
    }

    /// Scope errors are never fixed by more source.
    pub fn from_resolution(error: &ResolutionError, line_breaks: &LineBreaks) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            line: line_breaks.get_line_from_span(error.span) as usize,
            span: error.span,
            incomplete: false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] RuntimeError: {message}")]
pub struct RuntimeFailure {
    pub code: &'static str,
    pub message: String,
    pub line: usize,
    pub span: Span,
}

impl RuntimeFailure {
    pub fn from_runtime(error: &RuntimeError, line_breaks: &LineBreaks) -> Self {
        Self {
            code: error.code(),
            message: error.to_string(),
            line: line_breaks.get_line_from_span(error.span) as usize,
            span: error.span,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Runtime(#[from] RuntimeFailure),
    #[error("CaptureError: {0}")]
    Capture(String),
}

fn shift_span(span: Span, byte_offset: u32) -> Span {
    Span {
        start: span.start + byte_offset,
        length: span.length,
    }
}

impl SyntaxError {
    /// Moves the location from unit-relative to buffer-relative, given where
    /// the unit starts inside the buffer.
    pub fn shifted(self, line_offset: usize, byte_offset: u32) -> Self {
        Self {
            line: self.line + line_offset,
            span: shift_span(self.span, byte_offset),
            ..self
        }
    }
}

impl RuntimeFailure {
    pub fn shifted(self, line_offset: usize, byte_offset: u32) -> Self {
        Self {
            line: self.line + line_offset,
            span: shift_span(self.span, byte_offset),
            ..self
        }
    }
}

impl SessionError {
    pub fn shifted(self, line_offset: usize, byte_offset: u32) -> Self {
        match self {
            SessionError::Syntax(e) => SessionError::Syntax(e.shifted(line_offset, byte_offset)),
            SessionError::Runtime(e) => {
                SessionError::Runtime(e.shifted(line_offset, byte_offset))
            }
            e @ SessionError::Capture(_) => e,
        }
    }
}
