use crate::lexer::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolutionErrorKind {
    #[error("Can't read local variable in its own initializer.")]
    SelfReferentialInitializer,
    #[error("Already a variable with this name in this scope.")]
    ShadowLocal,
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct ResolutionError {
    pub kind: ResolutionErrorKind,
    pub span: Span,
}

impl ResolutionError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ResolutionErrorKind::SelfReferentialInitializer => "RA001",
            ResolutionErrorKind::ShadowLocal => "RA002",
        }
    }
}
