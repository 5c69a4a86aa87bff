use crate::session::{RuntimeFailure, SessionError, SyntaxError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DriverError {
    #[error("NotReadyError: the runtime session has not been initialized")]
    NotReady,
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Runtime(#[from] RuntimeFailure),
    #[error("CaptureError: {0}")]
    Capture(String),
}

impl From<SessionError> for DriverError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::Syntax(e) => DriverError::Syntax(e),
            SessionError::Runtime(e) => DriverError::Runtime(e),
            SessionError::Capture(message) => DriverError::Capture(message),
        }
    }
}

impl DriverError {
    /// 1-based line in the submitted source, when the error has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            DriverError::Syntax(e) => Some(e.line),
            DriverError::Runtime(e) => Some(e.line),
            DriverError::NotReady | DriverError::Capture(_) => None,
        }
    }
}
