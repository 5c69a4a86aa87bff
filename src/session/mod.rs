//! The stateful runtime behind the driver.
//!
//! A session accepts source units one at a time, runs them against global
//! bindings that persist between units, and answers two capture queries:
//! the text printed since the last query, and a snapshot of the globals.

pub mod capture;
pub mod error;
pub mod variables;

use crate::{
    environment::native::native_names,
    interpreter::{context::BufferedContext, TreeWalkInterpreter},
    lexer::LineBreaks,
    parser::Parser,
    resolver::{ResolvedProgram, Resolver},
    string::IdentName,
};
pub use error::{RuntimeFailure, SessionError, SyntaxError};
use std::collections::HashSet;
pub use variables::{Value, Variables};

#[allow(async_fn_in_trait)]
pub trait RuntimeSession {
    /// Parses `source` without running it.
    fn compile(&self, source: &str) -> Result<(), SyntaxError>;

    /// Runs `source` against the persistent globals.
    async fn execute(&mut self, source: &str) -> Result<(), SessionError>;

    /// Drains the text printed since the previous call.
    async fn take_output(&mut self) -> Result<String, SessionError>;

    async fn clear_output(&mut self) -> Result<(), SessionError> {
        self.take_output().await.map(|_| ())
    }

    /// Snapshot of every user-visible global binding.
    async fn variables(&mut self) -> Result<Variables, SessionError>;
}

pub struct LoxSession {
    interpreter: TreeWalkInterpreter<BufferedContext>,
    reserved: HashSet<IdentName>,
}

impl Default for LoxSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LoxSession {
    pub fn new() -> Self {
        let reserved = native_names().map(IdentName::from).collect();
        Self {
            interpreter: TreeWalkInterpreter::new(BufferedContext::new()),
            reserved,
        }
    }

    /// One-time asynchronous setup, the shape the driver's `initialize` expects.
    pub async fn bootstrap() -> Result<Self, SessionError> {
        tokio::task::yield_now().await;
        let session = Self::new();
        tracing::debug!(reserved = session.reserved.len(), "Lox session bootstrapped");
        Ok(session)
    }

    /// Parses and resolves `source`. Both passes report `SyntaxError`s.
    fn parse(source: &str) -> Result<ResolvedProgram, SyntaxError> {
        let line_breaks = LineBreaks::new(source);
        let program = Parser::new(source)
            .parse()
            .map_err(|e| SyntaxError::from_parser(&e, &line_breaks))?;
        Resolver::new()
            .resolve_program(program)
            .map_err(|e| SyntaxError::from_resolution(&e, &line_breaks))
    }
}

impl RuntimeSession for LoxSession {
    fn compile(&self, source: &str) -> Result<(), SyntaxError> {
        Self::parse(source).map(|_| ())
    }

    async fn execute(&mut self, source: &str) -> Result<(), SessionError> {
        let program = Self::parse(source)?;
        tracing::trace!(statements = program.len(), "executing unit");
        self.interpreter.run(&program).map_err(|e| {
            let line_breaks = LineBreaks::new(source);
            RuntimeFailure::from_runtime(&e, &line_breaks)
        })?;
        Ok(())
    }

    async fn take_output(&mut self) -> Result<String, SessionError> {
        Ok(self.interpreter.get_context_mut().drain())
    }

    async fn clear_output(&mut self) -> Result<(), SessionError> {
        self.interpreter.get_context_mut().clear();
        Ok(())
    }

    async fn variables(&mut self) -> Result<Variables, SessionError> {
        capture::snapshot(self.interpreter.get_globals(), &self.reserved)
    }
}
