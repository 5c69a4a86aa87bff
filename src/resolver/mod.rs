//! Static scope resolution.
//!
//! Every local variable reference is bound to the number of scopes between
//! the reference and its declaration, so a closure keeps seeing the binding
//! it closed over even when a later declaration shadows the name. References
//! that resolve to no local scope are globals and are looked up by name.

mod error;

use crate::{
    parser::{
        expression::{
            Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
        },
        statement::{ClassDecl, ForStatement, FunctionDecl, Initializer, Statement, VariableDecl},
        Program,
    },
    string::{Ident, IdentName},
};
pub use error::{ResolutionError, ResolutionErrorKind};
use std::{collections::HashMap, sync::Arc};

/// Scope distance of every resolved local reference, keyed by the reference.
pub type ResolutionMap = HashMap<Ident, usize>;

/// A parsed program together with the scope distances of its references.
///
/// Spans are only unique within one source text, so functions keep a handle
/// to the map of the program that declared them.
#[derive(Debug, Clone)]
pub struct ResolvedProgram {
    pub program: Program,
    pub resolution: Arc<ResolutionMap>,
}

impl ResolvedProgram {
    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }
}

enum Resolution {
    Declared,
    Defined,
}

#[derive(Default)]
pub struct Resolver {
    resolution: ResolutionMap,
    scopes: Vec<HashMap<IdentName, Resolution>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_program(
        mut self,
        program: Program,
    ) -> Result<ResolvedProgram, ResolutionError> {
        for statement in program.iter() {
            self.resolve_statement(statement)?;
        }
        Ok(ResolvedProgram {
            program,
            resolution: Arc::new(self.resolution),
        })
    }
}

// Base
impl Resolver {
    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, ident: &Ident) -> Result<(), ResolutionError> {
        if let Some(inner_scope) = self.scopes.last_mut() {
            if inner_scope.contains_key(&ident.name) {
                return Err(ResolutionError {
                    kind: ResolutionErrorKind::ShadowLocal,
                    span: ident.span,
                });
            }
            inner_scope.insert(ident.name.clone(), Resolution::Declared);
        }
        Ok(())
    }

    fn define(&mut self, name: &str) {
        if let Some(inner_scope) = self.scopes.last_mut() {
            inner_scope.insert(name.into(), Resolution::Defined);
        }
    }

    fn resolve_variable(&mut self, ident: &Ident) {
        let innermost = self
            .scopes
            .iter()
            .rev()
            .position(|scope| scope.contains_key(&ident.name));
        if let Some(depth) = innermost {
            self.resolution.insert(ident.clone(), depth);
        }
    }
}

// Statements
impl Resolver {
    fn resolve_statement(&mut self, statement: &Statement) -> Result<(), ResolutionError> {
        match statement {
            Statement::VariableDecl(decl) => self.resolve_variable_declaration(decl),
            Statement::FunctionDecl(decl) => {
                self.declare(&decl.name)?;
                self.define(&decl.name.name);
                self.resolve_function(decl)
            }
            Statement::ClassDecl(decl) => self.resolve_class_declaration(decl),
            Statement::Expression(stmt) => self.resolve_expression(&stmt.expr),
            Statement::Print(stmt) => self.resolve_expression(&stmt.expr),
            Statement::Block(block) => {
                self.enter_scope();
                self.resolve_body(&block.body)?;
                self.exit_scope();
                Ok(())
            }
            Statement::If(stmt) => {
                self.resolve_expression(&stmt.condition)?;
                self.resolve_statement(&stmt.success)?;
                if let Some(ref failure) = stmt.failure {
                    self.resolve_statement(failure)?;
                }
                Ok(())
            }
            Statement::While(stmt) => {
                self.resolve_expression(&stmt.condition)?;
                self.resolve_statement(&stmt.body)
            }
            Statement::For(stmt) => {
                self.enter_scope();
                self.resolve_for_statement(stmt)?;
                self.exit_scope();
                Ok(())
            }
            Statement::Return(stmt) => match stmt.value {
                Some(ref value) => self.resolve_expression(value),
                None => Ok(()),
            },
        }
    }

    fn resolve_body(&mut self, body: &[Statement]) -> Result<(), ResolutionError> {
        for statement in body {
            self.resolve_statement(statement)?;
        }
        Ok(())
    }

    fn resolve_variable_declaration(
        &mut self,
        decl: &VariableDecl,
    ) -> Result<(), ResolutionError> {
        self.declare(&decl.name)?;
        if let Some(ref initial) = decl.initial {
            self.resolve_expression(initial)?;
        }
        self.define(&decl.name.name);
        Ok(())
    }

    // Parameters and body share one scope, matching the call frame.
    fn resolve_function(&mut self, decl: &FunctionDecl) -> Result<(), ResolutionError> {
        self.enter_scope();
        for param in decl.parameters.iter() {
            self.declare(param)?;
            self.define(&param.name);
        }
        self.resolve_body(&decl.body)?;
        self.exit_scope();
        Ok(())
    }

    fn resolve_class_declaration(&mut self, decl: &ClassDecl) -> Result<(), ResolutionError> {
        self.declare(&decl.name)?;
        self.define(&decl.name.name);

        // Bound methods see `this` one scope outside their call frame.
        self.enter_scope();
        self.define("this");
        for method in decl.methods.iter() {
            self.resolve_function(method)?;
        }
        self.exit_scope();
        Ok(())
    }

    fn resolve_for_statement(&mut self, stmt: &ForStatement) -> Result<(), ResolutionError> {
        match stmt.initializer {
            Some(Initializer::VariableDecl(ref decl)) => self.resolve_variable_declaration(decl)?,
            Some(Initializer::Expression(ref initial)) => self.resolve_expression(&initial.expr)?,
            None => {}
        }
        if let Some(ref condition) = stmt.condition {
            self.resolve_expression(condition)?;
        }
        if let Some(ref increment) = stmt.increment {
            self.resolve_expression(increment)?;
        }
        self.resolve_statement(&stmt.body)
    }
}

// Expressions
impl Resolver {
    fn resolve_expression(&mut self, expr: &Expression) -> Result<(), ResolutionError> {
        self.resolve_expression_node(expr, expr.get_root_ref())
    }

    fn resolve_expression_node(
        &mut self,
        expr: &Expression,
        node_ref: ExpressionNodeRef,
    ) -> Result<(), ResolutionError> {
        let node = expr
            .get_node(node_ref)
            .expect("Caller must provide a valid reference");
        match node {
            ExpressionNode::Atom(atom) => self.resolve_atom(atom)?,
            ExpressionNode::Group { inner } => self.resolve_expression_node(expr, *inner)?,
            ExpressionNode::Prefix { rhs, .. } => self.resolve_expression_node(expr, *rhs)?,
            ExpressionNode::Infix { lhs, rhs, .. }
            | ExpressionNode::InfixShortCircuit { lhs, rhs, .. } => {
                self.resolve_expression_node(expr, *lhs)?;
                self.resolve_expression_node(expr, *rhs)?;
            }
            ExpressionNode::InfixAssignment { lhs, rhs } => {
                self.resolve_expression_node(expr, *rhs)?;
                self.resolve_variable(lhs);
            }
            ExpressionNode::Call { callee, arguments } => {
                self.resolve_expression_node(expr, *callee)?;
                for argument in arguments {
                    self.resolve_expression_node(expr, *argument)?;
                }
            }
            ExpressionNode::Get { object, .. } => self.resolve_expression_node(expr, *object)?,
            ExpressionNode::Set { object, value, .. } => {
                self.resolve_expression_node(expr, *value)?;
                self.resolve_expression_node(expr, *object)?;
            }
        }
        Ok(())
    }

    fn resolve_atom(&mut self, atom: &ExpressionAtom) -> Result<(), ResolutionError> {
        let name = match atom.kind {
            ExpressionAtomKind::Identifier(ref name) => name.clone(),
            ExpressionAtomKind::This => "this".into(),
            _ => return Ok(()),
        };
        let ident = Ident {
            name,
            span: atom.span,
        };

        let declared_here = self
            .scopes
            .last()
            .and_then(|scope| scope.get(&ident.name))
            .is_some_and(|resolution| matches!(resolution, Resolution::Declared));
        if declared_here {
            return Err(ResolutionError {
                kind: ResolutionErrorKind::SelfReferentialInitializer,
                span: ident.span,
            });
        }
        self.resolve_variable(&ident);
        Ok(())
    }
}
