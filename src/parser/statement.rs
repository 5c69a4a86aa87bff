use super::expression::Expression;
use crate::{lexer::Span, string::Ident};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Statement {
    // Declarations
    VariableDecl(VariableDecl),
    FunctionDecl(Arc<FunctionDecl>),
    ClassDecl(ClassDecl),
    // Non-declarations
    Expression(ExpressionStatement),
    Print(PrintStatement),
    Block(BlockStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(ReturnStatement),
}

impl Statement {
    pub fn get_span(&self) -> Span {
        match self {
            Statement::VariableDecl(decl) => decl.span,
            Statement::FunctionDecl(decl) => decl.span,
            Statement::ClassDecl(decl) => decl.span,
            Statement::Expression(stmt) => stmt.span,
            Statement::Print(stmt) => stmt.span,
            Statement::Block(stmt) => stmt.span,
            Statement::If(stmt) => stmt.span,
            Statement::While(stmt) => stmt.span,
            Statement::For(stmt) => stmt.span,
            Statement::Return(stmt) => stmt.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: Ident,
    pub initial: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub parameters: Vec<Ident>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Ident,
    pub methods: Vec<Arc<FunctionDecl>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PrintStatement {
    pub expr: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub success: Box<Statement>,
    pub failure: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Initializer {
    VariableDecl(VariableDecl),
    Expression(ExpressionStatement),
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub initializer: Option<Initializer>,
    pub condition: Option<Expression>,
    pub increment: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}
