pub mod error;
pub mod expression;
pub mod statement;

use crate::{
    lexer::{Lexer, LineBreaks, Span, Token, TokenKind},
    string::Ident,
};
pub use error::{ParserError, ParserErrorKind};
use expression::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression, InfixOperator, InfixShortCircuitOperator, Precedence, PrefixOperator,
};
use statement::{
    BlockStatement, ClassDecl, ExpressionStatement, ForStatement, FunctionDecl, IfStatement,
    Initializer, PrintStatement, ReturnStatement, Statement, VariableDecl, WhileStatement,
};
use std::sync::Arc;

const MAX_ARGUMENTS: usize = 255;
/// Deepest combined statement and expression nesting the parser accepts.
pub const MAX_NESTING: u32 = 128;

#[derive(Debug, Clone, Default)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn get_statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Token>,
    function_depth: u32,
    class_depth: u32,
    nesting: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
            function_depth: 0,
            class_depth: 0,
            nesting: 0,
        }
    }

    pub fn get_line_breaks(&self) -> LineBreaks {
        self.lexer.get_line_breaks()
    }

    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(ref token) => Ok(token.clone()),
            None => {
                let token = self.lexer.next_token()?;
                self.lookahead = Some(token.clone());
                Ok(token)
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => Ok(self.lexer.next_token()?),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let next_token = self.next_token()?;
        if next_token.kind == expected {
            Ok(next_token)
        } else if next_token.kind == TokenKind::Eof {
            Err(ParserError {
                kind: ParserErrorKind::UnexpectedEof,
                span: next_token.span,
            })
        } else {
            Err(ParserError {
                kind: ParserErrorKind::UnexpectedToken {
                    actual: next_token.kind,
                    expected,
                },
                span: next_token.span,
            })
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let next_token = self.peek()?;
        if next_token.kind != next {
            Ok(None)
        } else {
            let _ = self.next_token()?;
            Ok(Some(next_token))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(Ident {
            name: self.lexeme(&token.span).into(),
            span: token.span,
        })
    }

    // Recursive descent uses the host stack, so runaway nesting is a syntax error.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParserError>,
    ) -> Result<T, ParserError> {
        if self.nesting >= MAX_NESTING {
            let token = self.peek()?;
            return Err(ParserError {
                kind: ParserErrorKind::TooDeeplyNested(MAX_NESTING),
                span: token.span,
            });
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn lexeme(&self, span: &Span) -> &'src str {
        self.lexer
            .get_lexeme(span)
            .expect("Lexed token has a valid span")
    }
}

// Parse program/statements
impl<'src> Parser<'src> {
    /// Parses the whole source, stopping at the first error.
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let mut statements = Vec::new();
        while self.peek()?.kind != TokenKind::Eof {
            statements.push(self.parse_declaration()?);
        }
        Ok(Program { statements })
    }

    fn parse_declaration(&mut self) -> Result<Statement, ParserError> {
        match self.peek()?.kind {
            TokenKind::KeywordVar => Ok(Statement::VariableDecl(self.parse_variable_decl()?)),
            TokenKind::KeywordFun => {
                let keyword = self.next_token()?;
                let decl = self.parse_function(keyword.span)?;
                Ok(Statement::FunctionDecl(Arc::new(decl)))
            }
            TokenKind::KeywordClass => self.parse_class_decl(),
            _ => self.parse_statement(),
        }
    }

    fn parse_variable_decl(&mut self) -> Result<VariableDecl, ParserError> {
        let keyword = self.expect(TokenKind::KeywordVar)?;
        let name = self.expect_ident()?;
        let initial = match self.eat_if(TokenKind::Equal)? {
            Some(_) => Some(self.parse_expression()?),
            None => None,
        };
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(VariableDecl {
            name,
            initial,
            span: keyword.span.merge(&semicolon.span),
        })
    }

    fn parse_function(&mut self, start: Span) -> Result<FunctionDecl, ParserError> {
        let name = self.expect_ident()?;
        self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        if self.eat_if(TokenKind::RightParenthesis)?.is_none() {
            loop {
                if parameters.len() >= MAX_ARGUMENTS {
                    let token = self.peek()?;
                    return Err(ParserError {
                        kind: ParserErrorKind::TooManyArguments(MAX_ARGUMENTS),
                        span: token.span,
                    });
                }
                parameters.push(self.expect_ident()?);
                if self.eat_if(TokenKind::Comma)?.is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RightParenthesis)?;
        }

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        let body = body?;

        Ok(FunctionDecl {
            name,
            parameters,
            span: start.merge(&body.span),
            body: body.body,
        })
    }

    fn parse_class_decl(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordClass)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LeftBrace)?;

        self.class_depth += 1;
        let methods = self.parse_methods();
        self.class_depth -= 1;
        let (methods, closing) = methods?;

        Ok(Statement::ClassDecl(ClassDecl {
            name,
            methods,
            span: keyword.span.merge(&closing),
        }))
    }

    fn parse_methods(&mut self) -> Result<(Vec<Arc<FunctionDecl>>, Span), ParserError> {
        let mut methods = Vec::new();
        loop {
            if let Some(closing) = self.eat_if(TokenKind::RightBrace)? {
                return Ok((methods, closing.span));
            }
            let start = self.peek()?.span;
            methods.push(Arc::new(self.parse_function(start)?));
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        self.nested(Self::parse_nested_statement)
    }

    fn parse_nested_statement(&mut self) -> Result<Statement, ParserError> {
        match self.peek()?.kind {
            TokenKind::KeywordPrint => {
                let keyword = self.next_token()?;
                let expr = self.parse_expression()?;
                let semicolon = self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Print(PrintStatement {
                    expr,
                    span: keyword.span.merge(&semicolon.span),
                }))
            }
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            TokenKind::KeywordIf => self.parse_if_statement(),
            TokenKind::KeywordWhile => {
                let keyword = self.next_token()?;
                self.expect(TokenKind::LeftParenthesis)?;
                let condition = self.parse_expression()?;
                self.expect(TokenKind::RightParenthesis)?;
                let body = self.parse_statement()?;
                Ok(Statement::While(WhileStatement {
                    condition,
                    span: keyword.span.merge(&body.get_span()),
                    body: Box::new(body),
                }))
            }
            TokenKind::KeywordFor => self.parse_for_statement(),
            TokenKind::KeywordReturn => {
                let keyword = self.next_token()?;
                if self.function_depth == 0 {
                    return Err(ParserError {
                        kind: ParserErrorKind::ReturnOutsideFunction,
                        span: keyword.span,
                    });
                }
                let value = match self.peek()?.kind {
                    TokenKind::Semicolon => None,
                    _ => Some(self.parse_expression()?),
                };
                let semicolon = self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Return(ReturnStatement {
                    value,
                    span: keyword.span.merge(&semicolon.span),
                }))
            }
            _ => Ok(Statement::Expression(self.parse_expression_statement()?)),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<ExpressionStatement, ParserError> {
        let expr = self.parse_expression()?;
        let semicolon = self.expect(TokenKind::Semicolon)?;
        Ok(ExpressionStatement {
            span: expr.get_span().merge(&semicolon.span),
            expr,
        })
    }

    fn parse_block(&mut self) -> Result<BlockStatement, ParserError> {
        self.nested(Self::parse_nested_block)
    }

    fn parse_nested_block(&mut self) -> Result<BlockStatement, ParserError> {
        let opening = self.expect(TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        loop {
            let token = self.peek()?;
            match token.kind {
                TokenKind::RightBrace => {
                    let closing = self.next_token()?;
                    return Ok(BlockStatement {
                        body,
                        span: opening.span.merge(&closing.span),
                    });
                }
                TokenKind::Eof => {
                    return Err(ParserError {
                        kind: ParserErrorKind::UnexpectedEof,
                        span: token.span,
                    });
                }
                _ => body.push(self.parse_declaration()?),
            }
        }
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordIf)?;
        self.expect(TokenKind::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParenthesis)?;
        let success = self.parse_statement()?;
        let failure = match self.eat_if(TokenKind::KeywordElse)? {
            Some(_) => Some(Box::new(self.parse_statement()?)),
            None => None,
        };
        let end = failure
            .as_ref()
            .map(|stmt| stmt.get_span())
            .unwrap_or_else(|| success.get_span());
        Ok(Statement::If(IfStatement {
            condition,
            success: Box::new(success),
            failure,
            span: keyword.span.merge(&end),
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordFor)?;
        self.expect(TokenKind::LeftParenthesis)?;

        let initializer = match self.peek()?.kind {
            TokenKind::Semicolon => {
                let _ = self.next_token()?;
                None
            }
            TokenKind::KeywordVar => Some(Initializer::VariableDecl(self.parse_variable_decl()?)),
            _ => Some(Initializer::Expression(
                self.parse_expression_statement()?,
            )),
        };

        let condition = match self.peek()?.kind {
            TokenKind::Semicolon => None,
            _ => Some(self.parse_expression()?),
        };
        self.expect(TokenKind::Semicolon)?;

        let increment = match self.peek()?.kind {
            TokenKind::RightParenthesis => None,
            _ => Some(self.parse_expression()?),
        };
        self.expect(TokenKind::RightParenthesis)?;

        let body = self.parse_statement()?;
        Ok(Statement::For(ForStatement {
            initializer,
            condition,
            increment,
            span: keyword.span.merge(&body.get_span()),
            body: Box::new(body),
        }))
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        let mut tree = IncompleteExpression::new();
        let root = self.parse_expression_pratt(0, &mut tree)?;

        Ok(Expression::new(tree, root)
            .expect("Root was obtained from the tree itself so it must be valid."))
    }

    fn expect_left_expression(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let token = self.next_token()?;
        let span = token.span;

        let atom = |kind: ExpressionAtomKind| ExpressionNode::Atom(ExpressionAtom { kind, span });

        let node = match token.kind {
            TokenKind::Eof => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span,
                });
            }
            TokenKind::NumericLiteral => {
                let value = self
                    .lexeme(&span)
                    .parse()
                    .expect("Numeric literal tokens are valid `f64`");
                tree.push(atom(ExpressionAtomKind::Number(value)), span)
            }
            TokenKind::Ident => {
                let name = self.lexeme(&span).into();
                tree.push(atom(ExpressionAtomKind::Identifier(name)), span)
            }
            TokenKind::StringLiteral => {
                let lexeme = self.lexeme(&span);
                let value = lexeme
                    .get(1..lexeme.len() - 1)
                    .expect("String literal tokens are at least length 2.");
                tree.push(atom(ExpressionAtomKind::StringLiteral(value.into())), span)
            }
            TokenKind::KeywordNil => tree.push(atom(ExpressionAtomKind::Nil), span),
            TokenKind::KeywordTrue => tree.push(atom(ExpressionAtomKind::Bool(true)), span),
            TokenKind::KeywordFalse => tree.push(atom(ExpressionAtomKind::Bool(false)), span),
            TokenKind::KeywordThis => {
                if self.class_depth == 0 {
                    return Err(ParserError {
                        kind: ParserErrorKind::ThisOutsideClass,
                        span,
                    });
                }
                tree.push(atom(ExpressionAtomKind::This), span)
            }
            // Prefix operators
            TokenKind::Minus | TokenKind::Bang => {
                let operator =
                    PrefixOperator::from_token(token.kind).expect("Token is a prefix operator.");
                let rbp = Precedence::Unary.prefix_binding_power();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                let rhs_span = tree.get_span(rhs).expect("Node was just pushed.");
                tree.push(
                    ExpressionNode::Prefix { operator, rhs },
                    span.merge(&rhs_span),
                )
            }
            // Bracketed expression
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0, tree)?;
                let closing = self.expect(TokenKind::RightParenthesis)?;
                tree.push(ExpressionNode::Group { inner }, span.merge(&closing.span))
            }
            kind => {
                return Err(ParserError {
                    kind: ParserErrorKind::NonExpression(kind),
                    span,
                })
            }
        };
        Ok(node)
    }

    fn parse_expression_pratt(
        &mut self,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        self.nested(|parser| parser.parse_nested_expression(min_bp, tree))
    }

    fn parse_nested_expression(
        &mut self,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let mut lhs = self.expect_left_expression(tree)?;
        let (postfix_bp, _) = Precedence::Call.infix_binding_power();

        loop {
            let token = self.peek()?;
            let lhs_span = tree.get_span(lhs).expect("Node was just pushed.");
            match token.kind {
                TokenKind::LeftParenthesis => {
                    if postfix_bp < min_bp {
                        break;
                    }
                    let _ = self.next_token()?;
                    let (arguments, closing) = self.parse_arguments(tree)?;
                    lhs = tree.push(
                        ExpressionNode::Call {
                            callee: lhs,
                            arguments,
                        },
                        lhs_span.merge(&closing),
                    );
                }
                TokenKind::Dot => {
                    if postfix_bp < min_bp {
                        break;
                    }
                    let _ = self.next_token()?;
                    let name = self.expect_ident()?;
                    let span = lhs_span.merge(&name.span);
                    lhs = tree.push(ExpressionNode::Get { object: lhs, name }, span);
                }
                TokenKind::Equal => {
                    let (lbp, rbp) = Precedence::Assignment.infix_binding_power();
                    if lbp < min_bp {
                        break;
                    }
                    let _ = self.next_token()?;
                    let rhs = self.parse_expression_pratt(rbp, tree)?;
                    let span = lhs_span.merge(&tree.get_span(rhs).expect("Node was just pushed."));
                    let target = tree.get_node(lhs).cloned();
                    let node = match target {
                        Some(ExpressionNode::Atom(ExpressionAtom {
                            kind: ExpressionAtomKind::Identifier(name),
                            span: name_span,
                        })) => ExpressionNode::InfixAssignment {
                            lhs: Ident {
                                name,
                                span: name_span,
                            },
                            rhs,
                        },
                        Some(ExpressionNode::Get { object, name }) => ExpressionNode::Set {
                            object,
                            name,
                            value: rhs,
                        },
                        _ => {
                            return Err(ParserError {
                                kind: ParserErrorKind::InvalidAssignmentTarget,
                                span: lhs_span,
                            })
                        }
                    };
                    lhs = tree.push(node, span);
                }
                TokenKind::KeywordAnd | TokenKind::KeywordOr => {
                    let operator = InfixShortCircuitOperator::from_token(token.kind)
                        .expect("Token is a logical operator.");
                    let (lbp, rbp) = operator.precedence().infix_binding_power();
                    if lbp < min_bp {
                        break;
                    }
                    let _ = self.next_token()?;
                    let rhs = self.parse_expression_pratt(rbp, tree)?;
                    let span = lhs_span.merge(&tree.get_span(rhs).expect("Node was just pushed."));
                    lhs = tree.push(ExpressionNode::InfixShortCircuit { operator, lhs, rhs }, span);
                }
                kind => {
                    let Some(operator) = InfixOperator::from_token(kind) else {
                        break;
                    };
                    let (lbp, rbp) = operator.precedence().infix_binding_power();
                    if lbp < min_bp {
                        break;
                    }
                    let _ = self.next_token()?;
                    let rhs = self.parse_expression_pratt(rbp, tree)?;
                    let span = lhs_span.merge(&tree.get_span(rhs).expect("Node was just pushed."));
                    lhs = tree.push(ExpressionNode::Infix { operator, lhs, rhs }, span);
                }
            }
        }
        Ok(lhs)
    }

    fn parse_arguments(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> Result<(Vec<ExpressionNodeRef>, Span), ParserError> {
        let mut arguments = Vec::new();
        if let Some(closing) = self.eat_if(TokenKind::RightParenthesis)? {
            return Ok((arguments, closing.span));
        }
        loop {
            if arguments.len() >= MAX_ARGUMENTS {
                let token = self.peek()?;
                return Err(ParserError {
                    kind: ParserErrorKind::TooManyArguments(MAX_ARGUMENTS),
                    span: token.span,
                });
            }
            arguments.push(self.parse_expression_pratt(0, tree)?);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                break;
            }
        }
        let closing = self.expect(TokenKind::RightParenthesis)?;
        Ok((arguments, closing.span))
    }
}
