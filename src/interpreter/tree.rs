use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use super::SystemContext;
use crate::environment::SharedEnvironment;
use crate::lexer::Span;
use crate::parser::{
    expression::{
        Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
        InfixOperator, InfixShortCircuitOperator, PrefixOperator,
    },
    statement::{
        BlockStatement, ClassDecl, ForStatement, FunctionDecl, IfStatement, Initializer,
        ReturnStatement, Statement, VariableDecl, WhileStatement,
    },
};
use crate::resolver::{ResolutionMap, ResolvedProgram};
use crate::string::Ident;
use crate::value::error::{RuntimeError, RuntimeErrorKind};
use crate::value::{Class, Function, Instance, LoxValue};

/// Nested calls deeper than this fail with a stack overflow instead of exhausting the host stack.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Programs run on a dedicated thread with this much stack, sized for
/// `MAX_CALL_DEPTH` frames of recursive evaluation.
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Debug)]
enum ProgramState {
    Run,
    Return(LoxValue),
}

/// Interpreter whose global scope outlives each program it runs, so later
/// programs see the bindings made by earlier ones.
pub struct TreeWalkInterpreter<C: SystemContext> {
    environment: SharedEnvironment,
    context: C,
    interpreter: TreeWalkStatementInterpreter,
}

impl<C> TreeWalkInterpreter<C>
where
    C: SystemContext,
{
    pub fn new(context: C) -> Self {
        Self {
            environment: SharedEnvironment::new(),
            context,
            interpreter: TreeWalkStatementInterpreter::create(),
        }
    }

    pub fn run(&mut self, program: &ResolvedProgram) -> Result<(), RuntimeError> {
        let Self {
            environment,
            context,
            interpreter,
        } = self;
        interpreter.call_depth = 0;
        interpreter.resolution = program.resolution.clone();

        let outcome = thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name("lox-interpreter".into())
                .stack_size(INTERPRETER_STACK_SIZE)
                .spawn_scoped(scope, || {
                    interpreter.interpret_program(environment, context, program)
                });
            match worker {
                Ok(worker) => Some(
                    worker
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                ),
                Err(error) => {
                    tracing::warn!(%error, "could not spawn interpreter thread");
                    None
                }
            }
        });

        match outcome {
            Some(result) => result,
            None => interpreter.interpret_program(environment, context, program),
        }
    }

    pub fn get_context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn get_globals(&self) -> &SharedEnvironment {
        &self.environment
    }

    pub fn into_context(self) -> C {
        self.context
    }
}

struct TreeWalkStatementInterpreter {
    call_depth: usize,
    /// Scope distances for the code currently executing.
    resolution: Arc<ResolutionMap>,
}

impl TreeWalkStatementInterpreter {
    fn create() -> Self {
        Self {
            call_depth: 0,
            resolution: Arc::default(),
        }
    }

    fn interpret_program<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        program: &ResolvedProgram,
    ) -> Result<(), RuntimeError> {
        for stmt in program.program.iter() {
            self.interpret_statement(environment, context, stmt)?;
        }
        Ok(())
    }

    fn interpret_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        statement: &Statement,
    ) -> Result<ProgramState, RuntimeError> {
        match statement {
            Statement::VariableDecl(decl) => {
                self.interpret_variable_declaration(environment, context, decl)
            }
            Statement::FunctionDecl(decl) => {
                self.interpret_function_declaration(environment, decl)
            }
            Statement::ClassDecl(decl) => self.interpret_class_declaration(environment, decl),
            Statement::Expression(stmt) => {
                let _ = self.evaluate(environment, context, &stmt.expr)?;
                Ok(ProgramState::Run)
            }
            Statement::Print(stmt) => {
                let result = self.evaluate(environment, context, &stmt.expr)?;
                context.writeln(&format!("{result}"));
                Ok(ProgramState::Run)
            }
            Statement::Block(stmt) => self.interpret_block_statement(environment, context, stmt),
            Statement::If(stmt) => self.interpret_if_statement(environment, context, stmt),
            Statement::While(stmt) => self.interpret_while_statement(environment, context, stmt),
            Statement::For(stmt) => self.interpret_for_statement(environment, context, stmt),
            Statement::Return(stmt) => {
                self.interpret_return_statement(environment, context, stmt)
            }
        }
    }

    fn evaluate<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        expr: &Expression,
    ) -> Result<LoxValue, RuntimeError> {
        self.evaluate_expression_node(environment, context, expr, expr.get_root_ref())
    }
}

// Statement interpreter
impl TreeWalkStatementInterpreter {
    fn interpret_variable_declaration<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        decl: &VariableDecl,
    ) -> Result<ProgramState, RuntimeError> {
        let initial = if let Some(expr) = &decl.initial {
            self.evaluate(environment, context, expr)?
        } else {
            LoxValue::Nil
        };
        environment.declare(&decl.name.name, initial);
        Ok(ProgramState::Run)
    }

    fn interpret_function_declaration(
        &mut self,
        environment: &mut SharedEnvironment,
        decl: &Arc<FunctionDecl>,
    ) -> Result<ProgramState, RuntimeError> {
        let function = Function {
            declaration: decl.clone(),
            closure: environment.clone(),
            is_initializer: false,
            resolution: self.resolution.clone(),
        };
        environment.declare(&decl.name.name, LoxValue::Function(Arc::new(function)));
        Ok(ProgramState::Run)
    }

    fn interpret_class_declaration(
        &mut self,
        environment: &mut SharedEnvironment,
        decl: &ClassDecl,
    ) -> Result<ProgramState, RuntimeError> {
        let mut methods = HashMap::new();
        for method in decl.methods.iter() {
            let function = Function {
                declaration: method.clone(),
                closure: environment.clone(),
                is_initializer: method.name.name == "init",
                resolution: self.resolution.clone(),
            };
            methods.insert(method.name.name.clone(), Arc::new(function));
        }

        let class = Class {
            name: decl.name.clone(),
            methods,
        };
        environment.declare(&decl.name.name, LoxValue::Class(Arc::new(class)));
        Ok(ProgramState::Run)
    }

    fn interpret_body<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        body: &[Statement],
    ) -> Result<ProgramState, RuntimeError> {
        for stmt in body.iter() {
            match self.interpret_statement(environment, context, stmt)? {
                ProgramState::Run => {}
                state => return Ok(state),
            }
        }
        Ok(ProgramState::Run)
    }

    fn interpret_block_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        block: &BlockStatement,
    ) -> Result<ProgramState, RuntimeError> {
        let mut environment = environment.new_scope();
        self.interpret_body(&mut environment, context, &block.body)
    }

    fn interpret_if_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        stmt: &IfStatement,
    ) -> Result<ProgramState, RuntimeError> {
        if self
            .evaluate(environment, context, &stmt.condition)?
            .is_truthy()
        {
            self.interpret_statement(environment, context, &stmt.success)
        } else if let Some(ref failure) = stmt.failure {
            self.interpret_statement(environment, context, failure)
        } else {
            Ok(ProgramState::Run)
        }
    }

    fn interpret_while_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        stmt: &WhileStatement,
    ) -> Result<ProgramState, RuntimeError> {
        while self
            .evaluate(environment, context, &stmt.condition)?
            .is_truthy()
        {
            match self.interpret_statement(environment, context, &stmt.body)? {
                ProgramState::Run => {}
                s => return Ok(s),
            }
        }

        Ok(ProgramState::Run)
    }

    fn interpret_for_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        stmt: &ForStatement,
    ) -> Result<ProgramState, RuntimeError> {
        // Run the initializer
        let mut environment = environment.new_scope();
        match &stmt.initializer {
            Some(Initializer::VariableDecl(decl)) => {
                self.interpret_variable_declaration(&mut environment, context, decl)?;
            }
            Some(Initializer::Expression(stmt)) => {
                let _ = self.evaluate(&mut environment, context, &stmt.expr)?;
            }
            None => {}
        };

        loop {
            let flag = match stmt.condition {
                Some(ref condition) => self
                    .evaluate(&mut environment, context, condition)?
                    .is_truthy(),
                None => true,
            };

            if !flag {
                return Ok(ProgramState::Run);
            }

            // Run body
            match self.interpret_statement(&mut environment, context, &stmt.body)? {
                ProgramState::Run => {}
                state @ ProgramState::Return(_) => return Ok(state),
            }

            // Increment
            if let Some(ref increment) = stmt.increment {
                self.evaluate(&mut environment, context, increment)?;
            }
        }
    }

    fn interpret_return_statement<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        stmt: &ReturnStatement,
    ) -> Result<ProgramState, RuntimeError> {
        let value = if let Some(ref expr) = stmt.value {
            self.evaluate(environment, context, expr)?
        } else {
            LoxValue::Nil
        };

        Ok(ProgramState::Return(value))
    }
}

// Expression evaluator
impl TreeWalkStatementInterpreter {
    fn evaluate_expression_node<C: SystemContext>(
        &mut self,
        environment: &mut SharedEnvironment,
        context: &mut C,
        expr: &Expression,
        node: ExpressionNodeRef,
    ) -> Result<LoxValue, RuntimeError> {
        const MSG: &str = "Node ref came from the tree so it must exist.";
        let current_node = expr.get_node(node).expect(MSG);
        let span = expr.get_subspan(node).expect(MSG);

        let result = match current_node {
            ExpressionNode::Atom(ref atom) => self.evaluate_atom(environment, atom)?,
            ExpressionNode::Prefix { operator, rhs } => {
                let rhs = self.evaluate_expression_node(environment, context, expr, *rhs)?;
                self.evaluate_prefix(*operator, &rhs)
                    .map_err(|kind| RuntimeError { kind, span })?
            }
            ExpressionNode::Group { inner } => {
                self.evaluate_expression_node(environment, context, expr, *inner)?
            }
            ExpressionNode::Infix { operator, lhs, rhs } => {
                let lhs = self.evaluate_expression_node(environment, context, expr, *lhs)?;
                let rhs = self.evaluate_expression_node(environment, context, expr, *rhs)?;
                self.evaluate_infix(*operator, &lhs, &rhs)
                    .map_err(|kind| RuntimeError { kind, span })?
            }
            ExpressionNode::InfixAssignment { lhs, rhs } => {
                let rhs = self.evaluate_expression_node(environment, context, expr, *rhs)?;
                self.assign_variable(environment, lhs, rhs.clone())
                    .map_err(|kind| RuntimeError { kind, span })?;
                rhs
            }
            ExpressionNode::InfixShortCircuit { operator, lhs, rhs } => {
                let lhs = self.evaluate_expression_node(environment, context, expr, *lhs)?;
                let short_circuits = match operator {
                    InfixShortCircuitOperator::And => !lhs.is_truthy(),
                    InfixShortCircuitOperator::Or => lhs.is_truthy(),
                };
                if short_circuits {
                    lhs
                } else {
                    self.evaluate_expression_node(environment, context, expr, *rhs)?
                }
            }
            ExpressionNode::Call { callee, arguments } => {
                let callee = self.evaluate_expression_node(environment, context, expr, *callee)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments.iter() {
                    values.push(self.evaluate_expression_node(
                        environment,
                        context,
                        expr,
                        *argument,
                    )?);
                }
                self.call_value(context, callee, values, span)?
            }
            ExpressionNode::Get { object, name } => {
                let object_value =
                    self.evaluate_expression_node(environment, context, expr, *object)?;
                let LoxValue::Instance(ref instance) = object_value else {
                    return Err(RuntimeError {
                        kind: RuntimeErrorKind::InvalidInstanceGet(object_value),
                        span,
                    });
                };

                let field = instance.fields.lock().unwrap().get(&name.name).cloned();
                match field {
                    // Field is a property (value)
                    Some(value) => value,
                    // Field is a method
                    None => match instance.class.find_method(&name.name) {
                        Some(method) => LoxValue::Function(Arc::new(method.bind(instance.clone()))),
                        None => {
                            return Err(RuntimeError {
                                kind: RuntimeErrorKind::UndefinedProperty {
                                    object: object_value.clone(),
                                    name: name.name.clone(),
                                },
                                span,
                            })
                        }
                    },
                }
            }
            ExpressionNode::Set {
                object,
                name,
                value,
            } => {
                let lhs = self.evaluate_expression_node(environment, context, expr, *object)?;
                let LoxValue::Instance(instance) = lhs else {
                    return Err(RuntimeError {
                        kind: RuntimeErrorKind::InvalidInstanceSet(lhs),
                        span,
                    });
                };
                let rhs = self.evaluate_expression_node(environment, context, expr, *value)?;
                // Grab fields after evaluating to avoid deadlocks
                let mut fields = instance.fields.lock().unwrap();
                fields.insert(name.name.clone(), rhs.clone());
                rhs
            }
        };
        Ok(result)
    }

    fn evaluate_atom(
        &self,
        environment: &SharedEnvironment,
        atom: &ExpressionAtom,
    ) -> Result<LoxValue, RuntimeError> {
        let name = match &atom.kind {
            ExpressionAtomKind::Number(v) => return Ok(LoxValue::Number(*v)),
            ExpressionAtomKind::Bool(v) => return Ok(LoxValue::Bool(*v)),
            ExpressionAtomKind::Nil => return Ok(LoxValue::Nil),
            ExpressionAtomKind::StringLiteral(v) => return Ok(LoxValue::String(v.clone())),
            ExpressionAtomKind::Identifier(name) => name.clone(),
            ExpressionAtomKind::This => "this".into(),
        };
        let ident = Ident {
            name,
            span: atom.span,
        };
        self.read_variable(environment, &ident)
    }

    fn read_variable(
        &self,
        environment: &SharedEnvironment,
        ident: &Ident,
    ) -> Result<LoxValue, RuntimeError> {
        let value = match self.resolution.get(ident) {
            Some(depth) => environment.access_at(&ident.name, *depth),
            None => environment.access_global(&ident.name),
        };
        value.ok_or_else(|| RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable(ident.name.clone()),
            span: ident.span,
        })
    }

    fn assign_variable(
        &self,
        environment: &mut SharedEnvironment,
        ident: &Ident,
        value: LoxValue,
    ) -> Result<(), RuntimeErrorKind> {
        match self.resolution.get(ident) {
            Some(depth) => environment.assign_at(&ident.name, value, *depth),
            None => environment.assign_global(&ident.name, value),
        }
    }

    fn evaluate_prefix(
        &self,
        operator: PrefixOperator,
        rhs: &LoxValue,
    ) -> Result<LoxValue, RuntimeErrorKind> {
        type Operator = PrefixOperator;
        match operator {
            Operator::Bang => Ok(LoxValue::Bool(rhs.logical_not())),
            Operator::Minus => rhs.numeric_negate(),
        }
    }

    fn evaluate_infix(
        &self,
        operator: InfixOperator,
        lhs: &LoxValue,
        rhs: &LoxValue,
    ) -> Result<LoxValue, RuntimeErrorKind> {
        type Operator = InfixOperator;
        match operator {
            Operator::Add => lhs.add(rhs),
            Operator::Subtract => lhs.subtract(rhs),
            Operator::Multiply => lhs.multiply(rhs),
            Operator::Divide => lhs.divide(rhs),
            Operator::LessThan => lhs.less_than(rhs),
            Operator::LessThanEqual => lhs.less_than_or_equal(rhs),
            Operator::GreaterThan => lhs.greater_than(rhs),
            Operator::GreaterThanEqual => lhs.greater_than_or_equal(rhs),
            Operator::EqualEqual => Ok(LoxValue::Bool(lhs.is_equal(rhs))),
            Operator::BangEqual => Ok(LoxValue::Bool(lhs.is_not_equal(rhs))),
        }
    }

    fn call_value<C: SystemContext>(
        &mut self,
        context: &mut C,
        callee: LoxValue,
        arguments: Vec<LoxValue>,
        span: Span,
    ) -> Result<LoxValue, RuntimeError> {
        let check_arity = |expected: usize| {
            if arguments.len() != expected {
                Err(RuntimeError {
                    kind: RuntimeErrorKind::InvalidArgumentCount {
                        actual: arguments.len(),
                        expected,
                    },
                    span,
                })
            } else {
                Ok(())
            }
        };

        match callee {
            LoxValue::NativeFunction(fun) => {
                check_arity(fun.get_parameters().len())?;
                fun.call(&arguments)
                    .map_err(|kind| RuntimeError { kind, span })
            }
            LoxValue::Function(function) => {
                check_arity(function.arity())?;
                self.call_function(context, &function, arguments, span)
            }
            LoxValue::Class(class) => {
                check_arity(class.arity())?;
                let instance = Arc::new(Instance::new(class.clone()));
                if let Some(initializer) = class.find_method("init") {
                    let bound_method = initializer.bind(instance.clone());
                    self.call_function(context, &bound_method, arguments, span)?;
                }
                Ok(LoxValue::Instance(instance))
            }
            v => Err(RuntimeError {
                kind: RuntimeErrorKind::InvalidCallee(v),
                span,
            }),
        }
    }

    fn call_function<C: SystemContext>(
        &mut self,
        context: &mut C,
        function: &Function,
        arguments: Vec<LoxValue>,
        span: Span,
    ) -> Result<LoxValue, RuntimeError> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError {
                kind: RuntimeErrorKind::StackOverflow,
                span,
            });
        }

        // Set up scope
        let mut inner_scope = function.closure.new_scope();
        for (ident, argument) in function.declaration.parameters.iter().zip(arguments) {
            inner_scope.declare(&ident.name, argument);
        }

        let caller_resolution =
            std::mem::replace(&mut self.resolution, function.resolution.clone());
        self.call_depth += 1;
        let state = self.interpret_body(&mut inner_scope, context, &function.declaration.body);
        self.call_depth -= 1;
        let resolution = std::mem::replace(&mut self.resolution, caller_resolution);

        // A body declared by another program carries spans into that
        // program's text, so report the failure at this call site instead.
        let state = state.map_err(|error| {
            if Arc::ptr_eq(&resolution, &self.resolution) {
                error
            } else {
                RuntimeError { span, ..error }
            }
        });

        if function.is_initializer {
            state?;
            return Ok(function
                .closure
                .access_at("this", 0)
                .expect("Initializers are only reachable through a bound instance."));
        }

        match state? {
            ProgramState::Run => Ok(LoxValue::Nil),
            ProgramState::Return(value) => Ok(value),
        }
    }
}
