pub mod error;

use crate::{
    environment::SharedEnvironment, parser::statement::FunctionDecl, resolver::ResolutionMap,
    string::Ident,
};
use compact_str::{CompactString, CompactStringExt};
use error::RuntimeErrorKind;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub trait NativeFunction: std::fmt::Debug + Send + Sync {
    fn get_name(&self) -> &'static str;
    fn get_parameters(&self) -> &'static [&'static str];
    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind>;
}

#[derive(Debug, Clone)]
pub struct Function {
    pub declaration: Arc<FunctionDecl>,
    pub closure: SharedEnvironment,
    pub is_initializer: bool,
    /// Scope distances of the program that declared the function.
    pub resolution: Arc<ResolutionMap>,
}

impl Function {
    pub fn get_name(&self) -> &Ident {
        &self.declaration.name
    }

    pub fn arity(&self) -> usize {
        self.declaration.parameters.len()
    }

    /// Returns a copy of the method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Arc<Instance>) -> Function {
        let mut closure = self.closure.new_scope();
        closure.declare("this", LoxValue::Instance(instance));
        Function {
            declaration: self.declaration.clone(),
            closure,
            is_initializer: self.is_initializer,
            resolution: self.resolution.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: Ident,
    pub methods: HashMap<CompactString, Arc<Function>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<&Arc<Function>> {
        self.methods.get(name)
    }

    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

pub struct Instance {
    pub class: Arc<Class>,
    pub fields: Mutex<HashMap<CompactString, LoxValue>>,
}

// Fields may refer back to the instance itself.
impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .finish_non_exhaustive()
    }
}

impl Instance {
    pub fn new(class: Arc<Class>) -> Self {
        Self {
            class,
            fields: Mutex::new(HashMap::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LoxValue {
    Number(f64),
    String(CompactString),
    Nil,
    Bool(bool),
    NativeFunction(Arc<dyn NativeFunction>),
    Function(Arc<Function>),
    Class(Arc<Class>),
    Instance(Arc<Instance>),
}

impl std::fmt::Display for LoxValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Nil => write!(f, "nil"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::NativeFunction(_) => write!(f, "<native fn>"),
            Self::Function(func) => write!(f, "<fn {}>", func.get_name()),
            Self::Class(class) => write!(f, "{}", class.name),
            Self::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

// Unary operators
impl LoxValue {
    pub fn is_truthy(&self) -> bool {
        !matches!(self, LoxValue::Bool(false) | LoxValue::Nil)
    }

    pub fn logical_not(&self) -> bool {
        !self.is_truthy()
    }

    pub fn numeric_negate(&self) -> Result<LoxValue, RuntimeErrorKind> {
        match self {
            LoxValue::Number(v) => Ok(LoxValue::Number(-v)),
            v => Err(RuntimeErrorKind::NonNumeric(v.clone())),
        }
    }
}

impl LoxValue {
    // Arithmetic + string concatenation
    pub fn add(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Number(lhs + rhs)),
            (LoxValue::String(lhs), LoxValue::String(rhs)) => {
                Ok(LoxValue::String([lhs, rhs].concat_compact()))
            }
            (lhs, rhs) => Err(RuntimeErrorKind::NonAddable(lhs.clone(), rhs.clone())),
        }
    }

    pub fn subtract(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Number(lhs - rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn multiply(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Number(lhs * rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    /// Division by zero is an error rather than an infinity.
    pub fn divide(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(_), LoxValue::Number(rhs)) if *rhs == 0.0 => {
                Err(RuntimeErrorKind::DivisionByZero)
            }
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Number(lhs / rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    // Comparison
    pub fn less_than(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Bool(lhs < rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn less_than_or_equal(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Bool(lhs <= rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn greater_than(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Bool(lhs > rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    pub fn greater_than_or_equal(&self, other: &LoxValue) -> Result<LoxValue, RuntimeErrorKind> {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => Ok(LoxValue::Bool(lhs >= rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics(lhs.clone(), rhs.clone())),
        }
    }

    // Equality
    pub fn is_equal(&self, other: &LoxValue) -> bool {
        match (self, other) {
            (LoxValue::Number(lhs), LoxValue::Number(rhs)) => lhs == rhs,
            (LoxValue::String(lhs), LoxValue::String(rhs)) => lhs == rhs,
            (LoxValue::Nil, LoxValue::Nil) => true,
            (LoxValue::Bool(lhs), LoxValue::Bool(rhs)) => lhs == rhs,
            (LoxValue::NativeFunction(lhs), LoxValue::NativeFunction(rhs)) => {
                lhs.get_name() == rhs.get_name()
            }
            (LoxValue::Function(lhs), LoxValue::Function(rhs)) => Arc::ptr_eq(lhs, rhs),
            (LoxValue::Class(lhs), LoxValue::Class(rhs)) => Arc::ptr_eq(lhs, rhs),
            (LoxValue::Instance(lhs), LoxValue::Instance(rhs)) => Arc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }

    pub fn is_not_equal(&self, other: &LoxValue) -> bool {
        !self.is_equal(other)
    }
}
