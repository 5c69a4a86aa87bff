pub mod native;

use crate::{
    string::IdentName,
    value::{error::RuntimeErrorKind, LoxValue},
};
use compact_str::ToCompactString;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("environment lock was poisoned")]
pub struct PoisonedEnvironment;

/// A scope chain shared between closures, methods and the interpreter.
#[derive(Clone)]
pub struct SharedEnvironment {
    inner: Arc<Mutex<EnvironmentImpl>>,
}

struct EnvironmentImpl {
    values: HashMap<IdentName, LoxValue>,
    parent: Option<SharedEnvironment>,
}

// Scopes can hold closures that capture the scope itself.
impl std::fmt::Debug for SharedEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEnvironment").finish_non_exhaustive()
    }
}

impl Default for SharedEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedEnvironment {
    /// Creates a global scope with the native functions installed.
    pub fn new() -> Self {
        let mut globals = HashMap::new();

        for native in native::natives() {
            globals.insert(
                native.get_name().to_compact_string(),
                LoxValue::NativeFunction(native),
            );
        }

        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl {
                values: globals,
                parent: None,
            })),
        }
    }

    pub fn new_scope(&self) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EnvironmentImpl {
                values: HashMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    // Walks `depth` scopes outwards.
    fn ancestor(&self, depth: usize) -> Option<SharedEnvironment> {
        let mut scope = self.clone();
        for _ in 0..depth {
            let parent = scope.inner.lock().unwrap().parent.clone()?;
            scope = parent;
        }
        Some(scope)
    }

    fn global(&self) -> SharedEnvironment {
        let mut scope = self.clone();
        loop {
            let parent = scope.inner.lock().unwrap().parent.clone();
            match parent {
                Some(parent) => scope = parent,
                None => return scope,
            }
        }
    }

    /// Reads `name` from the scope exactly `depth` levels out.
    pub fn access_at(&self, name: &str, depth: usize) -> Option<LoxValue> {
        let scope = self.ancestor(depth)?;
        let inner = scope.inner.lock().unwrap();
        inner.values.get(name).cloned()
    }

    pub fn access_global(&self, name: &str) -> Option<LoxValue> {
        self.global().access_at(name, 0)
    }

    pub fn assign_at(
        &mut self,
        name: &str,
        value: LoxValue,
        depth: usize,
    ) -> Result<(), RuntimeErrorKind> {
        let undefined = || RuntimeErrorKind::UndefinedVariable(name.to_compact_string());
        let scope = self.ancestor(depth).ok_or_else(undefined)?;
        let mut inner = scope.inner.lock().unwrap();
        let slot = inner.values.get_mut(name).ok_or_else(undefined)?;
        *slot = value;
        Ok(())
    }

    pub fn assign_global(&mut self, name: &str, value: LoxValue) -> Result<(), RuntimeErrorKind> {
        self.global().assign_at(name, value, 0)
    }

    pub fn declare(&mut self, name: &str, value: LoxValue) {
        let mut inner = self.inner.lock().unwrap();
        inner.values.insert(name.to_compact_string(), value);
    }

    /// Every binding of this scope alone, ignoring enclosing scopes.
    pub fn bindings(&self) -> Result<Vec<(IdentName, LoxValue)>, PoisonedEnvironment> {
        let inner = self.inner.lock().map_err(|_| PoisonedEnvironment)?;
        Ok(inner
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect())
    }
}
