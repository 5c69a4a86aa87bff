use super::{
    error::SessionError,
    variables::{Value, Variables},
};
use crate::{environment::SharedEnvironment, string::IdentName, value::LoxValue};
use std::collections::HashSet;

// Largest magnitude an `f64` can hold while still converting to `i64` exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Maps any runtime value onto a JSON-safe [`Value`]. Never fails.
pub fn classify(value: &LoxValue) -> Value {
    match value {
        LoxValue::Number(v) if !v.is_finite() => Value::Tag(type_tag("number")),
        LoxValue::Number(v) if v.fract() == 0.0 && v.abs() <= MAX_EXACT_INTEGER => {
            Value::Int(*v as i64)
        }
        LoxValue::Number(v) => Value::Float(*v),
        LoxValue::String(v) => Value::Str(v.to_string()),
        LoxValue::Bool(v) => Value::Bool(*v),
        LoxValue::Nil => Value::Null,
        LoxValue::NativeFunction(_) => Value::Tag(type_tag("native function")),
        LoxValue::Function(_) => Value::Tag(type_tag("function")),
        LoxValue::Class(_) => Value::Tag(type_tag("class")),
        LoxValue::Instance(instance) => Value::Tag(type_tag(&instance.class.name.name)),
    }
}

fn type_tag(name: &str) -> String {
    format!("<class '{name}'>")
}

/// Whether a global is bookkeeping rather than a user binding. A reserved
/// name stays hidden only while it still holds its native function.
pub fn is_hidden(name: &str, value: &LoxValue, reserved: &HashSet<IdentName>) -> bool {
    name.starts_with('_')
        || (reserved.contains(name) && matches!(value, LoxValue::NativeFunction(_)))
}

/// Classifies every visible global binding.
pub fn snapshot(
    globals: &SharedEnvironment,
    reserved: &HashSet<IdentName>,
) -> Result<Variables, SessionError> {
    let bindings = globals
        .bindings()
        .map_err(|e| SessionError::Capture(e.to_string()))?;
    Ok(bindings
        .into_iter()
        .filter(|(name, value)| !is_hidden(name, value, reserved))
        .map(|(name, value)| (name.to_string(), classify(&value)))
        .collect())
}
