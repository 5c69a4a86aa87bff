use crate::value::{error::RuntimeErrorKind, LoxValue, NativeFunction};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// The native functions installed into every global scope.
pub fn natives() -> Vec<Arc<dyn NativeFunction>> {
    vec![Arc::new(NativeClock)]
}

/// Names of the native functions, which are never reported as user variables.
pub fn native_names() -> impl Iterator<Item = &'static str> {
    natives().into_iter().map(|native| native.get_name())
}

#[derive(Debug)]
pub struct NativeClock;

impl NativeFunction for NativeClock {
    fn get_name(&self) -> &'static str {
        "clock"
    }

    fn call(&self, arguments: &[LoxValue]) -> Result<LoxValue, RuntimeErrorKind> {
        let _ = arguments;
        let duration_since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RuntimeErrorKind::NativeFailure(e.to_string()))?;
        Ok(LoxValue::Number(duration_since_epoch.as_secs_f64()))
    }

    fn get_parameters(&self) -> &'static [&'static str] {
        &[]
    }
}
