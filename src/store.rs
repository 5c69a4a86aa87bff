use crate::session::Variables;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a front end renders for the current run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub is_running: bool,
    pub output: String,
    pub error: Option<String>,
    pub current_line: Option<usize>,
    pub variables: Variables,
    pub step_mode: bool,
    /// Set by [`ExecutionStore::request_stop`]. Nothing consumes it mid-run.
    pub stop_requested: bool,
}

/// Shared handle onto the [`ExecutionState`]. Clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStore {
    inner: Arc<Mutex<ExecutionState>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere must not wedge the UI state, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ExecutionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ExecutionState {
        self.lock().clone()
    }

    pub fn set_running(&self, is_running: bool) {
        self.lock().is_running = is_running;
    }

    pub fn set_output(&self, output: String) {
        self.lock().output = output;
    }

    pub fn append_output(&self, delta: &str) {
        self.lock().output.push_str(delta);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.lock().error = error;
    }

    pub fn set_current_line(&self, line: Option<usize>) {
        self.lock().current_line = line;
    }

    pub fn set_variables(&self, variables: Variables) {
        self.lock().variables = variables;
    }

    pub fn set_step_mode(&self, step_mode: bool) {
        self.lock().step_mode = step_mode;
    }

    /// Clears everything a run produces. `step_mode` is a user preference and survives.
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = ExecutionState {
            step_mode: state.step_mode,
            ..ExecutionState::default()
        };
    }

    /// Records a stop request. A run already in flight still runs to the end.
    pub fn request_stop(&self) {
        let mut state = self.lock();
        state.stop_requested = true;
        if state.is_running {
            tracing::warn!("stop requested, but an in-flight run cannot be interrupted");
        }
    }
}
