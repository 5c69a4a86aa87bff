use crate::{session::Variables, store::ExecutionStore};
use std::time::Duration;

pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(500);

/// Step observer that publishes each step to the store and then holds the
/// paused state on screen for a fixed delay.
#[derive(Debug, Clone)]
pub struct StepPacer {
    store: ExecutionStore,
    delay: Duration,
}

impl StepPacer {
    pub fn new(store: ExecutionStore, delay: Duration) -> Self {
        Self { store, delay }
    }

    pub fn with_default_delay(store: ExecutionStore) -> Self {
        Self::new(store, DEFAULT_STEP_DELAY)
    }

    pub fn get_delay(&self) -> Duration {
        self.delay
    }

    pub async fn observe(&self, line: usize, variables: Variables) {
        tracing::debug!(line, variables = variables.len(), "step");
        self.store.set_current_line(Some(line));
        self.store.set_variables(variables);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
