//! Sequences source text through a [`RuntimeSession`] and reports output,
//! errors and variable snapshots into an [`ExecutionStore`].

pub mod error;

use crate::{
    boundary::{self, Scanned, UnitScanner},
    formatter::{BasicFormatter, ErrorFormatter},
    session::{RuntimeSession, SessionError, Variables},
    store::ExecutionStore,
};
pub use error::DriverError;
use serde::Deserialize;
use std::future::Future;

/// What to do with a unit still open when the source runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingUnitPolicy {
    /// Fail the run with the unit's end-of-input syntax error.
    #[default]
    Report,
    /// Discard the unit with a warning in the log.
    Drop,
}

impl std::str::FromStr for TrailingUnitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "report" => Ok(Self::Report),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown trailing unit policy `{other}`")),
        }
    }
}

// Clears `is_running` however the run ends, unwinding included.
struct RunningGuard<'a> {
    store: &'a ExecutionStore,
}

impl<'a> RunningGuard<'a> {
    fn start(store: &'a ExecutionStore) -> Self {
        store.reset();
        store.set_running(true);
        Self { store }
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.store.set_running(false);
    }
}

pub struct ExecutionDriver<S: RuntimeSession> {
    session: Option<S>,
    store: ExecutionStore,
    trailing: TrailingUnitPolicy,
}

impl<S: RuntimeSession> ExecutionDriver<S> {
    pub fn new(store: ExecutionStore) -> Self {
        Self {
            session: None,
            store,
            trailing: TrailingUnitPolicy::default(),
        }
    }

    pub fn with_trailing_policy(mut self, trailing: TrailingUnitPolicy) -> Self {
        self.trailing = trailing;
        self
    }

    pub fn attach(&mut self, session: S) {
        self.session = Some(session);
    }

    /// Awaits `bootstrap` the first time only. Later calls leave the session alone.
    pub async fn initialize<F>(&mut self, bootstrap: F) -> Result<(), DriverError>
    where
        F: Future<Output = Result<S, SessionError>>,
    {
        if self.session.is_some() {
            tracing::debug!("session already initialized");
            return Ok(());
        }
        let session = match bootstrap.await {
            Ok(session) => session,
            Err(error) => {
                let error = DriverError::from(error);
                tracing::error!(%error, "runtime session failed to start");
                self.store.set_error(Some(BasicFormatter.format_error(&error)));
                return Err(error);
            }
        };
        self.session = Some(session);
        tracing::info!("runtime session ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    pub fn get_store(&self) -> &ExecutionStore {
        &self.store
    }

    fn finish(store: &ExecutionStore, result: Result<(), DriverError>) -> Result<(), DriverError> {
        match result {
            Ok(()) => {
                tracing::info!("run finished");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "run failed");
                store.set_error(Some(BasicFormatter.format_error(&error)));
                Err(error)
            }
        }
    }

    /// Runs the whole source as one program.
    pub async fn run(&mut self, source: &str) -> Result<(), DriverError> {
        let store = self.store.clone();
        let Some(session) = self.session.as_mut() else {
            return Err(not_ready(&store));
        };

        let _running = RunningGuard::start(&store);
        tracing::info!(bytes = source.len(), "run to completion");
        let result = run_to_completion(session, &store, source).await;
        Self::finish(&store, result)
    }

    /// Runs the source one statement unit at a time, awaiting `on_step`
    /// with the unit's last line index and the globals after each unit.
    pub async fn run_step_by_step<F, Fut>(
        &mut self,
        source: &str,
        on_step: F,
    ) -> Result<(), DriverError>
    where
        F: FnMut(usize, Variables) -> Fut,
        Fut: Future<Output = ()>,
    {
        let store = self.store.clone();
        let trailing = self.trailing;
        let Some(session) = self.session.as_mut() else {
            return Err(not_ready(&store));
        };

        let _running = RunningGuard::start(&store);
        tracing::info!(bytes = source.len(), ?trailing, "run step by step");
        let result = step_through(session, &store, trailing, source, on_step).await;
        Self::finish(&store, result)
    }
}

fn not_ready(store: &ExecutionStore) -> DriverError {
    let error = DriverError::NotReady;
    tracing::error!(%error, "run requested before initialization");
    store.set_error(Some(error.to_string()));
    error
}

// Keeps whatever the failed unit printed before it failed.
async fn salvage_output<S: RuntimeSession>(session: &mut S, store: &ExecutionStore) {
    match session.take_output().await {
        Ok(partial) => store.append_output(&partial),
        Err(error) => tracing::warn!(%error, "could not drain partial output"),
    }
}

async fn run_to_completion<S: RuntimeSession>(
    session: &mut S,
    store: &ExecutionStore,
    source: &str,
) -> Result<(), DriverError> {
    session.clear_output().await?;

    if let Err(error) = session.execute(source).await {
        salvage_output(session, store).await;
        return Err(error.into());
    }

    store.set_output(session.take_output().await?);
    store.set_variables(session.variables().await?);
    Ok(())
}

async fn step_through<S, F, Fut>(
    session: &mut S,
    store: &ExecutionStore,
    trailing: TrailingUnitPolicy,
    source: &str,
    mut on_step: F,
) -> Result<(), DriverError>
where
    S: RuntimeSession,
    F: FnMut(usize, Variables) -> Fut,
    Fut: Future<Output = ()>,
{
    session.clear_output().await?;

    let mut scanner = UnitScanner::new(source);
    while let Some(scanned) = scanner.next_unit(&*session)? {
        let unit = match scanned {
            Scanned::Complete(unit) => unit,
            Scanned::Trailing(unit) => match trailing {
                TrailingUnitPolicy::Drop => {
                    tracing::warn!(
                        first_line = unit.first_line,
                        last_line = unit.last_line,
                        "dropping incomplete statement at end of source"
                    );
                    break;
                }
                TrailingUnitPolicy::Report => match boundary::trailing_error(&*session, &unit) {
                    Some(error) => return Err(error.into()),
                    None => unit,
                },
            },
        };

        if let Err(error) = session.execute(&unit.text).await {
            salvage_output(session, store).await;
            return Err(error.shifted(unit.first_line, unit.offset).into());
        }

        store.append_output(&session.take_output().await?);
        let variables = session.variables().await?;
        tracing::debug!(line = unit.last_line, "unit executed");
        on_step(unit.last_line, variables).await;
    }
    Ok(())
}
