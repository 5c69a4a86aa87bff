use std::time::Duration;

use loxpad::{
    pacer::{StepPacer, DEFAULT_STEP_DELAY},
    session::{Value, Variables},
    store::{ExecutionState, ExecutionStore},
};
use tokio::time::Instant;

fn sample_variables() -> Variables {
    let mut variables = Variables::new();
    variables.insert("x".into(), Value::Int(1));
    variables
}

#[tokio::test(start_paused = true)]
async fn test_observe_publishes_then_waits() {
    let store = ExecutionStore::new();
    let pacer = StepPacer::with_default_delay(store.clone());
    assert_eq!(pacer.get_delay(), DEFAULT_STEP_DELAY);

    let start = Instant::now();
    pacer.observe(3, sample_variables()).await;
    assert!(start.elapsed() >= DEFAULT_STEP_DELAY);

    let state = store.snapshot();
    assert_eq!(state.current_line, Some(3));
    assert_eq!(state.variables, sample_variables());
}

#[tokio::test(start_paused = true)]
async fn test_state_is_visible_during_the_pause() {
    let store = ExecutionStore::new();
    let pacer = StepPacer::new(store.clone(), Duration::from_millis(200));

    let observed = tokio::join!(pacer.observe(7, sample_variables()), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.snapshot().current_line
    });
    assert_eq!(observed.1, Some(7));
}

#[tokio::test(start_paused = true)]
async fn test_zero_delay_does_not_sleep() {
    let store = ExecutionStore::new();
    let pacer = StepPacer::new(store.clone(), Duration::ZERO);

    let start = Instant::now();
    pacer.observe(0, Variables::new()).await;
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(store.snapshot().current_line, Some(0));
}

#[test]
fn test_reset_keeps_step_mode() {
    let store = ExecutionStore::new();
    store.set_step_mode(true);
    store.set_running(true);
    store.set_output("1\n".into());
    store.set_error(Some("boom".into()));
    store.set_current_line(Some(4));
    store.set_variables(sample_variables());

    store.reset();
    assert_eq!(
        store.snapshot(),
        ExecutionState {
            step_mode: true,
            ..ExecutionState::default()
        }
    );
}

#[test]
fn test_clones_share_state() {
    let store = ExecutionStore::new();
    let handle = store.clone();
    handle.append_output("a");
    store.append_output("b");
    assert_eq!(handle.snapshot().output, "ab");
}

#[test]
fn test_stop_request_is_recorded() {
    let store = ExecutionStore::new();
    store.set_running(true);
    store.request_stop();

    let state = store.snapshot();
    assert!(state.stop_requested);
    assert!(state.is_running);
}

#[test]
fn test_state_serializes_camel_case() -> color_eyre::Result<()> {
    let store = ExecutionStore::new();
    store.set_current_line(Some(2));
    store.set_variables(sample_variables());

    let json: serde_json::Value = serde_json::to_value(store.snapshot())?;
    assert_eq!(json["isRunning"], false);
    assert_eq!(json["currentLine"], 2);
    assert_eq!(json["stepMode"], false);
    assert_eq!(json["variables"]["x"], 1);
    assert!(json["error"].is_null());
    Ok(())
}
