use std::{collections::HashMap, path::Path, time::Duration};

use color_eyre::eyre::Result;
use loxpad::{
    config::{Config, ConfigError, ENV_LOG, ENV_STEP_DELAY_MS, ENV_TRAILING},
    driver::TrailingUnitPolicy,
};

fn environment(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.step_delay(), Duration::from_millis(500));
    assert_eq!(config.step.trailing, TrailingUnitPolicy::Report);
    assert_eq!(config.log.filter, "warn");
}

#[test]
fn test_partial_file_keeps_defaults() -> Result<()> {
    let config = Config::from_toml_str("[step]\ntrailing = \"drop\"\n")?;
    assert_eq!(config.step.trailing, TrailingUnitPolicy::Drop);
    assert_eq!(config.step.delay_ms, 500);
    assert_eq!(config.log.filter, "warn");
    Ok(())
}

#[test]
fn test_environment_overrides_file() -> Result<()> {
    let config = Config::from_toml_str("[step]\ndelay_ms = 100\n[log]\nfilter = \"info\"\n")?
        .with_env(environment(&[
            (ENV_STEP_DELAY_MS, " 25 "),
            (ENV_TRAILING, "Drop"),
            (ENV_LOG, "loxpad=trace"),
        ]))?;
    assert_eq!(config.step_delay(), Duration::from_millis(25));
    assert_eq!(config.step.trailing, TrailingUnitPolicy::Drop);
    assert_eq!(config.log.filter, "loxpad=trace");
    Ok(())
}

#[test]
fn test_invalid_environment_value() {
    let error = Config::default()
        .with_env(environment(&[(ENV_TRAILING, "sometimes")]))
        .expect_err("Unknown policy");
    assert!(matches!(error, ConfigError::Env { name, .. } if name == ENV_TRAILING));

    let error = Config::default()
        .with_env(environment(&[(ENV_STEP_DELAY_MS, "soon")]))
        .expect_err("Not a number");
    assert!(matches!(error, ConfigError::Env { name, .. } if name == ENV_STEP_DELAY_MS));
}

#[test]
fn test_unknown_policy_in_file() {
    assert!(Config::from_toml_str("[step]\ntrailing = \"sometimes\"\n").is_err());
}

#[test]
fn test_missing_file() {
    let error = Config::load(Some(Path::new("./test_data/does_not_exist.toml")))
        .expect_err("File is missing");
    assert!(matches!(error, ConfigError::Read { .. }));
}
