use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use loxpad::{
    boundary::split_units,
    config::Config,
    driver::{DriverError, ExecutionDriver, TrailingUnitPolicy},
    formatter::{ErrorFormatter, PrettyFormatter},
    pacer::StepPacer,
    session::{LoxSession, Variables},
    store::ExecutionStore,
};
use std::{
    cell::Cell,
    fs::read_to_string,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(name = "loxpad", version)]
pub struct CLArgs {
    /// TOML settings file.
    #[clap(long = "config", global = true)]
    pub config: Option<PathBuf>,
    #[clap(subcommand)]
    pub routine: LoxpadCommand,
}

#[derive(Debug, Subcommand)]
pub enum LoxpadCommand {
    /// Run a program to completion.
    Run {
        path: PathBuf,
        #[clap(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Run a program one statement at a time, showing the globals after each.
    Step {
        path: PathBuf,
        #[clap(long = "delay-ms")]
        delay_ms: Option<u64>,
        #[clap(long = "trailing", value_enum)]
        trailing: Option<TrailingArg>,
        #[clap(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the statement units a program splits into without running it.
    Check { path: PathBuf },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TrailingArg {
    Report,
    Drop,
}

impl From<TrailingArg> for TrailingUnitPolicy {
    fn from(value: TrailingArg) -> Self {
        match value {
            TrailingArg::Report => TrailingUnitPolicy::Report,
            TrailingArg::Drop => TrailingUnitPolicy::Drop,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = CLArgs::parse();
    let config = Config::load(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.routine {
        LoxpadCommand::Run { path, format } => run(&path, &config, format).await,
        LoxpadCommand::Step {
            path,
            delay_ms,
            trailing,
            format,
        } => {
            let delay = delay_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.step_delay());
            let trailing = trailing
                .map(TrailingUnitPolicy::from)
                .unwrap_or(config.step.trailing);
            step(&path, delay, trailing, format).await
        }
        LoxpadCommand::Check { path } => check(&path),
    }
}

fn exit_code(error: &DriverError) -> ExitCode {
    match error {
        DriverError::Syntax(_) => ExitCode::from(65),
        DriverError::Runtime(_) => ExitCode::from(70),
        DriverError::NotReady | DriverError::Capture(_) => ExitCode::FAILURE,
    }
}

fn report(
    store: &ExecutionStore,
    format: &OutputFormat,
    path: &Path,
    src: &str,
    result: Result<(), DriverError>,
) -> Result<ExitCode> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    }
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            let formatter = PrettyFormatter::new(src, path);
            eprint!("{}", formatter.format_error(&error));
            Ok(exit_code(&error))
        }
    }
}

async fn run(path: &Path, config: &Config, format: OutputFormat) -> Result<ExitCode> {
    let src = read_to_string(path)?;
    let store = ExecutionStore::new();
    let mut driver =
        ExecutionDriver::new(store.clone()).with_trailing_policy(config.step.trailing);
    driver.initialize(LoxSession::bootstrap()).await?;

    let result = driver.run(&src).await;
    if let OutputFormat::Text = format {
        print!("{}", store.snapshot().output);
    }
    report(&store, &format, path, &src, result)
}

fn describe(variables: &Variables) -> String {
    variables
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn step(
    path: &Path,
    delay: Duration,
    trailing: TrailingUnitPolicy,
    format: OutputFormat,
) -> Result<ExitCode> {
    let src = read_to_string(path)?;
    let store = ExecutionStore::new();
    store.set_step_mode(true);
    let mut driver = ExecutionDriver::new(store.clone()).with_trailing_policy(trailing);
    driver.initialize(LoxSession::bootstrap()).await?;

    let pacer = StepPacer::new(store.clone(), delay);
    let printed = Cell::new(0usize);
    let text = matches!(format, OutputFormat::Text);
    let result = {
        let pacer = &pacer;
        let store = &store;
        let printed = &printed;
        driver
            .run_step_by_step(&src, move |line, variables| async move {
                if text {
                    let output = store.snapshot().output;
                    print!("{}", &output[printed.get()..]);
                    printed.set(output.len());
                    eprintln!("[line {}] {}", line + 1, describe(&variables));
                }
                pacer.observe(line, variables).await;
            })
            .await
    };

    if text {
        let output = store.snapshot().output;
        print!("{}", &output[printed.get().min(output.len())..]);
    }
    report(&store, &format, path, &src, result)
}

fn check(path: &Path) -> Result<ExitCode> {
    let src = read_to_string(path)?;
    let session = LoxSession::new();
    match split_units(&session, &src) {
        Ok(units) => {
            for unit in units.iter() {
                println!("lines {}-{}", unit.first_line + 1, unit.last_line + 1);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            let error = DriverError::Syntax(error);
            let formatter = PrettyFormatter::new(&src, path);
            eprint!("{}", formatter.format_error(&error));
            Ok(exit_code(&error))
        }
    }
}
