use anyhow::{Context, Result};
use clap::Parser;
use saw_cli::cli::Cli;
use saw_session::SawConfig;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    // Logs go to stderr so stdout stays clean for piping.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install log subscriber: {err}");
    }
}

fn load_config(cli: &Cli) -> Result<SawConfig> {
    match &cli.config {
        Some(path) => SawConfig::load_from(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => SawConfig::load().context("loading config"),
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    debug!(?config, "effective configuration");
    commands::handle(cli, &config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
