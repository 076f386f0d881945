use anyhow::{Context, Result};
use saw_cli::cli::{Cli, Commands};
use saw_cli::common::EngineKind;
use saw_core::CaseFileType;
use saw_session::{SawConfig, Session, SessionOptions};
use saw_transport::MemoryEngine;
use std::path::Path;

pub mod config;
pub mod read;
pub mod schema;
pub mod script;
pub mod solve;
pub mod write;

/// Start a session on `case` using the global flags over the configuration.
pub fn open_session(cli: &Cli, config: &SawConfig, case: &Path) -> Result<Session> {
    let mut options = SessionOptions::from_config(config, case);
    if let Some(binary) = &cli.bridge {
        options.bridge_binary = Some(binary.clone());
    }
    if let Some(binding) = cli.binding {
        options = options.binding(binding);
    }
    let session = match cli.engine {
        EngineKind::Bridge => Session::connect(options),
        EngineKind::Memory => Session::with_transport(Box::new(MemoryEngine::new()), options),
    };
    session.with_context(|| format!("opening case {}", case.display()))
}

/// Run `f` against a session on `case`, closing it afterwards.
fn with_session<R>(
    cli: &Cli,
    config: &SawConfig,
    case: &Path,
    f: impl FnOnce(&mut Session) -> Result<R>,
) -> Result<R> {
    let mut session = open_session(cli, config, case)?;
    let result = f(&mut session);
    session.close().context("closing session")?;
    result
}

pub(crate) fn save_if_requested(
    session: &mut Session,
    save: Option<&Path>,
    save_format: &str,
) -> Result<()> {
    if let Some(path) = save {
        let file_type = CaseFileType::from(save_format.to_string());
        session
            .save_case(Some(path), &file_type, true)
            .with_context(|| format!("saving case to {}", path.display()))?;
        eprintln!("Saved case to {} ({file_type})", path.display());
    }
    Ok(())
}

pub fn handle(cli: &Cli, config: &SawConfig) -> Result<()> {
    let format = cli.format;
    match &cli.command {
        Commands::Fields { case, object_type } => with_session(cli, config, case, |s| {
            schema::fields(s, object_type, format)
        }),
        Commands::Keys { case, object_type } => with_session(cli, config, case, |s| {
            schema::keys(s, object_type, format)
        }),
        Commands::List {
            case,
            object_type,
            filter,
        } => with_session(cli, config, case, |s| {
            read::list(s, object_type, filter, format)
        }),
        Commands::Get {
            case,
            object_type,
            fields,
            filter,
        } => with_session(cli, config, case, |s| {
            read::get(s, object_type, fields, filter, format)
        }),
        Commands::Set {
            case,
            object_type,
            input,
            verify,
            save,
            save_format,
        } => with_session(cli, config, case, |s| {
            write::set(s, object_type, input, *verify)?;
            save_if_requested(s, save.as_deref(), save_format)
        }),
        Commands::Solve {
            case,
            method,
            results,
            save,
            save_format,
        } => with_session(cli, config, case, |s| {
            solve::solve(s, method, results, format)?;
            save_if_requested(s, save.as_deref(), save_format)
        }),
        Commands::Script { case, statements } => {
            with_session(cli, config, case, |s| script::run(s, statements))
        }
        Commands::Config { command } => config::handle(command, cli.config.as_deref(), config),
    }
}
