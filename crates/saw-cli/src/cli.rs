use crate::common::{EngineKind, OutputFormat};
use clap::{Parser, Subcommand, ValueHint};
use saw_transport::Binding;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "saw", author, version, about = "Drive a SimAuto engine from the command line", long_about = None)]
pub struct Cli {
    /// Set the logging level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// Engine to talk to
    #[arg(long, global = true, value_enum, default_value_t = EngineKind::Bridge)]
    pub engine: EngineKind,

    /// Bridge executable (defaults to the configured one, then ~/.saw/bin, then PATH)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub bridge: Option<PathBuf>,

    /// Dispatch mode for the bridge
    #[arg(long, global = true, value_parser = parse_binding)]
    pub binding: Option<Binding>,

    /// Configuration file (defaults to ~/.saw/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output format for tables
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

fn parse_binding(s: &str) -> Result<Binding, String> {
    s.parse()
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the field catalog of an object type
    Fields {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        object_type: String,
    },
    /// Show the key fields of an object type
    Keys {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        object_type: String,
    },
    /// List every element of an object type by its key fields
    List {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        object_type: String,
        /// Named filter, or empty for all elements
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Read fields of every element of an object type
    Get {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        object_type: String,
        /// Comma-separated field names
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Change elements from a CSV file whose header names the fields
    Set {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        object_type: String,
        /// CSV input; must include the key fields
        #[arg(long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Re-read and confirm every value was applied
        #[arg(long)]
        verify: bool,
        /// Save the case here afterwards
        #[arg(long, value_hint = ValueHint::FilePath)]
        save: Option<PathBuf>,
        /// File type used with --save
        #[arg(long, default_value = "PWB")]
        save_format: String,
    },
    /// Solve the power flow and print results
    Solve {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Solution method
        #[arg(long, default_value = "rectnewt")]
        method: String,
        /// Object types to print results for
        #[arg(long, value_delimiter = ',', default_value = "bus")]
        results: Vec<String>,
        #[arg(long, value_hint = ValueHint::FilePath)]
        save: Option<PathBuf>,
        #[arg(long, default_value = "PWB")]
        save_format: String,
    },
    /// Run script statements in order
    Script {
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        #[arg(required = true)]
        statements: Vec<String>,
    },
    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn field_lists_split_on_commas() {
        let cli = Cli::parse_from(["saw", "get", "case.pwb", "bus", "--fields", "BusNum,BusName"]);
        match cli.command {
            Commands::Get { fields, .. } => assert_eq!(fields, vec!["BusNum", "BusName"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "saw", "list", "case.pwb", "gen", "--engine", "memory", "--binding", "late",
        ]);
        assert_eq!(cli.engine, EngineKind::Memory);
        assert_eq!(cli.binding, Some(Binding::Late));
    }
}
