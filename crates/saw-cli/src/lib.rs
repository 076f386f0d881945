pub mod cli;
pub mod common;

pub use cli::{Cli, Commands, ConfigCommands};
pub use common::{EngineKind, OutputFormat};
