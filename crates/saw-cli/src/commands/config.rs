use anyhow::{anyhow, Result};
use saw_cli::cli::ConfigCommands;
use saw_session::SawConfig;
use std::path::Path;

pub fn handle(command: &ConfigCommands, explicit: Option<&Path>, config: &SawConfig) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let path = match explicit {
                Some(path) => path.to_path_buf(),
                None => SawConfig::config_path()
                    .ok_or_else(|| anyhow!("could not determine config directory"))?,
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}
