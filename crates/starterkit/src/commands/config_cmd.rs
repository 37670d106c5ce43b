//! Config subcommand handlers.

use starterkit_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, cfg: Config) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Show => {
            output::print_output(&toml::to_string_pretty(&cfg).map_err(|e| {
                CliError::Internal(format!("failed to render config: {e}"))
            })?);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = cfg;
            cfg.set(key, value)?;
            let path = config::save_config(&cfg)?;
            eprintln!("✓ Set {key} in {}", path.display());
            Ok(())
        }
    }
}
