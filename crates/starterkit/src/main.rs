mod cli;
mod commands;
mod config;
mod error;
mod output;
mod prompt;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "iot", &mut std::io::stdout());
            Ok(())
        }

        Command::Config(args) => {
            let cfg = config::load_config()?;
            commands::config_cmd::handle(&args, cfg)
        }

        Command::ConfigureDevice => {
            let cfg = config::load_config()?;
            tracing::debug!("configuring device");
            commands::configure_device::handle(&cli.global, &cfg).await
        }

        Command::ConfigureButton(args) => {
            let cfg = config::load_config()?;
            tracing::debug!("configuring button");
            commands::configure_button::handle(&args, &cli.global, &cfg).await
        }
    }
}
