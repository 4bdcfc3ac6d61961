mod cli;
mod commands;
mod config;
mod error;
mod output;

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
        // Local commands never open a connection
        Command::Aliases => commands::aliases::handle(&cli.global),
        Command::Credential(args) => commands::credential::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "resttc", &mut std::io::stdout());
            Ok(())
        }

        // Everything else talks to the server, then logs out
        cmd => {
            let mut client = config::build_client(&cli.global)?;
            let alias = client.alias_name().to_owned();

            tracing::debug!(command = ?cmd, alias = %alias, "dispatching command");
            let result = commands::dispatch(cmd, &mut client, &cli.global).await;
            client.shutdown().await;
            result.map_err(|e| e.for_alias(&alias))
        }
    }
}
