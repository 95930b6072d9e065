use clap::Parser;
use roster::cli::{Cli, Commands, cmd_init, cmd_serve, cmd_status};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Init { force, seed } => cmd_init(&cli.database, force, seed).map(|_| ()),
        Commands::Status { json } => cmd_status(&cli.database, json).map(|_| ()),
        Commands::Serve(args) => cmd_serve(&cli.database, args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
