use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

mod commands;
mod logging;
mod render;

use commands::{
    handle_config_command,
    utils::{print_error, CliResult},
    AnalyzeArgs, CalculateArgs, ConfigCommands, GlobalArgs, PredictArgs,
};

#[derive(Parser, Debug)]
#[command(name = "blocktime")]
#[command(version, about = "Block time calculator and predictor for CometBFT chains")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculate block time statistics
    Calculate(CalculateArgs),

    /// Analyze block times per proposer
    Analyze(AnalyzeArgs),

    /// Predict when a future block will be produced
    Predict(PredictArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Config(command) => handle_config_command(command, &cli.global),
        command => run_chain_command(command, &cli.global).await,
    }
}

async fn run_chain_command(command: Commands, global: &GlobalArgs) -> CliResult<()> {
    let config = global.load_config()?;
    logging::init_logging(&config.logging);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling outstanding requests");
                cancel.cancel();
            }
        }
    });

    let result = match command {
        Commands::Calculate(args) => args.run(config, cancel).await,
        Commands::Analyze(args) => args.run(config, cancel).await,
        Commands::Predict(args) => args.run(config, cancel).await,
        Commands::Config(command) => handle_config_command(command, global),
    };

    watcher.abort();
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "command failed");
            print_error(&error.to_string());
            ExitCode::FAILURE
        }
    }
}
