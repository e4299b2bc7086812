use clap::{command, Parser, Subcommand};

use chaincode_common::{
    config::{init_global_config, GlobalConfig},
    error::log_error,
    logger,
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "chaincode", about = "Idempotent smart-contract deployment orchestrator")]
struct ChaincodeCli {
    #[command(subcommand)]
    command: ChaincodeSubcommands,
    #[clap(flatten)]
    global: ChaincodeGlobalArgs,
}

#[derive(Subcommand, Debug)]
enum ChaincodeSubcommands {
    /// Run a deployment plan against a chain
    Deploy(commands::deploy::DeployArgs),
    /// Delete persisted results for contracts no longer in the plan
    Reap(commands::reap::ReapArgs),
}

#[derive(Parser, Debug)]
#[clap(next_help_heading = "Global options")]
struct ChaincodeGlobalArgs {
    /// Verbose mode
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    human_panic::setup_panic!();
    let cli_args = ChaincodeCli::parse();
    match run_subcommand(cli_args).await {
        Ok(_) => {}
        Err(error) => {
            log_error(error);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run_subcommand(cli_args: ChaincodeCli) -> anyhow::Result<()> {
    init_global_config(GlobalConfig {
        verbose: cli_args.global.verbose,
    });

    logger::new_empty_line();
    logger::intro();

    match cli_args.command {
        ChaincodeSubcommands::Deploy(args) => commands::deploy::run(args).await,
        ChaincodeSubcommands::Reap(args) => commands::reap::run(args).await,
    }
}
