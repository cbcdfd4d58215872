//! mrcheck - output and counter validation for recorded data-processing jobs

use clap::Parser;
use mrcheck::commands::Commands;
use mrcheck::{cli, common::logging};

#[derive(Parser)]
#[command(name = "mrcheck", about = "Validate recorded job outputs and counters")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Check { verbose: true, .. });
    logging::init_cli(verbose);

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
