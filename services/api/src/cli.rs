use crate::demo::{run_demo, run_optimize, DemoArgs, OptimizeArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use land_allocation::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Land Allocation Engine",
    about = "Evaluate plots against applications and run allocation rounds",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one allocation round over a registry fixture and print the outcome
    Optimize(OptimizeArgs),
    /// Run an allocation round over a synthetic county fixture
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Registry fixture backing the providers; the synthetic county is used when omitted
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Optimize(args) => run_optimize(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
