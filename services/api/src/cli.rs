use crate::demo::{run_branch_import, run_demo, run_rank, BranchImportArgs, DemoArgs, RankArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use branch_review::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Branch Review",
    about = "Score branch inspection reviews and rank branches from the command line",
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
    /// Print the branch ranking for a stored review collection
    Rank(RankArgs),
    /// Manage the branch roster
    Branches {
        #[command(subcommand)]
        command: BranchCommand,
    },
    /// Seed an in-memory store with sample reviews and print the dashboard
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum BranchCommand {
    /// Import roster rows from a CSV export
    Import(BranchImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rank(args) => run_rank(args),
        Command::Branches {
            command: BranchCommand::Import(args),
        } => run_branch_import(args),
        Command::Demo(args) => run_demo(args),
    }
}
