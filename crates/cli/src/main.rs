mod config;
mod input;
mod render;
mod replay;
mod store;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trajview", about = "trajview - replay recorded agent trajectories step by step")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a trajectory interactively (commands are read from stdin)
    Replay(replay::ReplayArgs),

    /// Print every message of one trajectory
    Show(replay::ShowArgs),

    /// List available models and tasks
    List(store::StoreArgs),

    /// Show the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match config::load_config() {
        Ok(config) => match cli.command {
            Commands::Replay(args) => replay::run_replay(args, config).await,
            Commands::Show(args) => replay::run_show(args, config).await,
            Commands::List(args) => replay::run_list(args, config).await,
            Commands::Config => config::show_config(&config),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
