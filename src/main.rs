use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod config;
mod dispatch;
mod error;
mod github;
mod owners;
mod selector;
mod webhook;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose picks debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("blunderbuss=debug")
        } else {
            EnvFilter::new("blunderbuss=info")
        }
    });

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(&cli.config, args).await,
        Commands::Select(args) => cli::select::execute(&cli.config, args).await,
        Commands::Schema(args) => cli::schema::execute(args),
    }
}
