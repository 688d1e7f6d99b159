pub mod schema;
pub mod select;
pub mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blunderbuss")]
#[command(
    author,
    version,
    about = "Requests pull request reviews from the reviewers listed in OWNERS files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to config file
    #[arg(
        short,
        long,
        global = true,
        env = "BLUNDERBUSS_CONFIG",
        default_value = "blunderbuss.yaml"
    )]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the GitHub webhook endpoint
    Serve(ServeArgs),

    /// Pick reviewers for a set of changed files in a local checkout
    Select(SelectArgs),

    /// Print JSON Schema for config validation
    Schema(SchemaArgs),
}

#[derive(Parser, Clone)]
pub struct ServeArgs {
    /// Override the listening port
    #[arg(long)]
    pub port: Option<u16>,

    /// Log review requests instead of sending them (`--dry-run=false` to send)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub dry_run: Option<bool>,

    /// Override the webhook secret file
    #[arg(long)]
    pub hmac_secret_file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct SelectArgs {
    /// Pull request author, never selected
    #[arg(long)]
    pub author: String,

    /// Changed files, relative to the checkout root
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Take changed files from `git diff --name-only <BASE>` instead
    #[arg(long, conflicts_with = "files")]
    pub base: Option<String>,

    /// Checkout root holding the OWNERS files
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Override the number of reviewers to request
    #[arg(long)]
    pub count: Option<usize>,

    /// Override the reviewer cap (0 = unlimited)
    #[arg(long)]
    pub max: Option<usize>,

    /// Seed the random picks for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Never fall back to approvers
    #[arg(long)]
    pub exclude_approvers: bool,

    /// Print the selection as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    /// Print the default config as YAML instead of the schema
    #[arg(long)]
    pub defaults: bool,
}
