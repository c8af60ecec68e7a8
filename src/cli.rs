use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("SETUP_FARGATE_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("SETUP_FARGATE_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("SETUP_FARGATE_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup for clap's 'static requirement
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "setup-fargate")]
#[command(about = "Download, cache and expose the AWS Fargate CLI")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Raw OS token to provision for (darwin, linux, win32). Defaults to the host
    #[arg(long, global = true)]
    pub os: Option<String>,

    /// Raw architecture token (arm64, arm, x32, x64). Defaults to the host
    #[arg(long, global = true)]
    pub arch: Option<String>,

    /// Tool cache root directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the Fargate CLI and add it to the runner PATH (default)
    Install {
        /// Release tag to install, e.g. 'v0.3.2'. Falls back to the 'cli-version' action input
        #[arg(long)]
        cli_version: Option<String>,

        /// Resolve and print the download URL without fetching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the download URL for a release on the target platform
    Url {
        /// Release tag, e.g. 'v0.3.2'
        cli_version: String,
    },

    /// List cached Fargate CLI versions
    List,

    /// Show the effective settings as JSON
    Config,

    /// Show the current version
    Version,
}
