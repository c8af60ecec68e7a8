mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TargetArgs};
use setup_fargate::actions::{ActionsContext, VERSION_INPUT};
use setup_fargate::config::{load_settings, Settings};
use setup_fargate::platform::host_platform;
use setup_fargate::provision::resolve_artifact;
use setup_fargate::{
    CompatibilityMatrix, DirectoryCache, HttpFetcher, PlatformDescriptor, ToolCache,
    ToolProvisioner, VersionTag, TOOL_NAME,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(&cli);

    let actions = ActionsContext::from_env();

    if let Err(e) = run(cli, &actions).await {
        actions.set_failed(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, actions: &ActionsContext) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Install {
        cli_version: None,
        dry_run: false,
    });

    match command {
        Commands::Version => {
            println!("setup-fargate v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Config => {
            let settings = effective_settings(&cli.target)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }

        Commands::List => {
            let settings = effective_settings(&cli.target)?;
            let cache = DirectoryCache::new(&settings.cache_dir)?;
            let versions = cache.versions(TOOL_NAME);
            if versions.is_empty() {
                println!("No cached Fargate CLI versions in {}", cache.root().display());
            }
            for version in versions {
                println!("{}", version);
            }
        }

        Commands::Url { cli_version } => {
            let version = VersionTag::parse(&cli_version)?;
            let platform = target_platform(&cli.target);
            let artifact =
                resolve_artifact(&platform, &CompatibilityMatrix::published(), &version)?;
            println!("{}", artifact.url);
        }

        Commands::Install {
            cli_version,
            dry_run,
        } => {
            let raw_version = cli_version
                .or_else(|| actions.input(VERSION_INPUT))
                .unwrap_or_default();
            let version = VersionTag::parse(&raw_version)?;
            let platform = target_platform(&cli.target);

            if dry_run {
                let artifact =
                    resolve_artifact(&platform, &CompatibilityMatrix::published(), &version)?;
                tracing::info!("Would download Fargate CLI from {}", artifact.url);
                println!("{}", artifact.url);
                return Ok(());
            }

            let settings = effective_settings(&cli.target)?;
            let cache = DirectoryCache::new(&settings.cache_dir).with_context(|| {
                format!("Invalid cache directory {}", settings.cache_dir.display())
            })?;
            let fetcher =
                HttpFetcher::new(settings.progress).context("Could not create HTTP client")?;
            let provisioner = ToolProvisioner::new(platform, cache, fetcher, settings.temp_dir);

            let path = provisioner.provision(TOOL_NAME, &version).await?;
            actions.add_path(&path)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn target_platform(target: &TargetArgs) -> PlatformDescriptor {
    let host = host_platform();
    PlatformDescriptor::new(
        target.os.clone().unwrap_or(host.raw_os),
        target.arch.clone().unwrap_or(host.raw_arch),
    )
}

fn effective_settings(target: &TargetArgs) -> Result<Settings> {
    let mut settings = load_settings()?;
    if let Some(dir) = &target.cache_dir {
        settings.cache_dir = dir.clone();
    }
    Ok(settings)
}

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "info"
    } else if cli.verbose == 1 {
        "debug"
    } else {
        "trace"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
