use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ci_medic::config::AppConfig;
use ci_medic::platform::github::GitHubActionsHost;
use ci_medic::resolver::Resolver;
use ci_medic::shutdown;

#[derive(Parser)]
#[command(
    name = "ci-medic",
    about = "Detects and repairs failing GitHub Actions workflows"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Analyze failures without modifying any workflow file
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of failed runs to analyze
    #[arg(long)]
    max_runs: Option<usize>,

    /// GitHub repository owner
    #[arg(long)]
    repo_owner: Option<String>,

    /// GitHub repository name
    #[arg(long)]
    repo_name: Option<String>,

    /// GitHub token (falls back to the GITHUB_TOKEN environment variable)
    #[arg(long)]
    token: Option<String>,

    /// Root of the checked-out repository whose workflow files get patched
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Directory the resolution report is written to
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    // Command-line flags take precedence over file and environment config.
    if let Some(owner) = cli.repo_owner {
        config.github.owner = owner;
    }
    if let Some(repo) = cli.repo_name {
        config.github.repo = repo;
    }
    if let Some(token) = cli.token {
        config.github.token = token;
    }
    if config.github.token.is_empty() {
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            config.github.token = token;
        }
    }
    if let Some(max_runs) = cli.max_runs {
        config.resolver.max_runs = max_runs;
    }
    if let Some(workspace) = cli.workspace {
        config.resolver.workspace_dir = workspace;
    }
    if let Some(report_dir) = cli.report_dir {
        config.resolver.report_dir = report_dir;
    }

    let repository = config.repository();
    tracing::info!(
        repository = %repository,
        dry_run = cli.dry_run,
        max_runs = config.resolver.max_runs,
        "Starting ci-medic"
    );

    let host = Arc::new(GitHubActionsHost::new(&config.github, &config.fetch)?);
    let resolver = Resolver::new(
        host,
        &repository,
        config.resolver.workspace_dir.clone(),
        config.resolver.max_runs,
        cli.dry_run,
    );

    let cancelled = shutdown::cancellation_flag();
    let report = resolver
        .run_cycle(|| {
            let cancelled = Arc::clone(&cancelled);
            async move { cancelled.load(Ordering::SeqCst) }
        })
        .await?;

    // The report is the sole audit trail: persistence failure is fatal.
    let (json_path, md_path) = report.persist(&config.resolver.report_dir)?;
    tracing::info!(
        entries = report.entries.len(),
        json = %json_path.display(),
        markdown = %md_path.display(),
        "Resolution report written"
    );

    println!("{}", report.to_markdown());

    Ok(())
}
