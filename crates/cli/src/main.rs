//! # nav-async
//!
//! Moves the navigation menu of a generated documentation site into a
//! single fragment file that every page loads after `DOMContentLoaded`.
//!
//! ```bash
//! # Whole site after the generator finished
//! nav-async build ./site --base-path /en
//!
//! # One page at a time, from a per-page build hook
//! nav-async page ./site/guide/index.html --site-dir ./site --base-path /en
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the level); the summary, or
//! the JSON result with `--json`, goes to stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use navasync::{
    BatchEvent, BatchOrchestrator, BatchResult, NavAsyncConfig, PageProcessor, RewriteOutcome,
};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nav-async",
    version,
    about = "Load a static site's navigation asynchronously from one shared fragment"
)]
struct Cli {
    /// Configuration file (TOML). Command line flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite every page under a finished site directory.
    ///
    /// The first page in path order provides the navigation fragment.
    Build {
        /// Site output directory
        site_dir: PathBuf,

        #[command(flatten)]
        site: SiteArgs,

        /// Number of rewrite workers
        #[arg(long)]
        workers: Option<usize>,

        /// Print the batch result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a single page in place.
    ///
    /// The fragment is taken from this page if the site has none yet.
    Page {
        /// Page file to rewrite
        file: PathBuf,

        /// Site output directory the fragment and spinner go to
        #[arg(long)]
        site_dir: PathBuf,

        #[command(flatten)]
        site: SiteArgs,
    },
}

/// Flags shared by both commands
#[derive(Args)]
struct SiteArgs {
    /// URL prefix the site is served under, e.g. `/en`
    #[arg(long)]
    base_path: Option<String>,

    /// Tag name of the navigation container
    #[arg(long)]
    nav_tag: Option<String>,

    /// Exact class attribute value of the navigation container
    #[arg(long)]
    nav_class: Option<String>,

    /// Spinner image to install instead of the bundled one
    #[arg(long)]
    spinner: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            site_dir,
            site,
            workers,
            json,
        } => {
            let mut config = load_config(cli.config.as_deref(), site_dir, &site)?;
            if let Some(workers) = workers {
                config.workers = workers;
            }
            let result = run_build(config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_summary(&result);
            }
        }
        Commands::Page {
            file,
            site_dir,
            site,
        } => {
            let config = load_config(cli.config.as_deref(), site_dir, &site)?;
            let processor = PageProcessor::new(config)?;
            let page = processor
                .process_file(&file)
                .with_context(|| format!("failed to rewrite {}", file.display()))?;
            match page.outcome {
                RewriteOutcome::Rewritten => println!("Rewrote {}", file.display()),
                RewriteOutcome::Skipped(reason) => {
                    println!("Skipped {} ({:?})", file.display(), reason)
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or defaults) with command line overrides applied
fn load_config(path: Option<&Path>, site_dir: PathBuf, site: &SiteArgs) -> Result<NavAsyncConfig> {
    let mut config = match path {
        Some(path) => NavAsyncConfig::load(path)?,
        None => NavAsyncConfig::default(),
    };

    config.site_dir = site_dir;
    if let Some(base_path) = &site.base_path {
        config.base_path = base_path.clone();
    }
    if let Some(tag) = &site.nav_tag {
        config.nav_tag = tag.clone();
    }
    if let Some(class) = &site.nav_class {
        config.nav_attr = "class".to_string();
        config.nav_value = class.clone();
    }
    if let Some(spinner) = &site.spinner {
        config.spinner_source = Some(spinner.clone());
    }
    Ok(config)
}

async fn run_build(config: NavAsyncConfig) -> Result<BatchResult> {
    let site_dir = config.site_dir.clone();
    let orchestrator = BatchOrchestrator::new(config);
    let reporter = spawn_progress_reporter(&orchestrator);

    let result = orchestrator.run().await;
    // Closing the bus ends the reporter
    drop(orchestrator);
    if let Err(e) = reporter.await {
        tracing::warn!("Progress reporter stopped: {}", e);
    }

    result.with_context(|| format!("failed to build {}", site_dir.display()))
}

/// Log progress roughly every tenth of the batch
fn spawn_progress_reporter(orchestrator: &BatchOrchestrator) -> JoinHandle<()> {
    let mut rx = orchestrator.event_bus.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(BatchEvent::PageFinished {
                    completed, total, ..
                }) => {
                    let step = (total / 10).max(1);
                    if completed % step == 0 || completed == total {
                        tracing::info!("Progress: {}/{}", completed, total);
                    }
                }
                Ok(BatchEvent::Finished { .. }) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!("Progress reporter missed {} events", missed);
                }
            }
        }
    })
}

fn print_summary(result: &BatchResult) {
    println!(
        "{} pages: {} rewritten, {} skipped, {} failed in {:.2}s",
        result.total,
        result.processed,
        result.skipped,
        result.failed,
        result.elapsed.as_secs_f64()
    );
    if let Some(fragment) = &result.fragment_path {
        println!("Navigation fragment: {}", fragment.display());
    }
    for failure in &result.failures {
        println!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_args() -> SiteArgs {
        SiteArgs {
            base_path: None,
            nav_tag: None,
            nav_class: None,
            spinner: None,
        }
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from([
            "nav-async", "build", "site", "--base-path", "/en", "--workers", "2", "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                site_dir,
                site,
                workers,
                json,
            } => {
                assert_eq!(site_dir, PathBuf::from("site"));
                assert_eq!(site.base_path.as_deref(), Some("/en"));
                assert_eq!(workers, Some(2));
                assert!(json);
            }
            Commands::Page { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn test_page_requires_site_dir() {
        assert!(Cli::try_parse_from(["nav-async", "page", "index.html"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nav-async.toml");
        std::fs::write(&path, "base_path = \"/from-file\"\nnav_tag = \"ol\"\nworkers = 3\n").unwrap();

        let mut site = site_args();
        site.nav_class = Some("menu".to_string());
        let config = load_config(Some(&path), PathBuf::from("out"), &site).unwrap();

        assert_eq!(config.site_dir, PathBuf::from("out"));
        assert_eq!(config.base_path, "/from-file");
        assert_eq!(config.nav_tag, "ol");
        assert_eq!(config.nav_value, "menu");
        assert_eq!(config.workers, 3);
    }
}
