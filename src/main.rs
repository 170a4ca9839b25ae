mod cli;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use post_export::{batch_filename, default_filename, save_posts};
use scrape_pipeline::{batch_requests, batch_status, run_batch, Paginator, RunOutcome, RunStatus};
use scraper_core::{AppConfig, ErrorExt, OutputFormat, RunRequest};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use tumblr_client::TumblrApiClient;

use cli::Cli;

const LOG_FILE: &str = "tumblr_scraper.log";
const LOG_TARGETS: [&str; 5] = [
    "tumblr_scraper",
    "scrape_pipeline",
    "tumblr_client",
    "scraper_core",
    "post_export",
];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    let log_guard = init_logging(&cli, &config.scrape.output_dir)?;

    if let Err(e) = config.validate() {
        e.log_error();
        bail!("{}", e.user_friendly_message());
    }

    let status = run(&cli, &config).await?;
    info!("Run finished with status: {}", status);

    // process::exit skips destructors, so flush the log file first.
    drop(log_guard);
    std::process::exit(status.exit_code());
}

fn init_logging(cli: &Cli, output_dir: &Path) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose { "debug" } else { "info" };
    let default_filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if cli.no_log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(output_dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(Some(guard))
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<RunStatus> {
    let client = TumblrApiClient::new(config.consumer_key()?, &config.api)
        .context("Failed to create Tumblr API client")?;
    let mut paginator = Paginator::from_config(client, config);
    cancel_on_interrupt(paginator.cancellation_token());

    let criteria = cli.criteria();
    let format = cli.format();
    let limit = config.scrape.limit;
    let output_dir = &config.scrape.output_dir;

    match cli.source()? {
        Some(source) => {
            let request = RunRequest::new(source, limit, criteria, format)?;
            let outcome = paginator.run(&request).await;
            let filename = cli
                .output
                .clone()
                .unwrap_or_else(|| default_filename(format, Local::now()));
            report(&outcome, format, output_dir, &filename)?;
            Ok(outcome.status)
        }
        None => {
            if config.blogs.is_empty() {
                bail!("Nothing to scrape: pass --tag or --blog, or add [[blogs]] entries to the configuration file");
            }
            if cli.output.is_some() {
                warn!("--output is ignored in batch mode, each blog gets its own file");
            }

            let requests = batch_requests(&config.blogs, &criteria, limit, format)?;
            let entries = run_batch(&mut paginator, requests).await;
            for entry in &entries {
                let filename = batch_filename(entry.request.source.name(), format);
                report(&entry.outcome, format, output_dir, &filename)?;
            }
            Ok(batch_status(&entries))
        }
    }
}

fn cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            cancel.cancel();
        }
    });
}

fn report(outcome: &RunOutcome, format: OutputFormat, output_dir: &Path, filename: &str) -> Result<()> {
    if let scrape_pipeline::StopReason::FatalError(e) = &outcome.stop_reason {
        error!("{}", e.user_friendly_message());
    }
    if outcome.skipped() > 0 {
        warn!("Skipped {} malformed records", outcome.skipped());
    }

    match save_posts(&outcome.posts, format, output_dir, filename)
        .with_context(|| format!("Failed to save results to {}", filename))?
    {
        Some(path) => println!("Saved {} posts to {}", outcome.posts.len(), path.display()),
        None => println!("No posts matched, nothing saved"),
    }
    Ok(())
}
