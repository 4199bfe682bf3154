//! artcrawl CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use artcrawl::{
    error::{AppError, Result},
    models::{Config, Section},
    pipeline::{CrawlRequest, Pipeline},
    services::{FetchMode, Fetcher, HttpSource},
    storage::{IndexStore, Ledger, LocalStorage, entry_count},
};
use clap::{Parser, Subcommand};

/// artcrawl - incremental artwork catalogue crawler
#[derive(Parser, Debug)]
#[command(
    name = "artcrawl",
    version,
    about = "Crawl a paginated artwork feed and merge it into local indexes"
)]
struct Cli {
    /// Path to the TOML config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the index files (overrides paths.storage_dir)
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a page range and merge new items into the indexes
    Crawl {
        /// Feed to list
        #[arg(long, value_enum, default_value_t = Section::Community)]
        section: Section,

        /// First page to list (1-based)
        #[arg(long)]
        start: u32,

        /// Last page to list, inclusive
        #[arg(long)]
        end: u32,

        /// Items per page (default: pages.default_per_page)
        #[arg(long)]
        per_page: Option<u32>,

        /// Fetch details one at a time with a delay between requests
        #[arg(long)]
        slow: bool,

        /// Delay between sequential requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Maximum in-flight detail requests in parallel mode
        #[arg(long)]
        max_concurrent: Option<usize>,
    },

    /// Validate the configuration file
    Validate,

    /// Show index file status
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Config {
    let default_dir = Config::default().paths.storage_dir;
    let config_path = cli.config.clone().unwrap_or_else(|| {
        cli.storage_dir
            .as_deref()
            .unwrap_or(default_dir.as_path())
            .join("config.toml")
    });

    let mut config = Config::load_or_default(&config_path);
    if let Some(dir) = &cli.storage_dir {
        config.paths.storage_dir = dir.clone();
    }
    log::debug!("Configuration from {}", config_path.display());
    config
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::InvalidRange(message)) => {
            eprintln!("error: invalid page range: {message}");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli);
    let storage = LocalStorage::new(&config.paths.storage_dir);

    match cli.command {
        Command::Crawl {
            section,
            start,
            end,
            per_page,
            slow,
            delay_ms,
            max_concurrent,
        } => {
            if let Some(ms) = delay_ms {
                config.crawler.request_delay_ms = ms;
            }
            if let Some(n) = max_concurrent {
                config.crawler.max_concurrent = n;
            }
            config.validate()?;

            let request = CrawlRequest {
                section,
                start_page: start,
                end_page: end,
                per_page: per_page.unwrap_or(config.pages.default_per_page),
                mode: if slow {
                    FetchMode::Sequential
                } else {
                    FetchMode::Parallel
                },
            };
            // Reject bad ranges before building an HTTP client.
            request.range(&config.pages)?;

            let source = HttpSource::new(&config.crawler)?;
            let fetcher = Fetcher::new(source, &config.crawler);
            let mut pipeline = Pipeline::with_fetcher(fetcher, storage, &config);

            log::info!(
                "Crawling {} pages {}..={} ({:?} mode)",
                section,
                start,
                end,
                request.mode
            );
            let report = pipeline.run(&request).await?;

            let elapsed = report.end_time - report.start_time;
            log::info!(
                "Crawl complete in {}s: {} listed, {} accepted, {} skipped",
                elapsed.num_seconds(),
                report.listed,
                report.accepted,
                report.skipped
            );
            log::info!(
                "Indexes now hold {} items, {} tags, {} categories",
                report.items_total,
                report.tags_total,
                report.categories_total
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", storage.root_dir().display());

            let ledger = Ledger::new(&storage, config.paths.ledger_file.clone());
            match ledger.snapshot().await? {
                Some(seen) => log::info!("{}: {} processed items", ledger.key(), seen.len()),
                None => log::info!("{}: not found", ledger.key()),
            }

            for key in [
                &config.paths.items_file,
                &config.paths.tags_file,
                &config.paths.categories_file,
            ] {
                match storage.load(key).await? {
                    Some(document) => log::info!("{key}: {} entries", entry_count(&document)),
                    None => log::info!("{key}: not found"),
                }
            }
        }
    }

    Ok(())
}
