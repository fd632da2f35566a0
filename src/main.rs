//! `gallery-fetch` -- download a gallery into a zip archive or a directory.
//!
//! Exit status is `0` when every item was written, `2` when the run finished
//! with failed items or was interrupted, and `1` on a setup error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_fetch::{
    BaseUrlResolver, Config, Error, FixedBaseUrl, GalleryResolver, ItemListFile, Pipeline,
    PipelineSummary, Result, StaticGallery, run_with_shutdown,
};

#[derive(Debug, Parser)]
#[command(name = "gallery-fetch", version, about)]
struct Cli {
    /// Gallery identifier
    #[arg(short = 'i', long)]
    gallery_id: Option<String>,

    /// Name of the output archive or directory (defaults to the gallery id)
    #[arg(short, long)]
    name: Option<String>,

    /// Base URL items are fetched from, as `<base-url>/<gallery-id>/<item>`
    #[arg(long)]
    base_url: Option<String>,

    /// File with one item name per line
    #[arg(long, conflicts_with = "item")]
    items: Option<PathBuf>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fetch attempts per item
    #[arg(short, long)]
    retries: Option<u32>,

    /// Write items into a directory instead of a zip archive
    #[arg(long)]
    no_compress: bool,

    /// Parent directory for the output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON config file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Referer header sent with every request
    #[arg(long)]
    referer: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Item names, used when no --items file is given
    #[arg(value_name = "ITEM")]
    item: Vec<String>,
}

impl Cli {
    /// Merge the optional config file with command line overrides
    fn build_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::new(String::new(), String::new()),
        };

        if let Some(id) = &self.gallery_id {
            config.gallery_id = id.clone();
        }
        if let Some(name) = &self.name {
            config.gallery_name = Some(name.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(retries) = self.retries {
            config.max_attempts = retries;
        }
        if self.no_compress {
            config.output.compress = false;
        }
        if let Some(dir) = &self.output {
            config.output.dir = dir.clone();
        }
        if let Some(referer) = &self.referer {
            config.http.referer = Some(referer.clone());
        }

        if config.gallery_id.is_empty() {
            return Err(Error::config(
                "gallery_id",
                "a gallery id is required (--gallery-id or config file)",
            ));
        }
        Ok(config)
    }

    fn gallery_resolver(&self) -> Box<dyn GalleryResolver> {
        match &self.items {
            Some(path) => Box::new(ItemListFile::new(path)),
            None => Box::new(StaticGallery::new(self.item.iter().cloned())),
        }
    }
}

async fn run(cli: Cli) -> Result<PipelineSummary> {
    let mut config = cli.build_config()?;

    let items = cli
        .gallery_resolver()
        .resolve_gallery(&config.gallery_id)
        .await?;
    // Items are non-empty after a successful resolve
    let sample = items.first().map(String::as_str).unwrap_or_default();
    config.base_url = FixedBaseUrl(config.base_url.clone())
        .resolve_base_url(&config.gallery_id, sample)
        .await?;

    let destination = config.destination();
    tracing::info!(
        gallery_id = %config.gallery_id,
        items = items.len(),
        destination = %destination.path().display(),
        "Resolved gallery"
    );

    let pipeline = Pipeline::with_http(config)?;
    run_with_shutdown(&pipeline, items, &destination).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "gallery_fetch=debug"
    } else {
        "gallery_fetch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(summary) if summary.is_complete() => ExitCode::SUCCESS,
        Ok(summary) => {
            tracing::warn!(
                succeeded = summary.success_count(),
                failed = summary.failure_count(),
                cancelled = summary.cancelled,
                "Gallery incomplete"
            );
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!(error = %e, "Gallery download failed");
            ExitCode::FAILURE
        }
    }
}
