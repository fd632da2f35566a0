//! # gallery-fetch
//!
//! Concurrent gallery image downloader. Given a gallery id, a base URL and an
//! ordered list of item names, a bounded pool of workers fetches every item
//! with retries and a single aggregator writes the results into a zip archive
//! or a plain directory.
//!
//! ## Design
//!
//! - **Bounded** - a fixed worker pool and a rendezvous job queue keep the
//!   dispatcher at most one item ahead of the workers
//! - **Failure-tolerant** - a failed item or entry never aborts the run, it is
//!   reported and counted
//! - **Cancellable** - one [`CancellationToken`](tokio_util::sync::CancellationToken)
//!   stops dispatch and every idle worker
//! - **Event-driven** - progress is published as [`Event`]s to subscribers
//!
//! ## Quick Start
//!
//! ```no_run
//! use gallery_fetch::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         workers: 4,
//!         ..Config::new("1234", "https://img.example.com/galleries")
//!     };
//!     let destination = config.destination();
//!     let pipeline = Pipeline::with_http(config)?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{event}");
//!         }
//!     });
//!
//!     let items = vec!["001.jpg".to_string(), "002.jpg".to_string()];
//!     let summary = pipeline.run(items, &destination).await?;
//!     println!(
//!         "{} succeeded, {} failed",
//!         summary.success_count(),
//!         summary.failure_count()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Item fetching over HTTP
pub mod fetcher;
/// Worker pool, dispatcher and aggregator
pub mod pipeline;
/// Gallery item list and base URL resolution
pub mod resolve;
/// Bounded retry around a fetcher
pub mod retry;
/// Archive and directory output
pub mod sink;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, HttpConfig, OutputConfig};
pub use error::{Error, FetchError, Result, SinkError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use pipeline::{EventSender, Pipeline, run_pipeline};
pub use resolve::{BaseUrlResolver, FixedBaseUrl, GalleryResolver, ItemListFile, StaticGallery};
pub use sink::{Destination, Sink};
pub use types::{Event, ItemResult, PipelineSummary, WorkerId};

/// Run `pipeline` and cancel it on a termination signal.
///
/// Items already fetched when the signal arrives are still written and the
/// destination is finalized before this returns.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use gallery_fetch::{Config, Pipeline, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::new("1234", "https://img.example.com/galleries");
///     let destination = config.destination();
///     let pipeline = Pipeline::with_http(config)?;
///
///     let items = vec!["001.jpg".to_string()];
///     let summary = run_with_shutdown(&pipeline, items, &destination).await?;
///     println!("complete: {}", summary.is_complete());
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    pipeline: &Pipeline,
    items: Vec<String>,
    destination: &Destination,
) -> Result<PipelineSummary> {
    let cancel_token = pipeline.cancel_token();
    let run = pipeline.run(items, destination);
    tokio::pin!(run);

    tokio::select! {
        summary = &mut run => summary,
        _ = wait_for_signal() => {
            tracing::info!("Shutdown requested, cancelling pipeline");
            cancel_token.cancel();
            run.await
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C signal"),
    }
}
