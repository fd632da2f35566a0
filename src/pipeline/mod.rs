//! Bounded concurrent fetch-and-aggregate pipeline.
//!
//! Split into focused submodules:
//! - [`context`] - State shared by the workers of one run
//! - [`dispatcher`] - Feeds the job queue, tracks worker pool completion
//! - [`worker`] - Fetch-with-retry loop per worker
//! - [`aggregator`] - Single consumer writing results into the sink
//! - [`progress`] - Event channel consumer
//!
//! Data flow for one run:
//!
//! ```text
//! items -> dispatcher -> job queue -> N workers -> result channel -> aggregator -> sink
//!                                         \                              /
//!                                          `----> event channel <-------'
//!                                                      |
//!                                               progress reporter -> log + subscribers
//! ```

mod aggregator;
mod context;
mod dispatcher;
mod progress;
mod worker;


use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::sink::Destination;
use crate::types::{Event, PipelineSummary};

use aggregator::{AggregatorParams, aggregate};
use context::{RESULT_CHANNEL_BUFFER, WorkerContext};

/// Sending half of the progress event channel
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Capacity of the broadcast channel handed out by [`Pipeline::subscribe`]
const SUBSCRIBER_BUFFER: usize = 1024;

/// Gallery downloader pipeline
///
/// Holds the validated configuration and fetcher; every call to
/// [`Pipeline::run`] builds a fresh job queue, result channel and worker pool
/// and tears all of them down before returning.
pub struct Pipeline {
    config: Arc<Config>,
    fetcher: Arc<dyn Fetcher>,
    cancel_token: CancellationToken,
    subscribers: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline around an existing fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;
        let (subscribers, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            cancel_token: CancellationToken::new(),
            subscribers,
        })
    }

    /// Create a pipeline that fetches over HTTP using `config.http`.
    pub fn with_http(config: Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Self::new(config, Arc::new(fetcher))
    }

    /// Run configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribe to progress events of subsequent runs
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.subscribers.subscribe()
    }

    /// Token that stops the current run when cancelled.
    ///
    /// Cancelling is idempotent. A cancelled pipeline stops every later run
    /// immediately as well.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Fetch `items` and write them to `destination`.
    ///
    /// The destination is opened before anything is dispatched; failing to
    /// create it aborts the run. Per-item fetch and write failures are counted
    /// in the returned summary and never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the destination cannot be created or
    /// finalized, and [`Error::Task`] if a pipeline task panicked.
    pub async fn run(
        &self,
        items: Vec<String>,
        destination: &Destination,
    ) -> Result<PipelineSummary> {
        let total = items.len();
        let workers = self.config.workers;
        let sink = destination.open().await?;

        tracing::info!(
            gallery_id = %self.config.gallery_id,
            destination = ?destination.path(),
            total,
            workers,
            "Starting gallery pipeline"
        );

        // Child of the pipeline token: completion cancels only this run
        let run_token = self.cancel_token.child_token();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let reporter = progress::spawn_progress_reporter(event_rx, self.subscribers.clone());
        event_tx
            .send(Event::Started {
                gallery_id: self.config.gallery_id.clone(),
                total,
                workers,
            })
            .ok();

        let (job_tx, job_rx) = flume::bounded(self.config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(RESULT_CHANNEL_BUFFER);
        let dropped = Arc::new(AtomicUsize::new(0));

        let pool = worker::spawn_workers(
            WorkerContext {
                config: Arc::clone(&self.config),
                fetcher: Arc::clone(&self.fetcher),
                jobs: job_rx,
                results: result_tx.clone(),
                event_tx: event_tx.clone(),
                cancel_token: run_token.clone(),
                dropped: Arc::clone(&dropped),
            },
            workers,
        );
        let watcher = dispatcher::spawn_completion_watcher(pool, result_tx);
        let dispatch = tokio::spawn(dispatcher::dispatch_jobs(
            items,
            job_tx,
            run_token.clone(),
        ));

        let outcome = aggregate(AggregatorParams {
            results: result_rx,
            sink,
            expected: total,
            event_tx: event_tx.clone(),
            cancel_token: run_token.clone(),
        })
        .await;

        // The result channel only closes after the watcher joined every
        // worker, so these joins do not wait on any more network I/O
        let dispatched = dispatch.await?;
        let handled = watcher.await?;
        run_token.cancel();

        let summary = PipelineSummary {
            dispatched,
            processed: outcome.processed,
            fetched: outcome.fetched,
            fetch_failed: outcome.fetch_failed,
            write_failed: outcome.write_failed,
            dropped: dropped.load(Ordering::Relaxed),
            cancelled: outcome.processed < total,
        };

        event_tx
            .send(Event::Finished {
                succeeded: summary.success_count(),
                failed: summary.failure_count(),
            })
            .ok();
        drop(event_tx);
        let reported = reporter.await?;

        tracing::info!(
            dispatched,
            handled,
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            dropped = summary.dropped,
            cancelled = summary.cancelled,
            reported,
            "Gallery pipeline finished"
        );

        outcome.finish.map_err(Error::Sink)?;
        Ok(summary)
    }
}

/// Fetch `items` over HTTP with the settings in `config` and write them to
/// `destination`.
///
/// Convenience wrapper around [`Pipeline::with_http`] and [`Pipeline::run`].
pub async fn run_pipeline(
    config: Config,
    items: Vec<String>,
    destination: &Destination,
) -> Result<PipelineSummary> {
    Pipeline::with_http(config)?.run(items, destination).await
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}
