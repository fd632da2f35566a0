//! State shared by every worker of one pipeline run.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::types::ItemResult;

use super::EventSender;

/// Buffer size for the result channel between workers and the aggregator
pub(crate) const RESULT_CHANNEL_BUFFER: usize = 1;

/// Handles a worker needs; cloned once per worker.
///
/// The job receiver and result sender are the only shared mutable resources.
/// Dropping every clone closes the job queue from the consumer side and the
/// result channel from the producer side.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    /// Run configuration (URL template, attempt limit)
    pub(crate) config: Arc<Config>,
    /// Item fetcher
    pub(crate) fetcher: Arc<dyn Fetcher>,
    /// Shared job queue, exclusive delivery per job
    pub(crate) jobs: flume::Receiver<String>,
    /// Results for the aggregator
    pub(crate) results: mpsc::Sender<ItemResult>,
    /// Progress events
    pub(crate) event_tx: EventSender,
    /// Run-wide cancellation
    pub(crate) cancel_token: CancellationToken,
    /// Results abandoned because cancellation won the race against delivery
    pub(crate) dropped: Arc<AtomicUsize>,
}
