//! Core types and events for gallery-fetch

use serde::{Deserialize, Serialize};

/// Identifier of a pipeline worker, attached to results for diagnostics only
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(pub usize);

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of one job, produced by exactly one worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemResult {
    /// Fetched bytes, or `None` once every attempt failed
    pub payload: Option<Vec<u8>>,
    /// Item name, also used as the entry name in the destination
    pub name: String,
    /// Worker that produced this result
    pub worker: WorkerId,
}

impl ItemResult {
    /// Whether the item was fetched successfully
    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }
}

/// Progress events emitted while a gallery is being fetched
///
/// Events are fire-and-forget. The `Display` form is the human-readable
/// progress line; structured fields are kept for subscribers that want them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Pipeline started
    Started {
        /// Gallery identifier
        gallery_id: String,
        /// Number of items about to be dispatched
        total: usize,
        /// Worker count
        workers: usize,
    },

    /// An attempt after the first is about to start
    Redownloading {
        /// Item URL
        url: String,
        /// 1-based attempt number
        attempt: u32,
        /// Attempt limit
        max_attempts: u32,
    },

    /// Every attempt for an item failed
    DownloadFailed {
        /// Item URL
        url: String,
    },

    /// An item was written to the destination
    Downloaded {
        /// Worker that fetched the item
        worker: WorkerId,
        /// Entry name
        name: String,
    },

    /// A fetched item could not be written
    WriteFailed {
        /// Entry name
        name: String,
        /// Error message
        error: String,
    },

    /// Pipeline finished and the destination was finalized
    Finished {
        /// Items written successfully
        succeeded: usize,
        /// Items that failed to fetch or write
        failed: usize,
    },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Started {
                gallery_id,
                total,
                workers,
            } => write!(
                f,
                "Fetching {total} items of gallery {gallery_id} with {workers} workers"
            ),
            Event::Redownloading {
                url,
                attempt,
                max_attempts,
            } => write!(f, "Redownloading {url}: #{attempt}/{max_attempts}"),
            Event::DownloadFailed { url } => write!(f, "Download Failed: {url}"),
            Event::Downloaded { worker, name } => write!(f, "[worker {worker}] downloaded {name}"),
            Event::WriteFailed { name, error } => write!(f, "Write Failed: {name}: {error}"),
            Event::Finished { succeeded, failed } => {
                write!(f, "Finished: {succeeded} succeeded, {failed} failed")
            }
        }
    }
}

/// Counts reported by a finished pipeline run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Items handed to the job queue
    pub dispatched: usize,
    /// Results received by the aggregator
    pub processed: usize,
    /// Results that carried a payload
    pub fetched: usize,
    /// Results without a payload (every attempt failed)
    pub fetch_failed: usize,
    /// Payloads that could not be written to the destination
    pub write_failed: usize,
    /// Results abandoned by workers after cancellation
    pub dropped: usize,
    /// Whether the run was cancelled before every item was processed
    pub cancelled: bool,
}

impl PipelineSummary {
    /// Items that ended up in the destination
    pub fn success_count(&self) -> usize {
        self.fetched - self.write_failed
    }

    /// Items that were processed but are missing from the destination
    pub fn failure_count(&self) -> usize {
        self.fetch_failed + self.write_failed
    }

    /// True only when every dispatched item is in the destination
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.dropped == 0 && self.failure_count() == 0
    }
}
