//! Job dispatch and pool completion tracking.

use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::types::ItemResult;

/// Push every item onto the job queue, in order, then close the queue.
///
/// Each push waits for queue capacity, so with a zero-capacity queue the
/// dispatcher is never more than one item ahead of the workers. Stops early
/// when cancelled or when every worker is gone. Returns how many items were
/// handed over.
pub(crate) async fn dispatch_jobs<I>(
    items: I,
    jobs: flume::Sender<String>,
    cancel_token: CancellationToken,
) -> usize
where
    I: IntoIterator<Item = String>,
{
    let mut dispatched = 0;

    for item in items {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                tracing::debug!(dispatched, "Dispatch cancelled");
                break;
            }
            sent = jobs.send_async(item) => {
                if sent.is_err() {
                    tracing::warn!(dispatched, "All workers exited, stopping dispatch");
                    break;
                }
                dispatched += 1;
            }
        }
    }

    // Dropping the sender closes the queue; workers exit once it is drained
    drop(jobs);
    tracing::debug!(dispatched, "Dispatch finished");
    dispatched
}

/// Spawn a task that waits for every worker to exit, then releases the last
/// result sender so the aggregator's receive loop ends.
///
/// Worker panics are logged and otherwise ignored; the remaining workers keep
/// draining the queue. Returns the number of jobs the pool took.
pub(crate) fn spawn_completion_watcher(
    mut workers: JoinSet<usize>,
    results: mpsc::Sender<ItemResult>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut handled = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(count) => handled += count,
                Err(e) => {
                    tracing::error!(error = %e, "Worker task failed");
                }
            }
        }

        drop(results);
        tracing::debug!(handled, "All workers exited, result channel closed");
        handled
    })
}
