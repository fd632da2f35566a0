//! Worker pool: pull a job, fetch it with retry, hand the result on.

use std::sync::atomic::Ordering;

use tokio::task::JoinSet;

use crate::retry::download_with_retry;
use crate::types::{ItemResult, WorkerId};

use super::context::WorkerContext;

/// Spawn `count` workers sharing `ctx`.
///
/// The passed context is consumed so that, once every worker has exited, no
/// job receiver or result sender outlives the pool.
pub(crate) fn spawn_workers(ctx: WorkerContext, count: usize) -> JoinSet<usize> {
    let mut workers = JoinSet::new();
    for n in 0..count {
        workers.spawn(run_worker(WorkerId(n), ctx.clone()));
    }
    workers
}

/// Worker loop. Returns the number of jobs this worker took off the queue.
///
/// Exits when the queue is closed and drained, when cancellation is observed
/// while waiting for a job, or when cancellation fires while its result is
/// blocked on delivery. In the last case the result is dropped, not requeued.
pub(crate) async fn run_worker(id: WorkerId, ctx: WorkerContext) -> usize {
    let mut handled = 0;

    loop {
        let name = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => {
                tracing::debug!(worker = id.0, "Worker cancelled while waiting for a job");
                break;
            }
            job = ctx.jobs.recv_async() => match job {
                Ok(name) => name,
                // Queue closed and drained
                Err(_) => break,
            },
        };
        handled += 1;

        let url = ctx.config.item_url(&name);
        tracing::trace!(worker = id.0, item = %name, %url, "Fetching item");
        let payload = download_with_retry(
            ctx.fetcher.as_ref(),
            &url,
            ctx.config.max_attempts,
            &ctx.event_tx,
        )
        .await;

        let result = ItemResult {
            payload,
            name,
            worker: id,
        };
        let item = result.name.clone();

        // A delivery that can complete right away wins over cancellation
        tokio::select! {
            biased;
            sent = ctx.results.send(result) => {
                if sent.is_err() {
                    tracing::debug!(worker = id.0, item = %item, "Result channel closed, stopping worker");
                    break;
                }
            }
            _ = ctx.cancel_token.cancelled() => {
                ctx.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(worker = id.0, item = %item, "Cancelled before result could be delivered, dropping it");
                break;
            }
        }
    }

    tracing::debug!(worker = id.0, handled, "Worker exited");
    handled
}
