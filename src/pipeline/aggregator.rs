//! Aggregator, the single consumer that writes results into the sink.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SinkError;
use crate::sink::Sink;
use crate::types::{Event, ItemResult};

use super::EventSender;

/// Parameters for the aggregation loop
pub(crate) struct AggregatorParams {
    /// Results from the worker pool
    pub(crate) results: mpsc::Receiver<ItemResult>,
    /// Destination, owned exclusively by the aggregator
    pub(crate) sink: Box<dyn Sink>,
    /// Number of items handed to the pipeline
    pub(crate) expected: usize,
    /// Progress events
    pub(crate) event_tx: EventSender,
    /// Cancelled once `expected` results have been processed
    pub(crate) cancel_token: CancellationToken,
}

/// Counts collected by the aggregation loop plus the sink's finalization outcome.
#[derive(Debug)]
pub(crate) struct AggregateOutcome {
    pub(crate) processed: usize,
    pub(crate) fetched: usize,
    pub(crate) fetch_failed: usize,
    pub(crate) write_failed: usize,
    pub(crate) finish: Result<(), SinkError>,
}

/// Consume results in arrival order until the result channel closes, then
/// finalize the sink.
///
/// Write failures are reported and counted but never stop the loop. Reaching
/// the expected count cancels the run so idle workers exit without waiting
/// for the queue to close.
pub(crate) async fn aggregate(params: AggregatorParams) -> AggregateOutcome {
    let AggregatorParams {
        mut results,
        mut sink,
        expected,
        event_tx,
        cancel_token,
    } = params;

    let mut processed = 0;
    let mut fetched = 0;
    let mut fetch_failed = 0;
    let mut write_failed = 0;

    while let Some(result) = results.recv().await {
        processed += 1;

        match result.payload {
            Some(payload) => {
                fetched += 1;
                match sink.write_entry(&result.name, &payload).await {
                    Ok(()) => {
                        event_tx
                            .send(Event::Downloaded {
                                worker: result.worker,
                                name: result.name,
                            })
                            .ok();
                    }
                    Err(e) => {
                        write_failed += 1;
                        tracing::warn!(item = %result.name, error = %e, "Failed to write item");
                        event_tx
                            .send(Event::WriteFailed {
                                name: result.name,
                                error: e.to_string(),
                            })
                            .ok();
                    }
                }
            }
            None => {
                fetch_failed += 1;
                tracing::debug!(item = %result.name, worker = result.worker.0, "Item has no payload, skipping write");
            }
        }

        if processed == expected {
            tracing::debug!(processed, "All expected results received, cancelling workers");
            cancel_token.cancel();
        }
    }

    if processed < expected {
        tracing::warn!(processed, expected, "Result channel closed before every item was processed");
    }

    let finish = sink.finish().await;
    if let Err(e) = &finish {
        tracing::error!(error = %e, "Failed to finalize destination");
    }

    AggregateOutcome {
        processed,
        fetched,
        fetch_failed,
        write_failed,
        finish,
    }
}
