//! Progress reporter draining the event channel off the hot path.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::types::Event;

/// Spawn the single consumer of the event channel.
///
/// Every event is logged and forwarded to broadcast subscribers. Producers use
/// an unbounded channel, so a slow reporter never stalls a download. The task
/// ends once every sender has been dropped.
pub(crate) fn spawn_progress_reporter(
    mut events: mpsc::UnboundedReceiver<Event>,
    subscribers: broadcast::Sender<Event>,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut reported = 0;
        while let Some(event) = events.recv().await {
            reported += 1;
            match &event {
                Event::DownloadFailed { .. } | Event::WriteFailed { .. } => {
                    tracing::warn!("{event}");
                }
                _ => {
                    tracing::info!("{event}");
                }
            }
            // No subscribers is fine
            subscribers.send(event).ok();
        }
        reported
    })
}
