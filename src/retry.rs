//! Fixed-count retry for item downloads
//!
//! Every failure is treated as transient: an item is attempted up to
//! `max_attempts` times, back to back, and the first success wins. There is no
//! delay between attempts; the transport timeout is the only time bound.
//!
//! # Example
//!
//! ```no_run
//! use gallery_fetch::config::HttpConfig;
//! use gallery_fetch::fetcher::HttpFetcher;
//! use gallery_fetch::retry::download_with_retry;
//!
//! # async fn example() -> gallery_fetch::Result<()> {
//! let fetcher = HttpFetcher::new(&HttpConfig::default())?;
//! let (events, mut progress) = tokio::sync::mpsc::unbounded_channel();
//! tokio::spawn(async move {
//!     while let Some(event) = progress.recv().await {
//!         println!("{event}");
//!     }
//! });
//!
//! let payload = download_with_retry(&fetcher, "https://img.example.com/1/a.jpg", 3, &events).await;
//! # Ok(())
//! # }
//! ```

use crate::fetcher::Fetcher;
use crate::pipeline::EventSender;
use crate::types::Event;

/// Fetch `url` with up to `max_attempts` sequential attempts.
///
/// Emits [`Event::Redownloading`] before every attempt after the first and
/// [`Event::DownloadFailed`] once all attempts are exhausted. Event delivery
/// never blocks; a closed event channel is ignored.
///
/// `max_attempts` must be at least 1; configuration validation guarantees
/// this for pipeline runs. A value of 0 performs no attempt and reports the
/// item as failed.
pub async fn download_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    max_attempts: u32,
    events: &EventSender,
) -> Option<Vec<u8>> {
    for attempt in 1..=max_attempts {
        if attempt > 1 {
            events
                .send(Event::Redownloading {
                    url: url.to_string(),
                    attempt,
                    max_attempts,
                })
                .ok();
        }

        match fetcher.fetch(url).await {
            Ok(payload) => {
                if attempt > 1 {
                    tracing::info!(url, attempts = attempt, "Download succeeded after retry");
                }
                return Some(payload);
            }
            Err(e) => {
                tracing::debug!(
                    url,
                    error = %e,
                    attempt,
                    max_attempts,
                    "Download attempt failed"
                );
            }
        }
    }

    tracing::warn!(url, max_attempts, "Download failed after all attempts exhausted");
    events
        .send(Event::DownloadFailed {
            url: url.to_string(),
        })
        .ok();
    None
}
