//! Polling loop over a [`FeedSource`]

use crate::error::Result;
use crate::feed::FeedSource;
use crate::types::FeedItem;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Polling behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherOptions {
    /// Time between the start of two polls
    pub interval: Duration,
    /// Treat everything in the first successful poll as already seen
    pub skip_initial: bool,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            skip_initial: false,
        }
    }
}

/// Emits each feed item once per process lifetime
///
/// Items are identified by their link. The seen set lives in memory only;
/// after a restart the repository-state guards in the orchestrator decide
/// whether an item still needs work.
pub struct FeedWatcher<S> {
    source: S,
    options: WatcherOptions,
    seen: HashSet<String>,
    primed: bool,
}

impl<S: FeedSource> FeedWatcher<S> {
    /// Create a watcher over `source`
    pub fn new(source: S, options: WatcherOptions) -> Self {
        Self {
            source,
            options,
            seen: HashSet::new(),
            primed: false,
        }
    }

    /// Number of distinct items seen so far
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Run one poll cycle and return the items not seen before, oldest first
    pub async fn poll(&mut self) -> Result<Vec<FeedItem>> {
        let items = self.source.fetch().await?;

        if !self.primed {
            self.primed = true;
            if self.options.skip_initial {
                self.seen.extend(items.into_iter().map(|item| item.link));
                info!(seen = self.seen.len(), "skipping items present at startup");
                return Ok(Vec::new());
            }
        }

        let fresh: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| self.seen.insert(item.link.clone()))
            .collect();
        debug!(new = fresh.len(), seen = self.seen.len(), "polled feed");
        Ok(oldest_first(fresh))
    }

    /// Poll forever, sending new items into `tx`.
    ///
    /// Polls never overlap: the next tick is only awaited once the current
    /// cycle has handed every item to the channel. A failed poll is logged
    /// and retried on the next tick. Returns when the receiving side closes.
    pub async fn run(mut self, tx: mpsc::Sender<FeedItem>) {
        let mut ticker = tokio::time::interval(self.options.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = tx.closed() => break,
            }

            let items = match self.poll().await {
                Ok(items) => items,
                Err(e) => {
                    warn!(error = %e, "feed poll failed; retrying next cycle");
                    continue;
                }
            };

            for item in items {
                info!(title = %item.title, "new commit on watched repository");
                if tx.send(item).await.is_err() {
                    debug!("feed consumer went away");
                    return;
                }
            }
        }
        debug!("feed watcher stopped");
    }
}

// Feeds list newest first. Sort by timestamp when every item carries one,
// otherwise fall back to reversed document order.
fn oldest_first(mut items: Vec<FeedItem>) -> Vec<FeedItem> {
    if items.iter().all(|item| item.published_at.is_some()) {
        items.sort_by_key(|item| item.published_at);
    } else {
        items.reverse();
    }
    items
}
