//! Watch command - poll the feed and cherry-pick new commits until Ctrl-C

use crate::cli::context::CommandContext;
use crate::cli::setup::prepare_working_copy;
use crate::cli::style::Stylize;
use anstream::println;
use cherry_sync::error::Result;
use cherry_sync::feed::{FeedWatcher, HttpFeedSource};
use cherry_sync::merge::MergeOrchestrator;
use cherry_sync::queue::MergeQueue;
use cherry_sync::tracking::LedgerFile;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Items buffered between the watcher and the orchestrator
const FEED_CHANNEL_CAPACITY: usize = 32;

/// Run the watch command
pub async fn run_watch(config_path: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::new(config_path).await?;
    let feed_url = ctx.config.feed_url()?;

    // A failed setup (e.g. clone) is fatal; nothing below runs without it.
    let wc = prepare_working_copy(&ctx).await?;

    let ledger = ctx
        .config
        .bot
        .state_file
        .as_ref()
        .map(LedgerFile::open)
        .transpose()?;

    let (queue, worker) = MergeQueue::start(wc);
    let mut orchestrator = MergeOrchestrator::new(
        queue,
        std::sync::Arc::clone(&ctx.tracker),
        ctx.config.orchestrator_options(),
    );
    if let Some(ledger) = ledger {
        info!(path = %ledger.path().display(), "recording processed commits");
        orchestrator = orchestrator.with_ledger(ledger);
    }

    let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
    let watcher = FeedWatcher::new(HttpFeedSource::new(&feed_url), ctx.config.watcher_options());

    println!(
        "{} {} {}",
        "Watching".emphasis(),
        feed_url.accent(),
        "(Ctrl-C to stop)".muted()
    );
    info!(feed = %feed_url, interval = ?ctx.config.watcher_options().interval, "watching feed");

    let watcher_task = tokio::spawn(watcher.run(tx));
    let orchestrator_task = tokio::spawn(orchestrator.run(rx));

    tokio::signal::ctrl_c().await?;
    info!("shutting down; waiting for queued merges");

    // Dropping the sender closes the channel, which ends the orchestrator,
    // which drops the last queue handle, which lets the worker drain and exit.
    watcher_task.abort();
    if let Err(e) = orchestrator_task.await {
        warn!(error = %e, "orchestrator task ended abnormally");
    }
    match worker.await {
        Ok(wc) => info!(path = %wc.path().display(), "merge queue drained"),
        Err(e) => warn!(error = %e, "merge queue worker ended abnormally"),
    }

    Ok(())
}
