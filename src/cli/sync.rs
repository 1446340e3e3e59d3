//! Sync command - open a pull request merging the canonical repository

use crate::cli::context::CommandContext;
use crate::cli::setup::prepare_working_copy;
use crate::cli::style::{CHECK, Stylize, spinner_style};
use anstream::println;
use cherry_sync::error::{Error, Result};
use cherry_sync::sync::{SyncOutcome, run_sync as execute_sync};
use dialoguer::Confirm;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Options for the sync command
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Prompt for confirmation before merging and pushing
    pub confirm: bool,
}

/// Run the sync command
pub async fn run_sync(config_path: Option<&Path>, options: SyncOptions) -> Result<()> {
    let ctx = CommandContext::new(config_path).await?;
    let mut wc = prepare_working_copy(&ctx).await?;

    let topology = wc.topology().clone();
    let (_, source) = topology.canonical();

    if options.confirm
        && !Confirm::new()
            .with_prompt(format!(
                "Open a sync PR from {} into {}?",
                source.slug(),
                topology.origin.slug()
            ))
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
    {
        println!("{}", "Aborted".muted());
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Merging {}...", source.slug().emphasis()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let outcome = execute_sync(&mut wc, ctx.tracker.as_ref()).await;
    spinner.finish_and_clear();

    match outcome? {
        SyncOutcome::UpToDate => {
            println!("{}", format!("Already up to date with {}", source.slug()).muted());
        }
        SyncOutcome::BranchExists(branch) => {
            println!(
                "{} {} already exists on origin",
                "Skipped:".warning(),
                branch.accent()
            );
        }
        SyncOutcome::PullRequestOpened { pr, conflicts } => {
            println!(
                "{} {}",
                format!("{CHECK} Opened sync PR #{}:", pr.number).success(),
                pr.html_url.accent()
            );
            if conflicts.is_empty() {
                println!("  {}", "No conflicts".muted());
            } else {
                println!("  {} conflicted files:", conflicts.len().accent());
                for file in &conflicts {
                    println!("    {file}");
                }
            }
        }
    }

    Ok(())
}
