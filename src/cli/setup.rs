//! Setup command - prepare the working copy and exit

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, spinner_style};
use anstream::println;
use cherry_sync::error::Result;
use cherry_sync::git::WorkingCopy;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Run the setup command
pub async fn run_setup(config_path: Option<&Path>) -> Result<()> {
    let ctx = CommandContext::new(config_path).await?;
    let wc = prepare_working_copy(&ctx).await?;
    println!("{}", wc.path().display().muted());
    Ok(())
}

/// Build and set up the working copy with a spinner
pub async fn prepare_working_copy(ctx: &CommandContext) -> Result<WorkingCopy> {
    let mut wc = ctx.working_copy()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!(
        "Preparing {}...",
        wc.topology().origin.slug().emphasis()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    match wc.setup().await {
        Ok(()) => {
            spinner.finish_with_message(format!(
                "{} Working copy ready at {}",
                check(),
                wc.path().display().accent()
            ));
            Ok(wc)
        }
        Err(e) => {
            spinner.abandon();
            Err(e)
        }
    }
}
