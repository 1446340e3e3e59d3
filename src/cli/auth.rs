//! Auth command - show which credential is used and whom it belongs to

use crate::cli::style::{Stylize, check};
use anstream::println;
use cherry_sync::auth::{get_github_auth, test_github_auth};
use cherry_sync::error::Result;

/// Run the auth command
pub async fn run_auth(host: Option<&str>) -> Result<()> {
    let auth = get_github_auth(host).await?;
    let login = test_github_auth(&auth).await?;
    println!(
        "{} Authenticated as {} {}",
        check(),
        login.accent(),
        format!("(via {})", auth.source).muted()
    );
    Ok(())
}
