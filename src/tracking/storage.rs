//! Persistence for the processed-commit ledger.

use super::{ProcessedCommit, ProcessedLedger, TRACKING_VERSION};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the ledger from `path`.
///
/// Returns an empty ledger if the file doesn't exist.
pub fn load_ledger(path: &Path) -> Result<ProcessedLedger> {
    if !path.exists() {
        return Ok(ProcessedLedger::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Tracking(format!("failed to read {}: {e}", path.display())))?;

    let ledger: ProcessedLedger = toml::from_str(&content)
        .map_err(|e| Error::Tracking(format!("failed to parse {}: {e}", path.display())))?;

    if ledger.version > TRACKING_VERSION {
        return Err(Error::Tracking(format!(
            "{} was written by a newer version (format {})",
            path.display(),
            ledger.version
        )));
    }

    Ok(ledger)
}

/// Save the ledger to `path`.
///
/// Creates the parent directory if it doesn't exist.
pub fn save_ledger(path: &Path, ledger: &ProcessedLedger) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty())
        && !dir.exists()
    {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Tracking(format!("failed to create {}: {e}", dir.display())))?;
    }

    let mut to_save = ledger.clone();
    to_save.version = TRACKING_VERSION;

    let content = toml::to_string_pretty(&to_save)
        .map_err(|e| Error::Tracking(format!("failed to serialize ledger: {e}")))?;

    let content_with_header = format!(
        "# cherry-sync processed commits\n# Auto-generated - manual edits may be overwritten\n\n{content}"
    );

    fs::write(path, content_with_header)
        .map_err(|e| Error::Tracking(format!("failed to write {}: {e}", path.display())))?;

    Ok(())
}

/// A ledger bound to the file it is persisted in
#[derive(Debug)]
pub struct LedgerFile {
    path: PathBuf,
    ledger: ProcessedLedger,
}

impl LedgerFile {
    /// Load (or start) the ledger stored at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ledger = load_ledger(&path)?;
        Ok(Self { path, ledger })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory view
    pub const fn ledger(&self) -> &ProcessedLedger {
        &self.ledger
    }

    /// Whether a commit has a recorded outcome
    pub fn contains(&self, short_hash: &str) -> bool {
        self.ledger.contains(short_hash)
    }

    /// Record an outcome and write the file
    pub fn record(&mut self, entry: ProcessedCommit) -> Result<()> {
        self.ledger.record(entry);
        save_ledger(&self.path, &self.ledger)
    }
}
