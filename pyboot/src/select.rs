//! Entry-point selection against the project directory.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::core::entry::{explicit_candidates, select_from_listing};
use crate::error::BootstrapError;
use crate::io::discovery::list_top_level_files;

/// Resolve the entry script, relative to `root`.
///
/// An explicit entry is tried literally, then with `.py`, then with `.pyw`.
/// A literal match may be a package directory run through its `__main__.py`.
/// Without one, the top-level listing decides.
#[instrument(skip_all, fields(root = %root.display(), explicit = ?explicit))]
pub fn select_entry(root: &Path, explicit: Option<&str>) -> Result<String> {
    if let Some(entry) = explicit {
        for candidate in explicit_candidates(entry) {
            if root.join(&candidate).exists() {
                debug!(entry = %candidate, "explicit entry resolved");
                return Ok(candidate);
            }
        }
        return Err(BootstrapError::EntryNotFound {
            entry: entry.to_string(),
        }
        .into());
    }

    let files = list_top_level_files(root)
        .with_context(|| format!("list entry candidates in {}", root.display()))?;
    let entry = select_from_listing(&files)?;
    debug!(entry = %entry, "entry auto-selected");
    Ok(entry)
}
