//! Deterministic entry-point selection over an in-memory directory listing.

use crate::error::BootstrapError;

/// Conventional entry basenames, highest priority first.
pub const ENTRY_PRIORITY: &[&str] = &[
    "main",
    "run",
    "gui",
    "webui",
    "launch",
    "start",
    "install",
    "inference",
    "setup",
    "server",
    "__init__",
];

/// Script extensions considered executable, in preference order.
pub const SCRIPT_EXTENSIONS: &[&str] = &["py", "pyw"];

/// Candidate paths for an explicitly named entry, in lookup order.
pub fn explicit_candidates(entry: &str) -> [String; 3] {
    [
        entry.to_string(),
        format!("{entry}.py"),
        format!("{entry}.pyw"),
    ]
}

/// Pick an entry file from the top-level file names of a project.
///
/// Exactly one `.py` wins, then exactly one `.pyw`. Otherwise the priority
/// list is scanned against the `.py` files, then against the `.pyw` files.
pub fn select_from_listing<S: AsRef<str>>(file_names: &[S]) -> Result<String, BootstrapError> {
    let py = with_extension(file_names, "py");
    let pyw = with_extension(file_names, "pyw");

    if py.is_empty() && pyw.is_empty() {
        return Err(BootstrapError::NoScripts);
    }
    if py.len() == 1 {
        return Ok(py[0].to_string());
    }
    if pyw.len() == 1 {
        return Ok(pyw[0].to_string());
    }
    if py.len() > 1
        && let Some(found) = by_priority(&py, "py")
    {
        return Ok(found);
    }
    if pyw.len() > 1
        && let Some(found) = by_priority(&pyw, "pyw")
    {
        return Ok(found);
    }

    let mut candidates: Vec<String> = py.iter().chain(pyw.iter()).map(|s| s.to_string()).collect();
    candidates.sort();
    Err(BootstrapError::AmbiguousEntry { candidates })
}

fn with_extension<'a, S: AsRef<str>>(file_names: &'a [S], ext: &str) -> Vec<&'a str> {
    let suffix = format!(".{ext}");
    file_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| name.len() > suffix.len() && name.ends_with(&suffix))
        .collect()
}

fn by_priority(files: &[&str], ext: &str) -> Option<String> {
    ENTRY_PRIORITY
        .iter()
        .map(|base| format!("{base}.{ext}"))
        .find(|candidate| files.contains(&candidate.as_str()))
}
