//! Read-only filesystem discovery over the project tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub const README_FILE: &str = "README.md";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
/// Environment definition files, in the order they are tried.
pub const ENVIRONMENT_FILES: &[&str] = &["environment.yml", "environment.yaml"];
/// Extensions scanned for imports.
pub const SOURCE_EXTENSIONS: &[&str] = &["py", "pyw", "ipynb"];

const SKIPPED_DIRS: &[&str] = &["__pycache__", "node_modules", "site-packages"];

/// Sorted names of the regular files directly inside `dir`.
pub fn list_top_level_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = fs::read_dir(dir).with_context(|| format!("list {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Read `path` if it exists.
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Basename of the project directory, resolving `.` and symlinks.
pub fn project_name(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every script or notebook under `root`, sorted, skipping hidden directories,
/// caches and the isolated environment prefix.
pub fn source_files(root: &Path, env_dir: &str) -> Result<Vec<PathBuf>> {
    let env_path = root.join(env_dir);
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, &env_path));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(err = %err, "skipping unreadable path");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
        if is_source {
            files.push(entry.into_path());
        }
    }
    debug!(count = files.len(), "discovered source files");
    Ok(files)
}

fn is_skipped_dir(entry: &DirEntry, env_path: &Path) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&&*name) || entry.path() == env_path
}

/// Python source text of `path`; notebooks contribute their code cells.
pub fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    if path.extension().is_some_and(|ext| ext == "ipynb") {
        return notebook_code(&text).with_context(|| format!("parse notebook {}", path.display()));
    }
    Ok(text.into_owned())
}

#[derive(Deserialize)]
struct Notebook {
    #[serde(default)]
    cells: Vec<NotebookCell>,
}

#[derive(Deserialize)]
struct NotebookCell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CellSource {
    Lines(Vec<String>),
    Text(String),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

/// Concatenated source of every code cell in a notebook document.
pub fn notebook_code(contents: &str) -> Result<String> {
    let notebook: Notebook = serde_json::from_str(contents).context("parse notebook json")?;
    let mut code = String::new();
    for cell in notebook.cells.iter().filter(|c| c.cell_type == "code") {
        match &cell.source {
            CellSource::Lines(lines) => lines.iter().for_each(|line| code.push_str(line)),
            CellSource::Text(text) => code.push_str(text),
        }
        if !code.ends_with('\n') {
            code.push('\n');
        }
    }
    Ok(code)
}

/// True if `module` resolves to a file or package inside the project root.
pub fn is_local_module(root: &Path, module: &str) -> bool {
    root.join(format!("{module}.py")).is_file() || root.join(module).is_dir()
}
