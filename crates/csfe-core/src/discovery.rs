//! Source tree discovery
//!
//! Python modules are collected under a root in sorted order. Hidden
//! directories, `__pycache__`, virtual environments and `node_modules` are
//! never entered.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::RunError;
use crate::settings::Settings;

/// Directory names that are never entered
const IGNORED_DIRS: [&str; 4] = ["__pycache__", "venv", ".venv", "node_modules"];

/// History file name used when nothing else is configured
pub const DEFAULT_HISTORY_FILE: &str = "csfe.yaml";

fn is_ignored(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || IGNORED_DIRS.contains(&&*name)
}

fn walk(root: &Path) -> impl Iterator<Item = Result<DirEntry, walkdir::Error>> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry))
}

/// Every `*.py` file under `root`
///
/// # Errors
///
/// Returns [`RunError::Walk`] when a directory cannot be read.
pub fn python_files(root: &Path) -> Result<Vec<PathBuf>, RunError> {
    let mut files = Vec::new();
    for entry in walk(root) {
        let entry = entry.map_err(|source| RunError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
            files.push(path.to_path_buf());
        }
    }
    tracing::debug!(root = %root.display(), count = files.len(), "discovered python files");
    Ok(files)
}

/// First `*csfe.yaml` or `*csfe.yml` file under `root`
#[must_use]
pub fn find_history(root: &Path) -> Option<PathBuf> {
    walk(root)
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.ends_with("csfe.yaml") || name.ends_with("csfe.yml")
        })
        .map(DirEntry::into_path)
}

/// History location: explicit flag, then settings, then discovery, then
/// `csfe.yaml` in `root`
#[must_use]
pub fn history_path(explicit: Option<&Path>, settings: &Settings, root: &Path) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| settings.history_path.clone())
        .or_else(|| find_history(root))
        .unwrap_or_else(|| root.join(DEFAULT_HISTORY_FILE))
}
