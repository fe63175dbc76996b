//! Project tree traversal
//!
//! Shared by discovery, scanning, sync and migration so every component skips
//! the same directories (hidden dirs such as `.backups` and `.git`, and build
//! outputs).

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Directory names that never hold project sources
const SKIPPED_DIRS: &[&str] = &["build", "target", "out", "run", "node_modules"];

/// Files found by a walk plus any entries that could not be read
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Every regular file under `dir`, sorted. Missing directories yield nothing.
pub fn files_under(dir: &Path) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    if !dir.is_dir() {
        return outcome;
    }

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => outcome.files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| dir.display().to_string());
                tracing::warn!("Failed to walk {}: {}", path, e);
                outcome.warnings.push(format!("skipped {}: {}", path, e));
            }
        }
    }
    outcome.files.sort();
    outcome
}

/// Immediate subdirectories of `dir`, sorted
pub fn subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(DirEntry::into_path)
        .collect();
    dirs.sort();
    dirs
}

/// Every `src/main/java` and `src/test/java` directory in the project
/// (`shared/<variant>/...` and per-version loader modules), sorted
pub fn java_source_roots(root: &Path) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(6)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(DirEntry::into_path)
        .filter(|p| p.ends_with("src/main/java") || p.ends_with("src/test/java"))
        .collect();
    roots.sort();
    roots
}

fn is_skipped(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name)
}
