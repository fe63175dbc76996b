//! Cross-platform path utilities
//!
//! Reports and backups use forward-slash paths relative to the project root
//! regardless of the host separator.

use std::path::{Component, Path, PathBuf};

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert PathBuf to normalized string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Path relative to `root` with forward slashes; falls back to the full path
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => path_to_string(rel),
        Err(_) => path_to_string(path),
    }
}

/// Sanitize a string for use as a single file name component
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' | ' ' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Swap a leading `old` in the file name for `new`, keeping any suffix
/// (`RubyGemFabric.java`, `ruby_gem_top.json`).
pub fn replace_file_name_prefix(path: &Path, old: &str, new: &str) -> Option<PathBuf> {
    let file_name = path.file_name()?.to_str()?;
    let rest = file_name.strip_prefix(old)?;
    Some(path.with_file_name(format!("{}{}", new, rest)))
}

/// Whether `path` lives under any hidden directory (`.git`, `.backups`)
pub fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| n.starts_with('.') && n.len() > 1),
        _ => false,
    })
}
