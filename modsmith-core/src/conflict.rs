//! Conflict detection between two copies of a file tree
//!
//! Content equality is checked before modification times, so a file that was
//! merely re-copied never reports as a conflict.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::path_utils::relative_display;
use crate::walk::files_under;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictClassification {
    Identical,
    MissingInTarget,
    OutdatedInTarget,
    ConflictingEdit,
}

impl fmt::Display for ConflictClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictClassification::Identical => "identical",
            ConflictClassification::MissingInTarget => "missing in target",
            ConflictClassification::OutdatedInTarget => "outdated in target",
            ConflictClassification::ConflictingEdit => "conflicting edit",
        };
        f.write_str(s)
    }
}

/// Hex SHA-256 of a file's bytes
pub fn content_hash(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Classify a (source, target) pair.
///
/// Absent target is missing; equal hashes are identical; a target strictly
/// older than the source is outdated; anything else is a conflicting edit.
pub fn classify(source: &Path, target: &Path) -> io::Result<ConflictClassification> {
    if !target.exists() {
        return Ok(ConflictClassification::MissingInTarget);
    }
    if content_hash(source)? == content_hash(target)? {
        return Ok(ConflictClassification::Identical);
    }
    let source_mtime = modified(source)?;
    let target_mtime = modified(target)?;
    if target_mtime < source_mtime {
        Ok(ConflictClassification::OutdatedInTarget)
    } else {
        Ok(ConflictClassification::ConflictingEdit)
    }
}

fn modified(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Glob patterns (`*`, `?`) a sync skips, matched against the relative path
/// and against the bare file name
#[derive(Debug, Default, Clone)]
pub struct ExcludeSet {
    patterns: Vec<Regex>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self> {
        let patterns = globs
            .iter()
            .map(|g| Regex::new(&glob_to_regex(g.as_ref())))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, relative: &str) -> bool {
        let file_name = relative.rsplit('/').next().unwrap_or(relative);
        self.patterns
            .iter()
            .any(|re| re.is_match(relative) || re.is_match(file_name))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out.push('$');
    out
}

/// One file of the source tree and how it relates to the target tree
#[derive(Debug, Clone, Serialize)]
pub struct ConflictEntry {
    /// Path relative to both tree roots, forward slashes
    pub relative: String,
    pub source: PathBuf,
    pub target: PathBuf,
    pub classification: ConflictClassification,
}

#[derive(Debug, Default, Serialize)]
pub struct ConflictReport {
    pub entries: Vec<ConflictEntry>,
    pub warnings: Vec<String>,
}

impl ConflictReport {
    pub fn count(&self, classification: ConflictClassification) -> usize {
        self.entries
            .iter()
            .filter(|e| e.classification == classification)
            .count()
    }
}

/// Classify every non-excluded file under `source_dir` against its
/// counterpart under `target_dir`, in path order
pub fn check_conflicts(source_dir: &Path, target_dir: &Path, excludes: &ExcludeSet) -> ConflictReport {
    let walk = files_under(source_dir);
    let mut report = ConflictReport {
        entries: Vec::new(),
        warnings: walk.warnings,
    };

    for source in walk.files {
        let relative = relative_display(source_dir, &source);
        if excludes.is_excluded(&relative) {
            continue;
        }
        let target = target_dir.join(&relative);
        match classify(&source, &target) {
            Ok(classification) => report.entries.push(ConflictEntry {
                relative,
                source,
                target,
                classification,
            }),
            Err(e) => {
                tracing::warn!("Failed to compare {}: {}", relative, e);
                report.warnings.push(format!("skipped {}: {}", relative, e));
            }
        }
    }
    report
}
