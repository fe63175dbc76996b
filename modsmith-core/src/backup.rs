//! Pre-operation backups
//!
//! Before a destructive plan runs, every existing file it deletes, rewrites or
//! moves is copied to `<root>/.backups/<key>-<timestamp>/` together with a
//! `manifest.json`. Backups are never cleaned up automatically.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::content_hash;
use crate::error::{RefactorError, Result};
use crate::path_utils::{path_to_string, sanitize_filename};
use crate::types::Plan;

pub const BACKUP_DIR: &str = ".backups";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    /// Path relative to the project root, forward slashes
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupManifest {
    pub subject: String,
    pub created_at: String,
    pub files: Vec<BackupEntry>,
}

#[derive(Debug, Clone)]
pub struct Backup {
    pub dir: PathBuf,
    pub manifest: BackupManifest,
}

/// Copy every existing file `plan` would touch. Returns `None` when the plan
/// touches no existing file.
pub fn snapshot(root: &Path, key: &str, plan: &Plan) -> Result<Option<Backup>> {
    let touched: BTreeSet<&Path> = plan
        .operations
        .iter()
        .filter_map(|op| op.touches_existing())
        .filter(|p| p.is_file() && p.starts_with(root))
        .collect();
    if touched.is_empty() {
        return Ok(None);
    }

    let dir = unique_dir(
        &root.join(BACKUP_DIR),
        &format!("{}-{}", sanitize_filename(key), Local::now().format("%Y%m%d-%H%M%S")),
    );
    let touched: Vec<&Path> = touched.into_iter().collect();
    let manifest = write_backup(root, &dir, &plan.subject, &touched)?;
    tracing::info!("Backed up {} file(s) to {}", manifest.files.len(), dir.display());
    Ok(Some(Backup { dir, manifest }))
}

/// Copy `files` under `dir` and write the manifest. A failed copy removes
/// whatever part of `dir` was already written.
fn write_backup(root: &Path, dir: &Path, subject: &str, files: &[&Path]) -> Result<BackupManifest> {
    let result = copy_files(root, dir, files).and_then(|entries| {
        let manifest = BackupManifest {
            subject: subject.to_string(),
            created_at: Utc::now().to_rfc3339(),
            files: entries,
        };
        fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&manifest)?)?;
        Ok(manifest)
    });
    if result.is_err() && dir.exists() {
        if let Err(e) = fs::remove_dir_all(dir) {
            tracing::warn!("Failed to remove partial backup {}: {}", dir.display(), e);
        }
    }
    result
}

fn copy_files(root: &Path, dir: &Path, files: &[&Path]) -> Result<Vec<BackupEntry>> {
    let mut entries = Vec::with_capacity(files.len());
    for &path in files {
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let dest = dir.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = fs::copy(path, &dest)?;
        entries.push(BackupEntry {
            path: path_to_string(rel),
            size,
            sha256: content_hash(path)?,
        });
    }
    Ok(entries)
}

fn unique_dir(parent: &Path, base: &str) -> PathBuf {
    let mut candidate = parent.join(base);
    let mut n = 1;
    while candidate.exists() {
        candidate = parent.join(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

impl Backup {
    /// Read a backup directory written by [`snapshot`]
    pub fn load(dir: &Path) -> Result<Self> {
        let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            manifest: serde_json::from_str(&content)?,
        })
    }

    /// Copy every backed-up file back into `root`, verifying its hash first
    pub fn restore(&self, root: &Path) -> Result<usize> {
        for entry in &self.manifest.files {
            let source = self.dir.join(&entry.path);
            if content_hash(&source)? != entry.sha256 {
                return Err(RefactorError::ValidationFailure(format!(
                    "backup copy of {} does not match its manifest hash",
                    entry.path
                )));
            }
        }
        for entry in &self.manifest.files {
            let dest = root.join(&entry.path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.dir.join(&entry.path), &dest)?;
        }
        tracing::info!("Restored {} file(s) from {}", self.manifest.files.len(), self.dir.display());
        Ok(self.manifest.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operation;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_and_restore() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/x.json"), "{\"x\": 1}").unwrap();
        fs::write(root.join("a/y.json"), "{\"y\": 1}").unwrap();

        let mut plan = Plan::new("remove item x");
        plan.push(Operation::Delete { path: root.join("a/x.json") });
        plan.push(Operation::WriteFile {
            path: root.join("a/y.json"),
            contents: "{}".into(),
        });
        plan.push(Operation::CreateDir { path: root.join("b") });
        plan.push(Operation::FileCopy {
            from: root.join("a/y.json"),
            to: root.join("a/new.json"),
        });

        let backup = snapshot(root, "x", &plan).unwrap().unwrap();
        assert!(backup.dir.starts_with(root.join(BACKUP_DIR)));
        assert!(backup
            .dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("x-"));
        let paths: Vec<&str> = backup.manifest.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a/x.json", "a/y.json"]);

        fs::remove_file(root.join("a/x.json")).unwrap();
        fs::write(root.join("a/y.json"), "{}").unwrap();

        let loaded = Backup::load(&backup.dir).unwrap();
        assert_eq!(loaded.manifest, backup.manifest);
        assert_eq!(loaded.restore(root).unwrap(), 2);
        assert_eq!(fs::read_to_string(root.join("a/x.json")).unwrap(), "{\"x\": 1}");
        assert_eq!(fs::read_to_string(root.join("a/y.json")).unwrap(), "{\"y\": 1}");
    }

    #[test]
    fn test_snapshot_nothing_to_back_up() {
        let dir = TempDir::new().unwrap();
        let mut plan = Plan::new("mkdir");
        plan.push(Operation::CreateDir { path: dir.path().join("new") });
        assert!(snapshot(dir.path(), "mkdir", &plan).unwrap().is_none());
        assert!(!dir.path().join(BACKUP_DIR).exists());
    }

    #[test]
    fn test_restore_rejects_tampered_copy() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("f.txt"), "original").unwrap();
        let mut plan = Plan::new("delete f");
        plan.push(Operation::Delete { path: root.join("f.txt") });
        let backup = snapshot(root, "f", &plan).unwrap().unwrap();

        fs::write(backup.dir.join("f.txt"), "tampered").unwrap();
        let err = backup.restore(root).unwrap_err();
        assert!(matches!(err, RefactorError::ValidationFailure(_)));
    }

    #[test]
    fn test_failed_backup_leaves_no_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("kept.json"), "{}").unwrap();
        let backup_dir = root.join(BACKUP_DIR).join("x-1");

        let files = [root.join("kept.json"), root.join("vanished.json")];
        let refs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
        assert!(write_backup(root, &backup_dir, "remove item x", &refs).is_err());
        assert!(!backup_dir.exists());
        assert!(root.join("kept.json").is_file());
    }
}
