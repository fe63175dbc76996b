//! Operation planning
//!
//! Turns a request (rename, remove, migrate, sync) into a [`Plan`]. Planning
//! reads the tree but never writes to it; the plan can be previewed or handed
//! to the executor as-is.

mod migrate;
mod mod_id;
mod package;
mod remove;
mod rename;
mod sync;

pub use migrate::plan_migrate;
pub use mod_id::plan_mod_rename;
pub use package::plan_package_rename;
pub use remove::plan_remove;
pub use rename::plan_rename;
pub use sync::plan_sync;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::api_rules::ApiChangeRules;
use crate::error::{RefactorError, Result};
use crate::naming::{ComponentName, ComponentType};
use crate::types::{Plan, ProjectContext};

/// Switches shared by every request kind
#[derive(Debug, Clone, Default)]
pub struct RefactorOptions {
    /// Preview only
    pub dry_run: bool,
    /// Turn conflicts and blocking dependencies into warnings
    pub force: bool,
    /// Remove: leave texture files in place
    pub keep_assets: bool,
    /// Migrate: apply auto-fixable API rules to copied sources
    pub auto_fix: bool,
    /// Sync: also bring target-only files and keys back to the source
    pub bidirectional: bool,
    /// Skip the pre-execution backup
    pub no_backup: bool,
    /// Sync: glob patterns to leave alone
    pub exclude: Vec<String>,
}

/// A transform the engine can plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Rename {
        component: ComponentType,
        old: ComponentName,
        new: ComponentName,
    },
    Remove {
        component: ComponentType,
        name: ComponentName,
    },
    Migrate {
        from: String,
        to: String,
    },
    Sync {
        from: String,
        to: String,
    },
    RenamePackage {
        old: String,
        new: String,
    },
    RenameMod {
        new: String,
    },
}

impl Request {
    /// Name used to key backups
    pub fn backup_key(&self) -> String {
        match self {
            Request::Rename { old, .. } => old.to_string(),
            Request::Remove { name, .. } => name.to_string(),
            Request::Migrate { to, .. } => format!("migrate_{}", to),
            Request::Sync { to, .. } => format!("sync_{}", to),
            Request::RenamePackage { old, .. } => format!("package_{}", old),
            Request::RenameMod { new } => format!("mod_{}", new),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Rename { component, old, new } => {
                write!(f, "rename {} {} -> {}", component, old, new)
            }
            Request::Remove { component, name } => write!(f, "remove {} {}", component, name),
            Request::Migrate { from, to } => write!(f, "migrate {} -> {}", from, to),
            Request::Sync { from, to } => write!(f, "sync {} -> {}", from, to),
            Request::RenamePackage { old, new } => write!(f, "rename package {} -> {}", old, new),
            Request::RenameMod { new } => write!(f, "rename mod -> {}", new),
        }
    }
}

/// Plan any request kind
pub fn plan(
    ctx: &ProjectContext,
    request: &Request,
    options: &RefactorOptions,
    rules: &ApiChangeRules,
) -> Result<Plan> {
    match request {
        Request::Rename { component, old, new } => {
            plan_rename(ctx, *component, old, new, options.force)
        }
        Request::Remove { component, name } => {
            plan_remove(ctx, *component, name, options.force, options.keep_assets)
        }
        Request::Migrate { from, to } => {
            plan_migrate(ctx, from, to, options.force, options.auto_fix, rules)
        }
        Request::Sync { from, to } => plan_sync(ctx, from, to, options),
        Request::RenamePackage { old, new } => plan_package_rename(ctx, old, new, options.force),
        Request::RenameMod { new } => plan_mod_rename(ctx, new, options.force),
    }
}

/// Unforced conflicts fail the plan with every reason; forced ones become warnings
fn gate(plan: &mut Plan, reasons: Vec<String>, force: bool) -> Result<()> {
    if reasons.is_empty() {
        return Ok(());
    }
    if !force {
        return Err(RefactorError::Conflict { reasons });
    }
    for reason in reasons {
        tracing::warn!("Forced past conflict: {}", reason);
        plan.warn(format!("forced: {}", reason));
    }
    Ok(())
}

/// Directories left empty once every `moved` file is gone: `dir` and its
/// subdirectories, deepest first, then emptied ancestors up to (not
/// including) `stop`. Ancestors of `keep` are never listed.
fn vacated_dirs(dir: &Path, stop: &Path, keep: &Path, moved: &HashMap<PathBuf, PathBuf>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if !collect_vacated(dir, moved, &mut dirs) {
        return dirs;
    }
    let mut emptied = dir.to_path_buf();
    while let Some(parent) = emptied.parent() {
        if parent == stop || !parent.starts_with(stop) || keep.starts_with(parent) {
            break;
        }
        let only_child = std::fs::read_dir(parent)
            .map(|entries| entries.filter_map(|e| e.ok()).all(|e| e.path() == emptied))
            .unwrap_or(false);
        if !only_child {
            break;
        }
        dirs.push(parent.to_path_buf());
        emptied = parent.to_path_buf();
    }
    dirs
}

/// Post-order walk; returns whether `dir` ends up empty
fn collect_vacated(dir: &Path, moved: &HashMap<PathBuf, PathBuf>, out: &mut Vec<PathBuf>) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    let mut empty = true;
    for entry in entries {
        let Ok(entry) = entry else {
            empty = false;
            continue;
        };
        let path = entry.path();
        if path.is_dir() {
            empty &= collect_vacated(&path, moved, out);
        } else if !moved.contains_key(&path) {
            empty = false;
        }
    }
    if empty {
        out.push(dir.to_path_buf());
    }
    empty
}
