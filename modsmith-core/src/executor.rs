//! Transactional plan execution
//!
//! Operations run strictly in order. Each applied operation pushes the steps
//! that undo it; the first failure unwinds that stack in reverse so the tree
//! ends up as it was before `execute` was called.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RefactorError;
use crate::types::{ExecutionResult, Operation, Plan};

/// How to reverse one applied step
#[derive(Debug)]
enum Undo {
    /// Move `to` back to `from`
    Rename { from: PathBuf, to: PathBuf },
    /// Put previous bytes back at `path`
    Restore { path: PathBuf, contents: Vec<u8> },
    RemoveFile(PathBuf),
    /// Directories created by the step, deepest first
    RemoveDirs(Vec<PathBuf>),
    CreateDir(PathBuf),
}

#[derive(Debug, Default)]
struct Effects {
    removed: Vec<PathBuf>,
    created: Vec<PathBuf>,
    modified: Vec<PathBuf>,
}

impl Effects {
    fn record(&mut self, op: &Operation) {
        match op {
            Operation::FileRename { from, to } => {
                self.removed.push(from.clone());
                self.created.push(to.clone());
            }
            Operation::FileCopy { to, .. } | Operation::WriteFile { path: to, .. } => {
                if to.exists() {
                    self.modified.push(to.clone());
                } else {
                    self.created.push(to.clone());
                }
            }
            Operation::ContentReplace { path, .. } => self.modified.push(path.clone()),
            Operation::Delete { path } | Operation::RemoveDir { path } => self.removed.push(path.clone()),
            Operation::CreateDir { path } => {
                if !path.is_dir() {
                    self.created.push(path.clone());
                }
            }
        }
    }

    fn into_result(self, result: &mut ExecutionResult) {
        result.paths_removed = dedup(self.removed);
        result.paths_created = dedup(self.created);
        result.paths_modified = dedup(self.modified);
    }
}

fn dedup(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

/// Applies plans sequentially with all-or-nothing semantics
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionalExecutor;

impl TransactionalExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Apply (or, with `dry_run`, preview) every operation in `plan`
    pub fn execute(&self, plan: &Plan, dry_run: bool) -> ExecutionResult {
        let mut result = ExecutionResult {
            dry_run,
            operations_planned: plan.operations.len(),
            warnings: plan.warnings.clone(),
            manual_steps: plan.manual_steps.clone(),
            ..Default::default()
        };

        if dry_run {
            let mut effects = Effects::default();
            for op in &plan.operations {
                effects.record(op);
            }
            effects.into_result(&mut result);
            result.success = true;
            tracing::info!(
                "Dry run of '{}': {} operation(s) planned",
                plan.subject,
                plan.operations.len()
            );
            return result;
        }

        tracing::info!(
            "Executing '{}' ({} operation(s))",
            plan.subject,
            plan.operations.len()
        );

        let mut undo_stack: Vec<Undo> = Vec::new();
        let mut effects = Effects::default();

        for (index, op) in plan.operations.iter().enumerate() {
            tracing::debug!("[{}] {}", index, op);
            // Effects are recorded against the pre-step state
            let mut step_effects = Effects::default();
            step_effects.record(op);

            match apply(op, &mut undo_stack) {
                Ok(changed) => {
                    if changed {
                        effects.removed.extend(step_effects.removed);
                        effects.created.extend(step_effects.created);
                        effects.modified.extend(step_effects.modified);
                    }
                }
                Err(message) => {
                    let failure = RefactorError::PartialFailure {
                        index,
                        message: format!("{}: {}", op, message),
                    };
                    tracing::warn!("{}; rolling back {} step(s)", failure, index);
                    result.errors.push(failure.to_string());

                    let rollback_errors = rollback(undo_stack);
                    for e in &rollback_errors {
                        tracing::error!("Rollback step failed: {}", e);
                    }
                    result.errors.extend(rollback_errors.into_iter().map(|e| format!("rollback: {}", e)));
                    result.rolled_back = true;
                    result.operations_rolled_back = index;
                    result.operations_executed = 0;
                    result.success = false;
                    return result;
                }
            }
        }

        effects.into_result(&mut result);
        result.operations_executed = plan.operations.len();
        result.success = true;
        tracing::info!("Applied {} operation(s) for '{}'", result.operations_executed, plan.subject);
        result
    }
}

/// Apply one operation, pushing its undo steps as they become necessary.
/// Returns whether anything changed.
fn apply(op: &Operation, undo: &mut Vec<Undo>) -> Result<bool, String> {
    match op {
        Operation::FileRename { from, to } => {
            if !from.is_file() {
                return Err("source does not exist".to_string());
            }
            let case_only = is_case_only_rename(from, to);
            if to.exists() && !case_only {
                return Err("destination already exists".to_string());
            }
            create_parents(to, undo)?;
            if case_only {
                rename_via_temp(from, to)?;
            } else {
                fs::rename(from, to).map_err(|e| e.to_string())?;
            }
            undo.push(Undo::Rename {
                from: from.clone(),
                to: to.clone(),
            });
            Ok(true)
        }
        Operation::FileCopy { from, to } => {
            if !from.is_file() {
                return Err("source does not exist".to_string());
            }
            create_parents(to, undo)?;
            undo.push(preserve(to)?);
            fs::copy(from, to).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Operation::ContentReplace {
            path,
            pattern,
            replacement,
        } => {
            let original = fs::read(path).map_err(|e| e.to_string())?;
            let text = String::from_utf8(original).map_err(|_| "file is not valid UTF-8".to_string())?;
            let (updated, count) = pattern.replace_all(&text, replacement);
            if count == 0 {
                return Ok(false);
            }
            undo.push(Undo::Restore {
                path: path.clone(),
                contents: text.into_bytes(),
            });
            fs::write(path, updated).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Operation::WriteFile { path, contents } => {
            create_parents(path, undo)?;
            undo.push(preserve(path)?);
            fs::write(path, contents).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Operation::Delete { path } => {
            if !path.is_file() {
                return Err("file does not exist".to_string());
            }
            let contents = fs::read(path).map_err(|e| e.to_string())?;
            undo.push(Undo::Restore {
                path: path.clone(),
                contents,
            });
            fs::remove_file(path).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Operation::CreateDir { path } => {
            if path.is_dir() {
                return Ok(false);
            }
            let mut created = missing_ancestors(path);
            created.insert(0, path.clone());
            undo.push(Undo::RemoveDirs(created));
            fs::create_dir_all(path).map_err(|e| e.to_string())?;
            Ok(true)
        }
        Operation::RemoveDir { path } => {
            fs::remove_dir(path).map_err(|e| e.to_string())?;
            undo.push(Undo::CreateDir(path.clone()));
            Ok(true)
        }
    }
}

/// Case-insensitive file systems see `to` as `from`; go through a temp name.
/// If the second hop fails the file is moved back, and a failed move back is
/// part of the error.
fn rename_via_temp(from: &Path, to: &Path) -> Result<(), String> {
    let tmp = temp_sibling(from);
    fs::rename(from, &tmp).map_err(|e| e.to_string())?;
    if let Err(e) = fs::rename(&tmp, to) {
        return Err(match fs::rename(&tmp, from) {
            Ok(()) => e.to_string(),
            Err(restore) => format!(
                "{}; file left at {} (could not move it back: {})",
                e,
                tmp.display(),
                restore
            ),
        });
    }
    Ok(())
}

/// Undo step for a file about to be overwritten (or created)
fn preserve(path: &Path) -> Result<Undo, String> {
    if path.is_file() {
        let contents = fs::read(path).map_err(|e| e.to_string())?;
        Ok(Undo::Restore {
            path: path.to_path_buf(),
            contents,
        })
    } else if path.exists() {
        Err("destination is not a regular file".to_string())
    } else {
        Ok(Undo::RemoveFile(path.to_path_buf()))
    }
}

/// Create missing parent directories, registering their removal first
fn create_parents(path: &Path, undo: &mut Vec<Undo>) -> Result<(), String> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }
    let mut created = missing_ancestors(parent);
    created.insert(0, parent.to_path_buf());
    undo.push(Undo::RemoveDirs(created));
    fs::create_dir_all(parent).map_err(|e| e.to_string())
}

/// Ancestors of `path` (excluding itself) that do not exist yet, deepest first
fn missing_ancestors(path: &Path) -> Vec<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|a| !a.as_os_str().is_empty() && !a.exists())
        .map(Path::to_path_buf)
        .collect()
}

fn is_case_only_rename(from: &Path, to: &Path) -> bool {
    from != to && from.to_string_lossy().to_lowercase() == to.to_string_lossy().to_lowercase()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.modsmith-tmp", name))
}

/// Reverse applied steps, newest first. Returns the steps that failed.
fn rollback(undo_stack: Vec<Undo>) -> Vec<String> {
    let mut errors = Vec::new();
    for step in undo_stack.into_iter().rev() {
        let outcome = match &step {
            Undo::Rename { from, to } => {
                if is_case_only_rename(from, to) {
                    let tmp = temp_sibling(to);
                    fs::rename(to, &tmp).and_then(|_| fs::rename(&tmp, from))
                } else {
                    fs::rename(to, from)
                }
            }
            Undo::Restore { path, contents } => path
                .parent()
                .map_or(Ok(()), fs::create_dir_all)
                .and_then(|_| fs::write(path, contents)),
            Undo::RemoveFile(path) => match fs::remove_file(path) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            },
            Undo::RemoveDirs(dirs) => dirs.iter().try_for_each(|d| match fs::remove_dir(d) {
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                other => other,
            }),
            Undo::CreateDir(path) => fs::create_dir_all(path),
        };
        if let Err(e) = outcome {
            errors.push(format!("{:?}: {}", step, e));
        }
    }
    errors
}
