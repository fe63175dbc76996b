//! Package rename planning

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{gate, vacated_dirs};
use crate::error::{RefactorError, Result};
use crate::naming::is_valid_package;
use crate::path_utils::relative_display;
use crate::types::{ArtifactKind, Operation, Plan, ProjectContext, TextPattern};
use crate::walk::{files_under, java_source_roots};

/// Move package `old` to `new` in every Java source root, rewrite its name in
/// all code, and record the new package in config.yml.
pub fn plan_package_rename(ctx: &ProjectContext, old: &str, new: &str, force: bool) -> Result<Plan> {
    for package in [old, new] {
        if !is_valid_package(package) {
            return Err(RefactorError::InvalidPackage(package.to_string()));
        }
    }
    if old == new {
        return Err(RefactorError::Conflict {
            reasons: vec![format!("package is already named '{}'", new)],
        });
    }

    let mut plan = Plan::new(format!("rename package {} -> {}", old, new));
    let mut moved = HashMap::new();
    push_package_move(ctx, old, new, force, &mut plan, &mut moved)?;

    let config = ctx.config_path();
    let text = std::fs::read_to_string(&config)?;
    match config_package_edit(&text, old, new) {
        Some((find, replacement)) => plan.push(Operation::ContentReplace {
            path: config,
            pattern: TextPattern::Identifier(find),
            replacement,
        }),
        None => plan
            .manual_steps
            .push(format!("set `package: {}` under `mod:` in config.yml", new)),
    }

    tracing::info!(
        "Planned package rename {} -> {}: {} file(s) moved, {} operation(s)",
        old,
        new,
        moved.len(),
        plan.len()
    );
    Ok(plan)
}

/// One source root's share of a package move
struct MovedTree {
    root: PathBuf,
    old_dir: PathBuf,
    new_dir: PathBuf,
    pairs: Vec<(PathBuf, PathBuf)>,
}

/// Append the moves, emptied-directory removals and code edits that turn
/// package `old` into `new`. Every moved file is recorded in `moved`.
pub(super) fn push_package_move(
    ctx: &ProjectContext,
    old: &str,
    new: &str,
    force: bool,
    plan: &mut Plan,
    moved: &mut HashMap<PathBuf, PathBuf>,
) -> Result<()> {
    let old_rel = old.replace('.', "/");
    let new_rel = new.replace('.', "/");
    if Path::new(&new_rel).starts_with(&old_rel) || Path::new(&old_rel).starts_with(&new_rel) {
        return Err(RefactorError::Conflict {
            reasons: vec![format!(
                "packages '{}' and '{}' are nested; rename through an unrelated package",
                old, new
            )],
        });
    }

    let mut trees: Vec<MovedTree> = Vec::new();
    let mut reasons = Vec::new();
    let mut overwrite = Vec::new();
    for root in java_source_roots(&ctx.root) {
        let old_dir = root.join(&old_rel);
        let new_dir = root.join(&new_rel);
        let walk = files_under(&old_dir);
        plan.warnings.extend(walk.warnings);
        if walk.files.is_empty() {
            continue;
        }
        if !files_under(&new_dir).files.is_empty() {
            reasons.push(format!(
                "target package directory already exists and is non-empty: {}",
                relative_display(&ctx.root, &new_dir)
            ));
        }
        let mut pairs = Vec::with_capacity(walk.files.len());
        for file in walk.files {
            let Ok(rel) = file.strip_prefix(&old_dir) else {
                continue;
            };
            let dest = new_dir.join(rel);
            if dest.exists() {
                overwrite.push(dest.clone());
            }
            pairs.push((file, dest));
        }
        trees.push(MovedTree {
            root,
            old_dir,
            new_dir,
            pairs,
        });
    }
    if trees.is_empty() {
        return Err(RefactorError::NotFound {
            component: "package".to_string(),
            name: old.to_string(),
        });
    }
    gate(plan, reasons, force)?;

    for path in overwrite {
        plan.push(Operation::Delete { path });
    }
    for tree in &trees {
        for (from, to) in &tree.pairs {
            plan.push(Operation::FileRename {
                from: from.clone(),
                to: to.clone(),
            });
            moved.insert(from.clone(), to.clone());
        }
    }
    for tree in &trees {
        for dir in vacated_dirs(&tree.old_dir, &tree.root, &tree.new_dir, moved) {
            plan.push(Operation::RemoveDir { path: dir });
        }
    }

    let pattern = TextPattern::Identifier(old.to_string());
    let code = files_under(&ctx.root);
    for file in code.files {
        if ArtifactKind::classify(&file) != ArtifactKind::Code {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(&file) else {
            plan.warn(format!(
                "{} is not readable as text; package references inside it were not updated",
                relative_display(&ctx.root, &file)
            ));
            continue;
        };
        if pattern.is_match(&text) {
            let path = moved.get(&file).cloned().unwrap_or(file);
            plan.push(Operation::ContentReplace {
                path,
                pattern: pattern.clone(),
                replacement: new.to_string(),
            });
        }
    }
    Ok(())
}

/// The config.yml line to change so the project's package becomes `new`:
/// the existing `package:` line, or the mod's `id:` line with a `package:`
/// line added after it.
pub(super) fn config_package_edit(text: &str, old: &str, new: &str) -> Option<(String, String)> {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    if let Some(line) = text.lines().find(|l| l.trim_start().starts_with("package:")) {
        let value = line.trim_start()["package:".len()..].trim();
        if value.trim_matches(|c| c == '"' || c == '\'') != old {
            return None;
        }
        return Some((line.to_string(), line.replacen(old, new, 1)));
    }
    let line = text.lines().find(|l| {
        let trimmed = l.trim_start();
        trimmed.starts_with("id:") && l.len() > trimmed.len()
    })?;
    let indent = &line[..line.len() - line.trim_start().len()];
    Some((line.to_string(), format!("{line}{newline}{indent}package: {new}")))
}
