//! Mod id rename planning
//!
//! A mod id is the resource namespace, so renaming it moves every pack's
//! `assets/<id>` and `data/<id>` tree and rewrites `<id>:` references.
//! When the Java package is the one the old id implies it follows along.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::package::{config_package_edit, push_package_move};
use super::{gate, vacated_dirs};
use crate::error::{RefactorError, Result};
use crate::naming::{default_package, is_valid_mod_id};
use crate::path_utils::relative_display;
use crate::types::{ArtifactKind, Operation, Plan, ProjectContext, TextPattern};
use crate::walk::files_under;

pub fn plan_mod_rename(ctx: &ProjectContext, new: &str, force: bool) -> Result<Plan> {
    let old = ctx.namespace.as_str();
    if !is_valid_mod_id(new) {
        return Err(RefactorError::InvalidModId(new.to_string()));
    }
    if old == new {
        return Err(RefactorError::Conflict {
            reasons: vec![format!("mod id is already '{}'", new)],
        });
    }

    let mut plan = Plan::new(format!("rename mod {} -> {}", old, new));
    let mut reasons = Vec::new();
    let mut trees = Vec::new();
    for pack in &ctx.asset_packs {
        for (from, to) in [
            (pack.assets_dir(old), pack.assets_dir(new)),
            (pack.data_dir(old), pack.data_dir(new)),
        ] {
            if !files_under(&to).files.is_empty() {
                reasons.push(format!(
                    "namespace directory already exists and is non-empty: {}",
                    relative_display(&ctx.root, &to)
                ));
            }
            if from.is_dir() {
                trees.push((pack.root.clone(), from, to));
            }
        }
    }
    gate(&mut plan, reasons, force)?;

    let config = ctx.config_path();
    let config_text = std::fs::read_to_string(&config)?;
    match config_id_edit(&config_text, old, new) {
        Some((find, replacement)) => plan.push(Operation::ContentReplace {
            path: config.clone(),
            pattern: TextPattern::Identifier(find),
            replacement,
        }),
        None => plan
            .manual_steps
            .push(format!("set `id: {}` under `mod:` in config.yml", new)),
    }

    let mut moved: HashMap<PathBuf, PathBuf> = HashMap::new();
    for (pack_root, from_dir, to_dir) in &trees {
        let walk = files_under(from_dir);
        plan.warnings.extend(walk.warnings);
        for file in walk.files {
            let Ok(rel) = file.strip_prefix(from_dir) else {
                continue;
            };
            let dest = to_dir.join(rel);
            if dest.exists() {
                plan.push(Operation::Delete { path: dest.clone() });
            }
            plan.push(Operation::FileRename {
                from: file.clone(),
                to: dest.clone(),
            });
            moved.insert(file, dest);
        }
        for dir in vacated_dirs(from_dir, pack_root, to_dir, &moved) {
            plan.push(Operation::RemoveDir { path: dir });
        }
    }

    let old_package = default_package(old);
    let new_package = default_package(new);
    if ctx.package_name == old_package && new_package != old_package {
        match push_package_move(ctx, &old_package, &new_package, force, &mut plan, &mut moved) {
            Ok(()) => {
                if let Some((find, replacement)) = config_package_line(&config_text, &old_package, &new_package) {
                    plan.push(Operation::ContentReplace {
                        path: config,
                        pattern: TextPattern::Identifier(find),
                        replacement,
                    });
                }
            }
            Err(err) if err.is_not_found() => {
                plan.warn(format!("no sources in package {}; only resources were renamed", old_package));
            }
            Err(err) => return Err(err),
        }
    }

    push_reference_edits(ctx, old, new, &moved, &mut plan);

    tracing::info!(
        "Planned mod rename {} -> {}: {} file(s) moved, {} operation(s)",
        old,
        new,
        moved.len(),
        plan.len()
    );
    Ok(plan)
}

/// `<old>:` ids and `.old.` lang keys in JSON, the quoted id in code and
/// loader metadata
fn push_reference_edits(
    ctx: &ProjectContext,
    old: &str,
    new: &str,
    moved: &HashMap<PathBuf, PathBuf>,
    plan: &mut Plan,
) {
    let namespaced = (TextPattern::Identifier(format!("{old}:")), format!("{new}:"));
    let lang_key = (TextPattern::Literal(format!(".{old}.")), format!(".{new}."));
    let quoted = (TextPattern::Literal(format!("\"{old}\"")), format!("\"{new}\""));

    let replaced: HashSet<&PathBuf> = moved.values().collect();
    let walk = files_under(&ctx.root);
    plan.warnings.extend(walk.warnings);
    for file in walk.files {
        if file == ctx.config_path() || (replaced.contains(&file) && !moved.contains_key(&file)) {
            continue;
        }
        let kind = ArtifactKind::classify(&file);
        let edits = match kind {
            ArtifactKind::Code => vec![&quoted, &namespaced],
            ArtifactKind::Config => vec![&quoted],
            ArtifactKind::Texture | ArtifactKind::Other => continue,
            _ => vec![&namespaced, &lang_key, &quoted],
        };
        let Ok(text) = std::fs::read_to_string(&file) else {
            plan.warn(format!(
                "{} is not readable as text; mod id references inside it were not updated",
                relative_display(&ctx.root, &file)
            ));
            continue;
        };
        let path = moved.get(&file).cloned().unwrap_or(file);
        for (pattern, replacement) in edits {
            if pattern.is_match(&text) {
                plan.push(Operation::ContentReplace {
                    path: path.clone(),
                    pattern: pattern.clone(),
                    replacement: replacement.clone(),
                });
            }
        }
    }
}

/// The indented `id:` line under `mod:`, rewritten to `new`
fn config_id_edit(text: &str, old: &str, new: &str) -> Option<(String, String)> {
    let line = text.lines().find(|l| {
        let trimmed = l.trim_start();
        trimmed.starts_with("id:") && l.len() > trimmed.len()
    })?;
    let value = line.trim_start()["id:".len()..].trim();
    if value.trim_matches(|c| c == '"' || c == '\'') != old {
        return None;
    }
    let at = line.rfind(old)?;
    Some((line.to_string(), format!("{}{}{}", &line[..at], new, &line[at + old.len()..])))
}

/// Only an explicit `package:` line needs editing; a derived package
/// follows the id on its own.
fn config_package_line(text: &str, old: &str, new: &str) -> Option<(String, String)> {
    if !text.lines().any(|l| l.trim_start().starts_with("package:")) {
        return None;
    }
    config_package_edit(text, old, new)
}
