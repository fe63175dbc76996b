//! Version migration planning
//!
//! Copies `versions/<from>` to `versions/<to>`, applies API rules to the
//! copied sources, and records the new version in both config files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::gate;
use crate::api_rules::ApiChangeRules;
use crate::conflict::{classify, ConflictClassification};
use crate::error::{RefactorError, Result};
use crate::path_utils::relative_display;
use crate::types::{ArtifactKind, Operation, Plan, ProjectContext, TextPattern, CONFIG_FILE};
use crate::walk::files_under;

pub fn plan_migrate(
    ctx: &ProjectContext,
    from: &str,
    to: &str,
    force: bool,
    auto_fix: bool,
    rules: &ApiChangeRules,
) -> Result<Plan> {
    let source_dir = ctx.version_dir(from);
    if !source_dir.is_dir() {
        return Err(RefactorError::NotFound {
            component: "version".to_string(),
            name: from.to_string(),
        });
    }
    let target_dir = ctx.version_dir(to);
    let mut plan = Plan::new(format!("migrate {} -> {}", from, to));

    let mut reasons = Vec::new();
    if source_dir == target_dir {
        return Err(RefactorError::Conflict {
            reasons: vec![format!("'{}' and '{}' share a version directory", from, to)],
        });
    }
    if target_dir.exists() {
        reasons.push(format!(
            "version directory {} already exists",
            relative_display(&ctx.root, &target_dir)
        ));
    }
    gate(&mut plan, reasons, force)?;

    let walk = files_under(&source_dir);
    plan.warnings.extend(walk.warnings);

    // Skeleton: the version dir, every source subdirectory, one dir per loader
    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
    dirs.insert(target_dir.clone());
    for file in &walk.files {
        let mut parent = file.parent();
        while let Some(dir) = parent {
            if !dir.starts_with(&source_dir) || dir == source_dir {
                break;
            }
            if let Ok(rel) = dir.strip_prefix(&source_dir) {
                dirs.insert(target_dir.join(rel));
            }
            parent = dir.parent();
        }
    }
    for loader in ctx.loaders() {
        dirs.insert(target_dir.join(loader));
    }
    for dir in dirs {
        if !dir.is_dir() {
            plan.push(Operation::CreateDir { path: dir });
        }
    }

    let mut detected_total = 0;
    for file in &walk.files {
        let Ok(rel) = file.strip_prefix(&source_dir) else {
            continue;
        };
        let dest = target_dir.join(rel);
        if dest.exists() {
            match classify(file, &dest) {
                Ok(ConflictClassification::Identical) => continue,
                Ok(_) => {}
                Err(e) => {
                    plan.warn(format!("skipped {}: {}", relative_display(&ctx.root, file), e));
                    continue;
                }
            }
        }
        plan.push(Operation::FileCopy {
            from: file.clone(),
            to: dest.clone(),
        });

        if ArtifactKind::classify(file) != ArtifactKind::Code {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(file) else {
            continue;
        };
        let rel_dest = relative_display(&ctx.root, &dest);
        for detected in rules.analyze(&content, from, to) {
            detected_total += 1;
            let change = detected.change;
            let fix = change.auto_fix().filter(|f| content.contains(&f.find));
            match fix {
                Some(fix) if auto_fix => plan.push(Operation::ContentReplace {
                    path: dest.clone(),
                    pattern: TextPattern::Literal(fix.find.clone()),
                    replacement: fix.replace.clone(),
                }),
                Some(_) => plan.manual_steps.push(format!(
                    "{}:{}: {} ({}); auto-fixable with --auto-fix",
                    rel_dest,
                    join_lines(&detected.lines),
                    change.description,
                    change.old_pattern
                )),
                None => plan.manual_steps.push(format!(
                    "{}:{}: {} ({})",
                    rel_dest,
                    join_lines(&detected.lines),
                    change.description,
                    change.old_pattern
                )),
            }
        }
    }
    if detected_total > 0 {
        plan.warn(format!("Detected {} potential API change(s)", detected_total));
    }

    patch_version_config(ctx, &source_dir, &target_dir, from, to, &mut plan);
    register_version(ctx, to, &mut plan);

    tracing::info!(
        "Planned migration {} -> {}: {} file(s), {} operation(s)",
        from,
        to,
        walk.files.len(),
        plan.len()
    );
    Ok(plan)
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// `minecraft_version: "<from>"` in the copied version config becomes `<to>`
fn patch_version_config(
    ctx: &ProjectContext,
    source_dir: &Path,
    target_dir: &Path,
    from: &str,
    to: &str,
    plan: &mut Plan,
) {
    let source_config = source_dir.join(CONFIG_FILE);
    let Ok(text) = std::fs::read_to_string(&source_config) else {
        return;
    };
    let candidates = [
        (
            format!("minecraft_version: \"{}\"", from),
            format!("minecraft_version: \"{}\"", to),
        ),
        (
            format!("minecraft_version: '{}'", from),
            format!("minecraft_version: '{}'", to),
        ),
        (
            format!("minecraft_version: {}", from),
            format!("minecraft_version: {}", to),
        ),
    ];
    for (find, replacement) in candidates {
        if text.contains(&find) {
            plan.push(Operation::ContentReplace {
                path: target_dir.join(CONFIG_FILE),
                pattern: TextPattern::Literal(find),
                replacement,
            });
            return;
        }
    }
    plan.manual_steps.push(format!(
        "set minecraft_version to {} in {}",
        to,
        relative_display(&ctx.root, &target_dir.join(CONFIG_FILE))
    ));
}

/// Add `to` to the root config's `minecraft_versions` list by text edit
fn register_version(ctx: &ProjectContext, to: &str, plan: &mut Plan) {
    if ctx.minecraft_versions.iter().any(|v| v == to) {
        return;
    }
    let config_path = ctx.config_path();
    let Ok(text) = std::fs::read_to_string(&config_path) else {
        return;
    };
    match version_list_edit(&text, to) {
        Some((find, replacement)) => plan.push(Operation::ContentReplace {
            path: config_path,
            pattern: TextPattern::Literal(find),
            replacement,
        }),
        None => plan
            .manual_steps
            .push(format!("add {} to minecraft_versions in {}", to, CONFIG_FILE)),
    }
}

/// The exact text to replace so `minecraft_versions` gains `version`.
/// Handles inline (`[a, b]`) and block (`- a`) lists.
fn version_list_edit(text: &str, version: &str) -> Option<(String, String)> {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let lines: Vec<&str> = text.lines().collect();
    let key_index = lines
        .iter()
        .position(|l| l.trim_end().starts_with("minecraft_versions:"))?;
    let key_line = lines[key_index];
    let value = key_line["minecraft_versions:".len()..].trim();

    if value.starts_with('[') {
        let close = key_line.rfind(']')?;
        let inner = key_line[key_line.find('[')? + 1..close].trim();
        let quote = if inner.starts_with('"') { "\"" } else { "" };
        let item = format!("{quote}{version}{quote}");
        let new_line = if inner.is_empty() {
            format!("{}{}{}", &key_line[..close], item, &key_line[close..])
        } else {
            format!("{}, {}{}", key_line[..close].trim_end(), item, &key_line[close..])
        };
        return Some((key_line.to_string(), new_line));
    }
    if !value.is_empty() && !value.starts_with('#') {
        return None;
    }

    let items: Vec<&str> = lines[key_index + 1..]
        .iter()
        .take_while(|l| l.trim_start().starts_with("- "))
        .copied()
        .collect();
    let (indent, quote) = match items.first() {
        Some(first) => {
            let indent = &first[..first.len() - first.trim_start().len()];
            let quote = if first.trim_start()[2..].trim_start().starts_with('"') {
                "\""
            } else {
                ""
            };
            (indent.to_string(), quote)
        }
        None => ("  ".to_string(), ""),
    };
    let block: String = std::iter::once(key_line)
        .chain(items.iter().copied())
        .collect::<Vec<_>>()
        .join(newline);
    let replacement = format!("{block}{newline}{indent}- {quote}{version}{quote}");
    Some((block, replacement))
}
