//! Rename planning

use std::collections::HashSet;
use std::path::PathBuf;

use super::gate;
use crate::error::{RefactorError, Result};
use crate::locator::{is_variant_suffix, locate, owned_class_names};
use crate::naming::{is_ident_char, ComponentName, ComponentType};
use crate::path_utils::{relative_display, replace_file_name_prefix};
use crate::scanner::{find_references, Identifiers};
use crate::types::{ArtifactKind, Operation, Plan, ProjectContext, TextPattern};

/// Rename every owned artifact of `old` to `new`, rewrite identifiers inside
/// them, then rewrite references in every other file in place.
pub fn plan_rename(
    ctx: &ProjectContext,
    component: ComponentType,
    old: &ComponentName,
    new: &ComponentName,
    force: bool,
) -> Result<Plan> {
    let owned = locate(ctx, old, component);
    if owned.is_empty() {
        return Err(RefactorError::not_found(component, old.as_str()));
    }
    if old == new {
        return Err(RefactorError::Conflict {
            reasons: vec![format!("'{}' is already named '{}'", old, new)],
        });
    }

    let mut plan = Plan::new(format!("rename {} {} -> {}", component, old, new));
    let old_ids = Identifiers::located(ctx, old, component, &owned);
    let new_ids = old_ids.renamed(ctx, new, component);

    let mut moves: Vec<(PathBuf, PathBuf, ArtifactKind)> = Vec::with_capacity(owned.len());
    for artifact in &owned {
        let (old_prefix, new_prefix) = if artifact.kind == ArtifactKind::Code {
            (old.class_name(), new.class_name())
        } else {
            (old.as_str(), new.as_str())
        };
        match replace_file_name_prefix(&artifact.path, old_prefix, new_prefix) {
            Some(dest) => moves.push((artifact.path.clone(), dest, artifact.kind)),
            None => plan.warn(format!(
                "cannot derive a new name for {}; left in place",
                relative_display(&ctx.root, &artifact.path)
            )),
        }
    }

    let mut reasons = Vec::new();
    let taken = locate(ctx, new, component);
    if !taken.is_empty() {
        reasons.push(format!(
            "{} '{}' already exists ({} artifact(s))",
            component,
            new,
            taken.len()
        ));
    }
    let mut overwrite = Vec::new();
    for (from, to, _) in &moves {
        let same_file = from.to_string_lossy().to_lowercase() == to.to_string_lossy().to_lowercase();
        if to.exists() && !same_file {
            reasons.push(format!(
                "destination already exists: {}",
                relative_display(&ctx.root, to)
            ));
            overwrite.push(to.clone());
        }
    }
    gate(&mut plan, reasons, force)?;

    // Forced renames replace whatever sits at the destination
    for path in overwrite {
        plan.push(Operation::Delete { path });
    }

    for (from, to, _) in &moves {
        plan.push(Operation::FileRename {
            from: from.clone(),
            to: to.clone(),
        });
    }

    let renames = owned_renames(ctx, component, old, new, &old_ids, &new_ids);
    for (from, to, kind) in &moves {
        if kind.is_binary_asset() {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(from) else {
            plan.warn(format!(
                "{} is not readable as text; identifiers inside it were not updated",
                relative_display(&ctx.root, from)
            ));
            continue;
        };
        let (contents, count) = rewrite_identifiers(&text, &renames);
        if count > 0 {
            plan.push(Operation::WriteFile {
                path: to.clone(),
                contents,
            });
        }
    }

    let scan = find_references(ctx, old, component, &owned);
    let referencing_files = scan.files().len();
    plan.warnings.extend(scan.warnings.iter().cloned());
    let mut seen: HashSet<(PathBuf, String)> = HashSet::new();
    for reference in &scan.references {
        let key = (reference.artifact.path.clone(), reference.matched.clone());
        if !seen.insert(key) {
            continue;
        }
        let Some(replacement) = old_ids.translate(&reference.matched, &new_ids) else {
            continue;
        };
        let pattern = if reference.matched.starts_with('"') {
            TextPattern::Literal(reference.matched.clone())
        } else {
            TextPattern::Identifier(reference.matched.clone())
        };
        plan.push(Operation::ContentReplace {
            path: reference.artifact.path.clone(),
            pattern,
            replacement,
        });
    }

    tracing::info!(
        "Planned rename of {} '{}': {} artifact(s), {} referencing file(s), {} operation(s)",
        component,
        old,
        moves.len(),
        referencing_files,
        plan.len()
    );
    Ok(plan)
}

/// Old and new spelling of every identifier an owned file can carry, longest
/// first so `testmod:ruby` wins over `ruby` at the same offset
fn owned_renames(
    ctx: &ProjectContext,
    component: ComponentType,
    old: &ComponentName,
    new: &ComponentName,
    old_ids: &Identifiers,
    new_ids: &Identifiers,
) -> Vec<(String, String)> {
    let mut renames: Vec<(String, String)> = Vec::new();
    for variant in &ctx.variants {
        let old_classes = owned_class_names(ctx, old, component, variant);
        let new_classes = owned_class_names(ctx, new, component, variant);
        renames.extend(old_classes.into_iter().zip(new_classes));
    }
    if let (Some(o), Some(n)) = (&old_ids.import_path, &new_ids.import_path) {
        renames.push((o.clone(), n.clone()));
    }
    if let (Some(o), Some(n)) = (&old_ids.class_name, &new_ids.class_name) {
        renames.push((o.clone(), n.clone()));
    }
    renames.extend(old_ids.resource_paths.iter().cloned().zip(new_ids.resource_paths.iter().cloned()));
    renames.extend(old_ids.lang_keys.iter().cloned().zip(new_ids.lang_keys.iter().cloned()));
    renames.push((old_ids.namespaced_id.clone(), new_ids.namespaced_id.clone()));
    renames.push((old_ids.snake.clone(), new_ids.snake.clone()));

    let mut seen = HashSet::new();
    renames.retain(|(o, _)| seen.insert(o.clone()));
    renames.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    renames
}

/// Replace identifiers in a single left-to-right pass; replaced text is never
/// looked at again. A match must start a word and either end one or be
/// followed by a block variant suffix (`ruby_ore_top`).
pub(crate) fn rewrite_identifiers(text: &str, renames: &[(String, String)]) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    let mut copied = 0;
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        let hit = renames
            .iter()
            .find(|(o, _)| rest.starts_with(o.as_str()) && is_rename_site(text, pos, pos + o.len()));
        match hit {
            Some((o, n)) => {
                out.push_str(&text[copied..pos]);
                out.push_str(n);
                pos += o.len();
                copied = pos;
                count += 1;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    out.push_str(&text[copied..]);
    (out, count)
}

fn is_rename_site(text: &str, start: usize, end: usize) -> bool {
    let word_start = text[..start].chars().next_back().map_or(true, |c| !is_ident_char(c));
    if !word_start {
        return false;
    }
    let tail_len = text[end..]
        .find(|c: char| !is_ident_char(c))
        .unwrap_or(text.len() - end);
    tail_len == 0 || is_variant_suffix(&text[end..end + tail_len])
}
