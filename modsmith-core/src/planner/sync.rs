//! Asset pack sync planning

use std::fs;

use super::RefactorOptions;
use crate::conflict::{check_conflicts, ConflictClassification, ConflictEntry, ExcludeSet};
use crate::error::{RefactorError, Result};
use crate::lang::{is_lang_file, merge_lang};
use crate::types::{Operation, Plan, ProjectContext};

/// Trees synced between packs
const SYNCED_TREES: [&str; 2] = ["assets", "data"];

/// Bring the `to` pack up to date with the `from` pack.
///
/// Missing and outdated files are copied, lang files are merged key by key,
/// and conflicting edits are left alone unless `force` is set. With
/// `bidirectional`, target-only files and lang keys flow back to the source.
pub fn plan_sync(ctx: &ProjectContext, from: &str, to: &str, options: &RefactorOptions) -> Result<Plan> {
    let source = ctx.asset_pack(from)?;
    let target = ctx.asset_pack(to)?;
    if source.root == target.root {
        return Err(RefactorError::Conflict {
            reasons: vec![format!("cannot sync pack '{}' with itself", source.name)],
        });
    }

    let excludes = ExcludeSet::new(&options.exclude)?;
    let mut plan = Plan::new(format!("sync {} -> {}", source.name, target.name));

    for tree in SYNCED_TREES {
        let source_dir = source.root.join(tree);
        let target_dir = target.root.join(tree);
        if !source_dir.is_dir() {
            continue;
        }

        let report = check_conflicts(&source_dir, &target_dir, &excludes);
        plan.warnings.extend(report.warnings);
        for entry in &report.entries {
            plan_forward(&mut plan, entry, options.force);
        }

        if options.bidirectional && target_dir.is_dir() {
            let reverse = check_conflicts(&target_dir, &source_dir, &excludes);
            plan.warnings.extend(reverse.warnings);
            for entry in &reverse.entries {
                plan_reverse(&mut plan, entry);
            }
        }
    }

    tracing::info!(
        "Planned sync {} -> {}: {} operation(s)",
        source.name,
        target.name,
        plan.len()
    );
    Ok(plan)
}

fn plan_forward(plan: &mut Plan, entry: &ConflictEntry, force: bool) {
    let copy = || Operation::FileCopy {
        from: entry.source.clone(),
        to: entry.target.clone(),
    };
    match entry.classification {
        ConflictClassification::Identical => {}
        ConflictClassification::MissingInTarget => plan.push(copy()),
        _ if is_lang_file(&entry.source) => merge_into(plan, entry, force),
        ConflictClassification::OutdatedInTarget => plan.push(copy()),
        ConflictClassification::ConflictingEdit if force => {
            plan.warn(format!("overwriting conflicting edit: {}", entry.relative));
            plan.push(copy());
        }
        ConflictClassification::ConflictingEdit => {
            plan.warn(format!("skipped conflicting edit: {}", entry.relative));
        }
    }
}

/// Entries here are classified with the target pack as the source side
fn plan_reverse(plan: &mut Plan, entry: &ConflictEntry) {
    match entry.classification {
        ConflictClassification::Identical => {}
        ConflictClassification::MissingInTarget => plan.push(Operation::FileCopy {
            from: entry.source.clone(),
            to: entry.target.clone(),
        }),
        _ if is_lang_file(&entry.source) => merge_into(plan, entry, false),
        // Differing non-lang files were settled by the forward pass
        _ => {}
    }
}

/// Merge lang keys from `entry.source` into `entry.target`
fn merge_into(plan: &mut Plan, entry: &ConflictEntry, source_wins: bool) {
    let (source_text, target_text) = match (fs::read_to_string(&entry.source), fs::read_to_string(&entry.target)) {
        (Ok(s), Ok(t)) => (s, t),
        (Err(e), _) | (_, Err(e)) => {
            plan.warn(format!("skipped {}: {}", entry.relative, e));
            return;
        }
    };
    let merge = merge_lang(&source_text, &target_text, source_wins);
    for warning in merge.warnings {
        plan.warn(format!("{}: {}", entry.relative, warning));
    }
    if let Some(contents) = merge.merged {
        tracing::debug!(
            "Merging {}: {} added, {} overwritten",
            entry.relative,
            merge.added.len(),
            merge.overwritten.len()
        );
        plan.push(Operation::WriteFile {
            path: entry.target.clone(),
            contents,
        });
    }
}
