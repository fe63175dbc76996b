//! Human-readable rendering of plans and execution results

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::path_utils::relative_display;
use crate::types::{ExecutionResult, Plan};

/// Operations shown per group before the rest are summarized
const PREVIEW_PER_GROUP: usize = 5;

/// Dry-run preview: operations grouped by kind, then warnings and manual steps
pub fn render_plan(plan: &Plan, root: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan: {} ({} operation(s))", plan.subject, plan.len());

    let mut groups: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for op in &plan.operations {
        groups
            .entry(op.label())
            .or_default()
            .push(relative_display(root, op.target()));
    }
    for (label, targets) in &groups {
        let _ = writeln!(out, "  {} ({}):", label, targets.len());
        for target in targets.iter().take(PREVIEW_PER_GROUP) {
            let _ = writeln!(out, "    {}", target);
        }
        if targets.len() > PREVIEW_PER_GROUP {
            let _ = writeln!(out, "    ... and {} more", targets.len() - PREVIEW_PER_GROUP);
        }
    }

    section(&mut out, "Warnings", &plan.warnings);
    section(&mut out, "Manual steps", &plan.manual_steps);
    out
}

/// Migration report: status, counts, touched paths, warnings, errors and
/// manual follow-ups
pub fn render_result(result: &ExecutionResult, root: &Path) -> String {
    let mut out = String::new();
    let status = match (result.success, result.dry_run) {
        (true, true) => "DRY RUN",
        (true, false) => "SUCCESS",
        (false, _) if result.rolled_back => "FAILED (rolled back)",
        (false, _) => "FAILED",
    };
    let _ = writeln!(out, "Status: {}", status);
    let _ = writeln!(
        out,
        "Operations: {} planned, {} executed, {} rolled back",
        result.operations_planned, result.operations_executed, result.operations_rolled_back
    );

    paths(&mut out, "Removed", &result.paths_removed, root);
    paths(&mut out, "Created", &result.paths_created, root);
    paths(&mut out, "Modified", &result.paths_modified, root);
    section(&mut out, "Warnings", &result.warnings);
    section(&mut out, "Errors", &result.errors);
    section(&mut out, "Manual steps", &result.manual_steps);

    if let Some(dir) = &result.backup_dir {
        let _ = writeln!(out, "Backup: {}", relative_display(root, dir));
    }
    out
}

fn section(out: &mut String, title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let _ = writeln!(out, "{} ({}):", title, lines.len());
    for line in lines {
        let _ = writeln!(out, "  - {}", line);
    }
}

fn paths(out: &mut String, title: &str, paths: &[PathBuf], root: &Path) {
    let lines: Vec<String> = paths.iter().map(|p| relative_display(root, p)).collect();
    section(out, title, &lines);
}
