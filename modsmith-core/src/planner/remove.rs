//! Remove planning

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use super::gate;
use crate::dependency::find_all_dependencies;
use crate::error::{RefactorError, Result};
use crate::locator::locate;
use crate::naming::{ComponentName, ComponentType};
use crate::types::{ArtifactKind, Operation, Plan, ProjectContext};

/// Delete every owned artifact of `name`, then any parent directory the
/// deletions leave empty. Blocking dependencies fail the plan unless forced.
pub fn plan_remove(
    ctx: &ProjectContext,
    component: ComponentType,
    name: &ComponentName,
    force: bool,
    keep_assets: bool,
) -> Result<Plan> {
    let owned = locate(ctx, name, component);
    if owned.is_empty() {
        return Err(RefactorError::not_found(component, name.as_str()));
    }

    let mut plan = Plan::new(format!("remove {} {}", component, name));
    let deps = find_all_dependencies(ctx, name, component, &owned);
    plan.warnings.extend(deps.warnings);

    let reasons: Vec<String> = deps
        .edges
        .iter()
        .map(|edge| edge.description.clone())
        .collect();
    if !reasons.is_empty() && force {
        plan.warn(format!(
            "{} reference(s) to '{}' will dangle after removal",
            reasons.len(),
            name
        ));
    }
    gate(&mut plan, reasons, force)?;

    let doomed: Vec<PathBuf> = owned
        .iter()
        .filter(|a| !(keep_assets && a.kind == ArtifactKind::Texture))
        .map(|a| a.path.clone())
        .collect();
    if doomed.len() < owned.len() {
        plan.warn(format!("kept {} texture file(s)", owned.len() - doomed.len()));
    }

    for path in &doomed {
        plan.push(Operation::Delete { path: path.clone() });
    }
    for dir in emptied_parents(ctx, &doomed) {
        plan.push(Operation::RemoveDir { path: dir });
    }

    tracing::info!(
        "Planned removal of {} '{}': {} file(s), {} dir(s)",
        component,
        name,
        doomed.len(),
        plan.len() - doomed.len()
    );
    Ok(plan)
}

/// Immediate parents whose every entry is being deleted, deepest first.
/// Layout directories are never included.
fn emptied_parents(ctx: &ProjectContext, doomed: &[PathBuf]) -> Vec<PathBuf> {
    let protected: HashSet<PathBuf> = ctx.protected_dirs().into_iter().collect();
    let doomed_set: HashSet<&Path> = doomed.iter().map(PathBuf::as_path).collect();
    let parents: BTreeSet<&Path> = doomed.iter().filter_map(|p| p.parent()).collect();

    let mut dirs: Vec<PathBuf> = parents
        .into_iter()
        .filter(|dir| !protected.contains(*dir) && dir.starts_with(&ctx.root))
        .filter(|dir| {
            std::fs::read_dir(dir).is_ok_and(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .all(|e| doomed_set.contains(e.path().as_path()))
            })
        })
        .map(Path::to_path_buf)
        .collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, COMMON, PACK};

    #[test]
    fn test_remove_unreferenced() {
        let fx = Fixture::with_ruby_gem();
        let name = ComponentName::parse("topaz_shard").unwrap();
        let plan = plan_remove(&fx.ctx(), ComponentType::Item, &name, false, false).unwrap();

        let deletes: Vec<String> = plan
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::Delete { path } => Some(fx.rel(path)),
                _ => None,
            })
            .collect();
        assert_eq!(
            deletes,
            vec![
                format!("{COMMON}/items/TopazShard.java"),
                format!("{PACK}/assets/testmod/models/item/topaz_shard.json"),
            ]
        );
        // both parents still hold ruby_gem files
        assert!(!plan.operations.iter().any(|op| matches!(op, Operation::RemoveDir { .. })));
    }

    #[test]
    fn test_remove_blocked_by_dependencies() {
        let fx = Fixture::with_ruby_gem();
        let name = ComponentName::parse("ruby_gem").unwrap();
        let err = plan_remove(&fx.ctx(), ComponentType::Item, &name, false, false).unwrap_err();
        match err {
            RefactorError::Conflict { reasons } => {
                assert!(reasons.iter().any(|r| r.contains("ModItems.java")));
            }
            other => panic!("unexpected {:?}", other),
        }

        let plan = plan_remove(&fx.ctx(), ComponentType::Item, &name, true, false).unwrap();
        assert!(plan.warnings.iter().any(|w| w.contains("will dangle")));
    }

    #[test]
    fn test_keep_assets_and_empty_dirs() {
        let fx = Fixture::with_ruby_gem();
        let name = ComponentName::parse("ruby_gem").unwrap();
        let plan = plan_remove(&fx.ctx(), ComponentType::Item, &name, true, true).unwrap();

        assert!(!plan.operations.iter().any(|op| matches!(
            op,
            Operation::Delete { path } if path.extension().is_some_and(|e| e == "png")
        )));

        let removed_dirs: Vec<String> = plan
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::RemoveDir { path } => Some(fx.rel(path)),
                _ => None,
            })
            .collect();
        // each loader's platform dir held only the registration class
        assert_eq!(removed_dirs.len(), 3);
        assert!(removed_dirs
            .iter()
            .all(|d| d.contains("/platform/")));
        assert!(plan.warnings.iter().any(|w| w.contains("kept 1 texture")));
    }
}
