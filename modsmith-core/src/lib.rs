//! Modsmith Core Library
//!
//! Cross-file refactoring for multi-loader Minecraft mod projects:
//! - Component naming conventions (snake ids, class names, loader classes)
//! - Artifact discovery and project-wide reference scanning
//! - Dependency analysis that blocks unsafe removals
//! - Rename, remove, version migration and asset pack sync planning
//! - Transactional execution with rollback, dry-run and backups
//! - Game API change rules for migrations

pub mod api_rules;
pub mod backup;
pub mod conflict;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod executor;
pub mod lang;
pub mod locator;
pub mod naming;
pub mod path_utils;
pub mod planner;
pub mod report;
pub mod scanner;
pub mod types;
pub mod validate;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api_rules::{compare_versions, ApiChange, ApiChangeRules, ApiChangeType, AutoFix, DetectedChange, RULES_FILE};
pub use backup::{snapshot, Backup, BackupEntry, BackupManifest, BACKUP_DIR};
pub use conflict::{check_conflicts, classify, ConflictClassification, ConflictEntry, ConflictReport, ExcludeSet};
pub use dependency::{find_all_dependencies, DependencyEdge, DependencyKind, DependencyReport};
pub use engine::Engine;
pub use error::{RefactorError, Result};
pub use executor::TransactionalExecutor;
pub use lang::{merge_lang, LangMerge};
pub use locator::locate;
pub use naming::{
    default_package, is_valid_mod_id, is_valid_package, loader_class_name, to_class_name, to_snake_case, ComponentName,
    ComponentType,
};
pub use planner::{
    plan_migrate, plan_mod_rename, plan_package_rename, plan_remove, plan_rename, plan_sync, RefactorOptions, Request,
};
pub use report::{render_plan, render_result};
pub use scanner::{find_references, Identifiers, Reference, ReferenceKind, ReferenceScanner, ScanReport};
pub use types::{
    ArtifactKind, ArtifactRef, AssetPack, ExecutionResult, Operation, Plan, ProjectConfig,
    ProjectContext, TextPattern,
};
pub use validate::{validate, Expectation};
pub use path_utils::{normalize_path, path_to_string, sanitize_filename};
