//! The refactoring engine: plan, back up, execute, validate
//!
//! ```no_run
//! use modsmith_core::{ComponentName, ComponentType, Engine, RefactorOptions};
//!
//! let engine = Engine::open("./my-mod")?;
//! let result = engine.rename(
//!     ComponentType::Item,
//!     &ComponentName::parse("ruby_gem")?,
//!     &ComponentName::parse("sapphire_gem")?,
//!     &RefactorOptions::default(),
//! )?;
//! assert!(result.success);
//! # Ok::<(), modsmith_core::RefactorError>(())
//! ```

use std::path::Path;

use crate::api_rules::ApiChangeRules;
use crate::backup;
use crate::conflict::{self, ConflictReport, ExcludeSet};
use crate::dependency::{self, DependencyReport};
use crate::error::{RefactorError, Result};
use crate::executor::TransactionalExecutor;
use crate::locator;
use crate::naming::{ComponentName, ComponentType};
use crate::planner::{self, RefactorOptions, Request};
use crate::scanner::{self, ScanReport};
use crate::types::{ArtifactRef, ExecutionResult, Plan, ProjectContext};
use crate::validate::{validate, Expectation};

/// One project plus the API rules its migrations use
#[derive(Debug, Clone)]
pub struct Engine {
    ctx: ProjectContext,
    rules: ApiChangeRules,
}

impl Engine {
    /// Load `config.yml` and `api_changes.toml` from `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let ctx = ProjectContext::load(root.as_ref())?;
        let rules = ApiChangeRules::for_project(&ctx.root)?;
        Ok(Self { ctx, rules })
    }

    /// Engine with the built-in API rules only
    pub fn new(ctx: ProjectContext) -> Self {
        Self {
            ctx,
            rules: ApiChangeRules::builtin(),
        }
    }

    pub fn with_rules(mut self, rules: ApiChangeRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn context(&self) -> &ProjectContext {
        &self.ctx
    }

    pub fn rules(&self) -> &ApiChangeRules {
        &self.rules
    }

    pub fn locate(&self, name: &ComponentName, component: ComponentType) -> Vec<ArtifactRef> {
        locator::locate(&self.ctx, name, component)
    }

    pub fn find_references(&self, name: &ComponentName, component: ComponentType) -> ScanReport {
        let owned = self.locate(name, component);
        scanner::find_references(&self.ctx, name, component, &owned)
    }

    pub fn find_all_dependencies(&self, name: &ComponentName, component: ComponentType) -> DependencyReport {
        let owned = self.locate(name, component);
        dependency::find_all_dependencies(&self.ctx, name, component, &owned)
    }

    /// Compare the `assets` and `data` trees of two packs
    pub fn check_conflicts(&self, from: &str, to: &str, exclude: &[String]) -> Result<ConflictReport> {
        let source = self.ctx.asset_pack(from)?;
        let target = self.ctx.asset_pack(to)?;
        let excludes = ExcludeSet::new(exclude)?;
        let mut report = ConflictReport::default();
        for tree in ["assets", "data"] {
            let part = conflict::check_conflicts(&source.root.join(tree), &target.root.join(tree), &excludes);
            report.entries.extend(part.entries);
            report.warnings.extend(part.warnings);
        }
        Ok(report)
    }

    /// Plan without touching the tree
    pub fn plan(&self, request: &Request, options: &RefactorOptions) -> Result<Plan> {
        planner::plan(&self.ctx, request, options, &self.rules)
    }

    /// Plan and (unless `dry_run`) apply a request.
    ///
    /// Conflicts come back as an unsuccessful result carrying every reason;
    /// a missing component or bad input is an `Err`.
    pub fn run(&self, request: &Request, options: &RefactorOptions) -> Result<ExecutionResult> {
        tracing::info!("{}", request);
        match self.plan(request, options) {
            Ok(plan) => self.apply(request, &plan, options),
            Err(RefactorError::Conflict { reasons }) => {
                tracing::warn!("{} blocked by {} conflict(s)", request, reasons.len());
                Ok(ExecutionResult::blocked(0, reasons))
            }
            Err(e) => Err(e),
        }
    }

    /// Preview or apply a plan already built for `request`: back up,
    /// execute, then check the request's post-conditions.
    pub fn apply(&self, request: &Request, plan: &Plan, options: &RefactorOptions) -> Result<ExecutionResult> {
        let executor = TransactionalExecutor::new();
        if options.dry_run {
            return Ok(executor.execute(plan, true));
        }

        let backup = if options.no_backup || !plan.is_destructive() {
            None
        } else {
            backup::snapshot(&self.ctx.root, &request.backup_key(), plan)?
        };

        let mut result = executor.execute(plan, false);
        result.backup_dir = backup.map(|b| b.dir);
        if !result.success {
            return Ok(result);
        }

        if let Some(expectation) = expectation_for(request, options, &self.ctx.namespace) {
            // Re-read the layout; migrations and removals change it
            let ctx = ProjectContext::load(&self.ctx.root)?;
            if let Err(e) = validate(&ctx, &expectation) {
                tracing::error!("{}", e);
                result.errors.push(e.to_string());
                result.success = false;
            }
        }
        Ok(result)
    }

    pub fn rename(
        &self,
        component: ComponentType,
        old: &ComponentName,
        new: &ComponentName,
        options: &RefactorOptions,
    ) -> Result<ExecutionResult> {
        let request = Request::Rename {
            component,
            old: old.clone(),
            new: new.clone(),
        };
        self.run(&request, options)
    }

    pub fn remove(&self, component: ComponentType, name: &ComponentName, options: &RefactorOptions) -> Result<ExecutionResult> {
        let request = Request::Remove {
            component,
            name: name.clone(),
        };
        self.run(&request, options)
    }

    pub fn migrate(&self, from: &str, to: &str, options: &RefactorOptions) -> Result<ExecutionResult> {
        let request = Request::Migrate {
            from: from.to_string(),
            to: to.to_string(),
        };
        self.run(&request, options)
    }

    pub fn sync(&self, from: &str, to: &str, options: &RefactorOptions) -> Result<ExecutionResult> {
        let request = Request::Sync {
            from: from.to_string(),
            to: to.to_string(),
        };
        self.run(&request, options)
    }

    /// Move the Java sources of package `old` to `new`
    pub fn rename_package(&self, old: &str, new: &str, options: &RefactorOptions) -> Result<ExecutionResult> {
        let request = Request::RenamePackage {
            old: old.to_string(),
            new: new.to_string(),
        };
        self.run(&request, options)
    }

    /// Change the mod id and with it the resource namespace
    pub fn rename_mod(&self, new: &str, options: &RefactorOptions) -> Result<ExecutionResult> {
        let request = Request::RenameMod { new: new.to_string() };
        self.run(&request, options)
    }
}

fn expectation_for(request: &Request, options: &RefactorOptions, namespace: &str) -> Option<Expectation> {
    match request {
        Request::Rename { component, old, new } => Some(Expectation::Renamed {
            component: *component,
            old: old.clone(),
            new: new.clone(),
        }),
        Request::Remove { component, name } => Some(Expectation::Removed {
            component: *component,
            name: name.clone(),
            keep_assets: options.keep_assets,
        }),
        Request::Migrate { to, .. } => Some(Expectation::Migrated { version: to.clone() }),
        Request::Sync { .. } => None,
        Request::RenamePackage { old, new } => Some(Expectation::PackageRenamed {
            old: old.clone(),
            new: new.clone(),
        }),
        Request::RenameMod { new } => Some(Expectation::ModRenamed {
            old: namespace.to_string(),
            new: new.clone(),
        }),
    }
}
