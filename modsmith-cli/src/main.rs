//! Modsmith CLI
//!
//! Command-line interface for refactoring multi-loader Minecraft mod projects.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use modsmith_core::{
    render_plan, render_result, ApiChangeRules, Backup, ComponentName, ComponentType, Engine,
    ExecutionResult, RefactorError, RefactorOptions, Request,
};

#[derive(Parser)]
#[command(name = "modsmith")]
#[command(about = "Cross-file refactoring for multi-loader Minecraft mods")]
#[command(version)]
struct Cli {
    /// Project root containing config.yml (default: current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that changes the tree
#[derive(Args, Debug, Clone)]
struct ChangeFlags {
    /// Show what would change without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Proceed past conflicts and blocking dependencies
    #[arg(short, long)]
    force: bool,

    /// Skip the backup taken before destructive changes
    #[arg(long)]
    no_backup: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files a component owns
    Locate {
        /// Component type (item, block, entity, recipe, tag, enchantment, biome)
        component: ComponentType,
        /// Component id, e.g. ruby_gem
        name: String,
    },

    /// Find every reference to a component outside its own files
    Refs {
        component: ComponentType,
        name: String,
    },

    /// Show the files that would break if a component were removed
    Deps {
        component: ComponentType,
        name: String,
    },

    /// Compare two asset packs file by file
    Conflicts {
        /// Source pack (e.g. v1 or 1.20.1)
        from: String,
        /// Target pack
        to: String,
        /// Glob patterns to skip
        #[arg(short, long)]
        exclude: Vec<String>,
    },

    /// Rename a component everywhere
    Rename {
        component: ComponentType,
        old: String,
        new: String,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Remove a component and its files
    Remove {
        component: ComponentType,
        name: String,
        /// Leave texture files in place
        #[arg(long)]
        keep_assets: bool,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Copy a version directory to a new game version
    Migrate {
        /// Existing version, e.g. 1.20.1
        from: String,
        /// New version, e.g. 1.21.1
        to: String,
        /// Apply auto-fixable API changes to copied sources
        #[arg(long)]
        auto_fix: bool,
        /// Extra API change rules (TOML)
        #[arg(long)]
        rules: Option<PathBuf>,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Bring one asset pack up to date with another
    Sync {
        from: String,
        to: String,
        /// Also copy target-only files and lang keys back to the source
        #[arg(long)]
        bidirectional: bool,
        /// Glob patterns to skip
        #[arg(short, long)]
        exclude: Vec<String>,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Move the Java sources of one package to another
    RenamePackage {
        /// Current package, e.g. com.example.mymod
        old: String,
        /// New package
        new: String,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Change the mod id and move its resource namespace
    RenameMod {
        /// New mod id
        new: String,
        #[command(flatten)]
        flags: ChangeFlags,
    },

    /// Restore files from a backup directory
    Restore {
        /// Backup directory under .backups/
        backup: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("modsmith=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let json = cli.json;
    tracing::debug!("Project root: {}", root.display());

    let success = match cli.command {
        Commands::Locate { component, name } => cmd_locate(&root, component, &name, json)?,
        Commands::Refs { component, name } => cmd_refs(&root, component, &name, json)?,
        Commands::Deps { component, name } => cmd_deps(&root, component, &name, json)?,
        Commands::Conflicts { from, to, exclude } => cmd_conflicts(&root, &from, &to, &exclude, json)?,
        Commands::Rename {
            component,
            old,
            new,
            flags,
        } => {
            let request = Request::Rename {
                component,
                old: ComponentName::parse(&old)?,
                new: ComponentName::parse(&new)?,
            };
            let engine = Engine::open(&root)?;
            run_request(&engine, &request, options(&flags), json)?
        }
        Commands::Remove {
            component,
            name,
            keep_assets,
            flags,
        } => {
            let request = Request::Remove {
                component,
                name: ComponentName::parse(&name)?,
            };
            let options = RefactorOptions {
                keep_assets,
                ..options(&flags)
            };
            let engine = Engine::open(&root)?;
            run_request(&engine, &request, options, json)?
        }
        Commands::Migrate {
            from,
            to,
            auto_fix,
            rules,
            flags,
        } => {
            let mut engine = Engine::open(&root)?;
            if let Some(path) = rules {
                let mut combined = engine.rules().clone();
                combined.extend(ApiChangeRules::from_config_file(&path)?);
                engine = engine.with_rules(combined);
            }
            let options = RefactorOptions {
                auto_fix,
                ..options(&flags)
            };
            run_request(&engine, &Request::Migrate { from, to }, options, json)?
        }
        Commands::Sync {
            from,
            to,
            bidirectional,
            exclude,
            flags,
        } => {
            let options = RefactorOptions {
                bidirectional,
                exclude,
                ..options(&flags)
            };
            let engine = Engine::open(&root)?;
            run_request(&engine, &Request::Sync { from, to }, options, json)?
        }
        Commands::RenamePackage { old, new, flags } => {
            let engine = Engine::open(&root)?;
            run_request(&engine, &Request::RenamePackage { old, new }, options(&flags), json)?
        }
        Commands::RenameMod { new, flags } => {
            let engine = Engine::open(&root)?;
            run_request(&engine, &Request::RenameMod { new }, options(&flags), json)?
        }
        Commands::Restore { backup } => cmd_restore(&root, &backup)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn options(flags: &ChangeFlags) -> RefactorOptions {
    RefactorOptions {
        dry_run: flags.dry_run,
        force: flags.force,
        no_backup: flags.no_backup,
        ..Default::default()
    }
}

/// Plan, preview or apply, and report. Returns whether the request succeeded.
fn run_request(engine: &Engine, request: &Request, options: RefactorOptions, json: bool) -> Result<bool> {
    let root = engine.context().root.clone();

    let result = match engine.plan(request, &options) {
        Ok(plan) => {
            if options.dry_run && !json {
                print!("{}", render_plan(&plan, &root));
            }
            engine.apply(request, &plan, &options)?
        }
        Err(RefactorError::Conflict { reasons }) => {
            tracing::warn!("{} blocked by {} conflict(s)", request, reasons.len());
            ExecutionResult::blocked(0, reasons)
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(&result, &root));
    }
    Ok(result.success)
}

fn cmd_locate(root: &Path, component: ComponentType, name: &str, json: bool) -> Result<bool> {
    let engine = Engine::open(root)?;
    let name = ComponentName::parse(name)?;
    let artifacts = engine.locate(&name, component);

    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
    } else if artifacts.is_empty() {
        println!("{} '{}' owns no files", component, name);
    } else {
        println!("{} '{}' owns {} file(s):", component, name, artifacts.len());
        for artifact in &artifacts {
            println!("  [{}] {}", artifact.kind, display(root, &artifact.path));
        }
    }
    Ok(true)
}

fn cmd_refs(root: &Path, component: ComponentType, name: &str, json: bool) -> Result<bool> {
    let engine = Engine::open(root)?;
    let name = ComponentName::parse(name)?;
    let report = engine.find_references(&name, component);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(true);
    }
    println!(
        "{} reference(s) to '{}' in {} file(s)",
        report.references.len(),
        name,
        report.files().len()
    );
    for reference in &report.references {
        println!(
            "  {}:{} [{}] {}",
            display(root, &reference.artifact.path),
            reference.line,
            reference.kind,
            reference.matched
        );
    }
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    Ok(true)
}

fn cmd_deps(root: &Path, component: ComponentType, name: &str, json: bool) -> Result<bool> {
    let engine = Engine::open(root)?;
    let name = ComponentName::parse(name)?;
    let report = engine.find_all_dependencies(&name, component);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("Nothing depends on {} '{}'; it can be removed safely", component, name);
    } else {
        println!("{} file(s) depend on {} '{}':", report.edges.len(), component, name);
        for edge in &report.edges {
            println!("  - {}", edge.description);
        }
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(true)
}

fn cmd_conflicts(root: &Path, from: &str, to: &str, exclude: &[String], json: bool) -> Result<bool> {
    let engine = Engine::open(root)?;
    let report = engine.check_conflicts(from, to, exclude)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(true);
    }
    for entry in &report.entries {
        println!("  {:<20} {}", entry.classification.to_string(), entry.relative);
    }
    println!("{} file(s) compared", report.entries.len());
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }
    Ok(true)
}

fn cmd_restore(root: &Path, backup: &Path) -> Result<bool> {
    let dir = if backup.is_absolute() {
        backup.to_path_buf()
    } else {
        root.join(backup)
    };
    let backup = Backup::load(&dir).with_context(|| format!("Failed to read backup at {}", dir.display()))?;
    let restored = backup.restore(root)?;
    println!(
        "Restored {} file(s) from {} ({})",
        restored, backup.manifest.subject, backup.manifest.created_at
    );
    Ok(true)
}

fn display(root: &Path, path: &Path) -> String {
    modsmith_core::path_utils::relative_display(root, path)
}
