//! Artifact discovery
//!
//! Finds every file a component owns: its common class, one registration
//! class per loader, and the resource files named after it in every asset
//! pack. Read-only; an unknown component simply owns nothing.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::naming::{loader_class_name, ComponentName, ComponentType};
use crate::types::{ArtifactRef, ProjectContext, COMMON_VARIANT};
use crate::walk::files_under;

/// Suffixes of block model/texture variants that belong to the block
const BLOCK_VARIANT_SUFFIXES: &[&str] = &[
    "_top", "_bottom", "_double", "_side", "_post", "_pressed", "_down", "_open", "_inner",
    "_outer", "_front", "_end",
];

const MAX_GROWTH_STAGE: u32 = 7;

const CODE_EXTENSIONS: &[&str] = &["java", "kt"];

/// Enumerate owned artifacts, sorted by path
pub fn locate(ctx: &ProjectContext, name: &ComponentName, component: ComponentType) -> Vec<ArtifactRef> {
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();

    if component.has_code() {
        locate_code(ctx, name, component, &mut found);
    }
    for pack in &ctx.asset_packs {
        let assets = pack.assets_dir(&ctx.namespace);
        let data = pack.data_dir(&ctx.namespace);
        for (dir, recursive) in resource_dirs(&assets, &data, component) {
            collect_resources(&dir, recursive, name.as_str(), component, &mut found);
        }
    }

    tracing::debug!("Located {} artifact(s) for {} '{}'", found.len(), component, name);
    found.into_iter().map(ArtifactRef::new).collect()
}

/// Class names (without extension) a component's code files may carry in `variant`
pub fn owned_class_names(ctx: &ProjectContext, name: &ComponentName, component: ComponentType, variant: &str) -> Vec<String> {
    let class = name.class_name();
    if variant == COMMON_VARIANT {
        let mut names = vec![class.to_string()];
        if component == ComponentType::Entity {
            names.push(format!("{}Renderer", class));
            names.push(format!("{}Model", class));
        }
        names
    } else if ctx.variants.iter().any(|v| v == variant) {
        vec![format!("{}{}", class, loader_class_name(variant))]
    } else {
        Vec::new()
    }
}

fn locate_code(ctx: &ProjectContext, name: &ComponentName, component: ComponentType, found: &mut BTreeSet<PathBuf>) {
    let Some(code_dir) = component.code_dir() else {
        return;
    };
    for variant in &ctx.variants {
        let search_root = if variant == COMMON_VARIANT {
            ctx.source_root(variant).join(code_dir)
        } else {
            ctx.source_root(variant).join("platform")
        };
        let wanted = owned_class_names(ctx, name, component, variant);
        for file in files_under(&search_root).files {
            let is_code = file
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| CODE_EXTENSIONS.contains(&e));
            let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if is_code && wanted.iter().any(|w| w == stem) {
                found.insert(file);
            }
        }
    }
}

/// Candidate directories for a component type, with whether to descend
fn resource_dirs(assets: &Path, data: &Path, component: ComponentType) -> Vec<(PathBuf, bool)> {
    let recipes = [(data.join("recipe"), false), (data.join("recipes"), false)];
    match component {
        ComponentType::Item => {
            let mut dirs = vec![
                (assets.join("models/item"), false),
                (assets.join("textures/item"), false),
            ];
            dirs.extend(recipes);
            dirs
        }
        ComponentType::Block => {
            let mut dirs = vec![
                (assets.join("blockstates"), false),
                (assets.join("models/block"), false),
                (assets.join("models/item"), false),
                (assets.join("textures/block"), false),
                (data.join("loot_table/blocks"), false),
                (data.join("loot_tables/blocks"), false),
            ];
            dirs.extend(recipes);
            dirs
        }
        ComponentType::Entity => vec![
            (assets.join("textures/entity"), true),
            (assets.join("models/entity"), false),
        ],
        ComponentType::Recipe => recipes.to_vec(),
        ComponentType::Tag => vec![(data.join("tags"), true)],
        ComponentType::Enchantment => vec![
            (data.join("enchantment"), false),
            (data.join("enchantments"), false),
        ],
        ComponentType::Biome => vec![(data.join("worldgen/biome"), false)],
    }
}

fn collect_resources(dir: &Path, recursive: bool, name: &str, component: ComponentType, found: &mut BTreeSet<PathBuf>) {
    let files = if recursive {
        files_under(dir).files
    } else {
        list_files(dir)
    };
    for file in files {
        let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // `ruby_gem.png.mcmeta` belongs to `ruby_gem`
        let base = file_name.split('.').next().unwrap_or_default();
        if base == name || (component == ComponentType::Block && is_block_variant(base, name)) {
            found.insert(file);
        }
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect()
}

/// `<name>_top`, `<name>_stage3`, ...
pub fn is_block_variant(base: &str, name: &str) -> bool {
    base.strip_prefix(name).is_some_and(is_variant_suffix)
}

/// `_top`, `_stage3`, ...: the tail a block variant adds to the block's name
pub fn is_variant_suffix(suffix: &str) -> bool {
    if BLOCK_VARIANT_SUFFIXES.contains(&suffix) {
        return true;
    }
    suffix
        .strip_prefix("_stage")
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse::<u32>().ok())
        .is_some_and(|n| n <= MAX_GROWTH_STAGE)
}
