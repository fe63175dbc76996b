//! Post-execution checks
//!
//! Run after a transform has been applied to confirm the tree is in the
//! state the transform promised.

use std::fs;

use crate::error::{RefactorError, Result};
use crate::locator::locate;
use crate::naming::{ComponentName, ComponentType};
use crate::path_utils::relative_display;
use crate::scanner::Identifiers;
use crate::types::{ArtifactKind, ProjectContext, TextPattern};
use crate::walk::{files_under, java_source_roots};

/// What a completed transform should have left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Renamed {
        component: ComponentType,
        old: ComponentName,
        new: ComponentName,
    },
    Removed {
        component: ComponentType,
        name: ComponentName,
        keep_assets: bool,
    },
    Migrated {
        version: String,
    },
    PackageRenamed {
        old: String,
        new: String,
    },
    ModRenamed {
        old: String,
        new: String,
    },
}

pub fn validate(ctx: &ProjectContext, expectation: &Expectation) -> Result<()> {
    match expectation {
        Expectation::Renamed { component, old, new } => validate_rename(ctx, *component, old, new),
        Expectation::Removed {
            component,
            name,
            keep_assets,
        } => {
            let left = locate(ctx, name, *component);
            let unexpected: Vec<String> = left
                .iter()
                .filter(|a| !(*keep_assets && a.kind == ArtifactKind::Texture))
                .map(|a| relative_display(&ctx.root, &a.path))
                .collect();
            if unexpected.is_empty() {
                Ok(())
            } else {
                Err(RefactorError::ValidationFailure(format!(
                    "{} '{}' still owns {}",
                    component,
                    name,
                    unexpected.join(", ")
                )))
            }
        }
        Expectation::Migrated { version } => {
            let dir = ctx.version_dir(version);
            if dir.is_dir() {
                Ok(())
            } else {
                Err(RefactorError::ValidationFailure(format!(
                    "version directory {} was not created",
                    relative_display(&ctx.root, &dir)
                )))
            }
        }
        Expectation::PackageRenamed { old, new } => validate_package_rename(ctx, old, new),
        Expectation::ModRenamed { old, new } => {
            if ctx.namespace != *new {
                return Err(RefactorError::ValidationFailure(format!(
                    "config.yml still has mod id '{}'",
                    ctx.namespace
                )));
            }
            for pack in &ctx.asset_packs {
                for dir in [pack.assets_dir(old), pack.data_dir(old)] {
                    if !files_under(&dir).files.is_empty() {
                        return Err(RefactorError::ValidationFailure(format!(
                            "{} still holds files",
                            relative_display(&ctx.root, &dir)
                        )));
                    }
                }
            }
            Ok(())
        }
    }
}

/// No source root keeps files in the old package and config names the new one
fn validate_package_rename(ctx: &ProjectContext, old: &str, new: &str) -> Result<()> {
    if ctx.package_name != new {
        return Err(RefactorError::ValidationFailure(format!(
            "config.yml resolves package '{}', expected '{}'",
            ctx.package_name, new
        )));
    }
    let old_rel = old.replace('.', "/");
    for root in java_source_roots(&ctx.root) {
        let dir = root.join(&old_rel);
        if !files_under(&dir).files.is_empty() {
            return Err(RefactorError::ValidationFailure(format!(
                "{} still holds sources",
                relative_display(&ctx.root, &dir)
            )));
        }
    }
    Ok(())
}

/// Old name owns nothing, new name owns something, and no text file in the
/// project still mentions the old class or namespaced id
fn validate_rename(ctx: &ProjectContext, component: ComponentType, old: &ComponentName, new: &ComponentName) -> Result<()> {
    let leftover = locate(ctx, old, component);
    if !leftover.is_empty() {
        return Err(RefactorError::ValidationFailure(format!(
            "{} file(s) still named after '{}', e.g. {}",
            leftover.len(),
            old,
            relative_display(&ctx.root, &leftover[0].path)
        )));
    }
    if locate(ctx, new, component).is_empty() {
        return Err(RefactorError::ValidationFailure(format!(
            "{} '{}' owns no files after rename",
            component, new
        )));
    }

    let ids = Identifiers::from_ctx(ctx, old, component);
    let mut patterns = vec![TextPattern::Identifier(ids.namespaced_id.clone())];
    if let Some(class) = &ids.class_name {
        patterns.push(TextPattern::Identifier(class.clone()));
    }

    for file in files_under(&ctx.root).files {
        let Ok(text) = fs::read_to_string(&file) else {
            continue;
        };
        if let Some(pattern) = patterns.iter().find(|p| p.is_match(&text)) {
            return Err(RefactorError::ValidationFailure(format!(
                "{} still references '{}'",
                relative_display(&ctx.root, &file),
                pattern.text()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, COMMON, PACK};

    fn name(s: &str) -> ComponentName {
        ComponentName::parse(s).unwrap()
    }

    #[test]
    fn test_rename_validation() {
        let fx = Fixture::with_ruby_gem();
        let expectation = Expectation::Renamed {
            component: ComponentType::Item,
            old: name("topaz_shard"),
            new: name("opal_shard"),
        };
        let err = validate(&fx.ctx(), &expectation).unwrap_err();
        assert!(err.to_string().contains("still named after 'topaz_shard'"));

        fs::rename(
            fx.path(&format!("{COMMON}/items/TopazShard.java")),
            fx.path(&format!("{COMMON}/items/OpalShard.java")),
        )
        .unwrap();
        fs::rename(
            fx.path(&format!("{PACK}/assets/testmod/models/item/topaz_shard.json")),
            fx.path(&format!("{PACK}/assets/testmod/models/item/opal_shard.json")),
        )
        .unwrap();
        // Files moved but the contents still mention the old id
        let err = validate(&fx.ctx(), &expectation).unwrap_err();
        assert!(err.to_string().contains("still references"));

        fx.write(&format!("{COMMON}/items/OpalShard.java"), "public class OpalShard extends Item {}\n");
        fx.write(
            &format!("{PACK}/assets/testmod/models/item/opal_shard.json"),
            "{\"textures\": {\"layer0\": \"testmod:item/opal_shard\"}}",
        );
        validate(&fx.ctx(), &expectation).unwrap();
    }

    #[test]
    fn test_removed_validation_respects_keep_assets() {
        let fx = Fixture::with_ruby_gem();
        for rel in [
            format!("{COMMON}/items/RubyGem.java"),
            format!("{PACK}/assets/testmod/models/item/ruby_gem.json"),
            "shared/fabric/src/main/java/com/testmod/platform/fabric/RubyGemFabric.java".to_string(),
            "shared/forge/src/main/java/com/testmod/platform/forge/RubyGemForge.java".to_string(),
            "shared/neoforge/src/main/java/com/testmod/platform/neoforge/RubyGemNeoForge.java".to_string(),
        ] {
            fs::remove_file(fx.path(&rel)).unwrap();
        }

        let mut expectation = Expectation::Removed {
            component: ComponentType::Item,
            name: name("ruby_gem"),
            keep_assets: true,
        };
        validate(&fx.ctx(), &expectation).unwrap();

        if let Expectation::Removed { keep_assets, .. } = &mut expectation {
            *keep_assets = false;
        }
        let err = validate(&fx.ctx(), &expectation).unwrap_err();
        assert!(err.to_string().contains("ruby_gem.png"));
    }

    #[test]
    fn test_migrated_validation() {
        let fx = Fixture::new();
        let expectation = Expectation::Migrated {
            version: "1.21.1".to_string(),
        };
        assert!(validate(&fx.ctx(), &expectation).is_err());
        fx.write("versions/1_21_1/config.yml", "minecraft_version: \"1.21.1\"\n");
        validate(&fx.ctx(), &expectation).unwrap();
    }

    #[test]
    fn test_package_and_mod_rename_validation() {
        let fx = Fixture::with_ruby_gem();
        let package = Expectation::PackageRenamed {
            old: "com.testmod".to_string(),
            new: "dev.gems".to_string(),
        };
        let err = validate(&fx.ctx(), &package).unwrap_err();
        assert!(err.to_string().contains("expected 'dev.gems'"));

        let mut ctx = fx.ctx();
        ctx.package_name = "dev.gems".to_string();
        let err = validate(&ctx, &package).unwrap_err();
        assert!(err.to_string().contains("still holds sources"));

        let module = Expectation::ModRenamed {
            old: "testmod".to_string(),
            new: "gemcraft".to_string(),
        };
        assert!(validate(&fx.ctx(), &module).is_err());
        ctx.namespace = "gemcraft".to_string();
        let err = validate(&ctx, &module).unwrap_err();
        assert!(err.to_string().contains("assets/testmod still holds files"));
    }
}
