//! End-to-end refactoring scenarios against scratch projects on disk

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use modsmith_core::{
    locate, ComponentName, ComponentType, Engine, Operation, RefactorOptions, Request,
    TransactionalExecutor,
};
use tempfile::TempDir;

const CONFIG: &str = "mod:
  id: testmod
  name: Test Mod
  version: 1.0.0
minecraft_versions:
  - 1.20.1
loaders:
  - fabric
  - forge
  - neoforge
";

const COMMON: &str = "shared/common/src/main/java/com/testmod";
const V1: &str = "versions/shared/v1";
const V2: &str = "versions/shared/v2";

struct Project {
    dir: TempDir,
}

impl Project {
    /// Just config.yml
    fn bare() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write("config.yml", CONFIG);
        project
    }

    fn new() -> Self {
        let project = Self::bare();
        project.write(
            &format!("{COMMON}/items/RubyGem.java"),
            "package com.testmod.items;\n\npublic class RubyGem extends Item {\n    public static final String ID = \"ruby_gem\";\n}\n",
        );
        for (loader, suffix) in [("fabric", "Fabric"), ("forge", "Forge"), ("neoforge", "NeoForge")] {
            project.write(
                &format!("shared/{loader}/src/main/java/com/testmod/platform/{loader}/RubyGem{suffix}.java"),
                &format!(
                    "package com.testmod.platform.{loader};\n\nimport com.testmod.items.RubyGem;\n\npublic class RubyGem{suffix} {{\n    static Item ITEM = new RubyGem();\n}}\n"
                ),
            );
        }
        project.write(
            &format!("{V1}/assets/testmod/models/item/ruby_gem.json"),
            "{\n  \"parent\": \"minecraft:item/generated\",\n  \"textures\": {\n    \"layer0\": \"testmod:item/ruby_gem\"\n  }\n}\n",
        );
        project.write_bytes(
            &format!("{V1}/assets/testmod/textures/item/ruby_gem.png"),
            b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR",
        );
        project.write(
            &format!("{V1}/assets/testmod/lang/en_us.json"),
            "{\n  \"item.testmod.ruby_gem\": \"Ruby Gem\",\n  \"item.testmod.topaz_shard\": \"Topaz Shard\"\n}\n",
        );
        project.write(
            &format!("{COMMON}/registry/ModItems.java"),
            "package com.testmod.registry;\n\nimport com.testmod.items.RubyGem;\n\npublic final class ModItems {\n    public static final Item RUBY_GEM = register(\"ruby_gem\", RubyGem::new);\n}\n",
        );
        project.write(
            &format!("{COMMON}/items/TopazShard.java"),
            "package com.testmod.items;\n\npublic class TopazShard extends Item {}\n",
        );
        project.write(
            &format!("{V1}/assets/testmod/models/item/topaz_shard.json"),
            "{\n  \"parent\": \"minecraft:item/generated\"\n}\n",
        );
        project
    }

    /// Adds a recipe and a tag that consume `ruby_gem`
    fn with_data(self) -> Self {
        self.write(
            &format!("{V1}/data/testmod/recipes/ruby_block.json"),
            "{\n  \"type\": \"minecraft:crafting_shaped\",\n  \"key\": {\n    \"#\": { \"item\": \"testmod:ruby_gem\" }\n  },\n  \"result\": { \"item\": \"minecraft:stone\" }\n}\n",
        );
        self.write(
            &format!("{V1}/data/testmod/tags/items/gems.json"),
            "{\n  \"values\": [\"testmod:ruby_gem\"]\n}\n",
        );
        self
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    fn engine(&self) -> Engine {
        Engine::open(self.root()).unwrap()
    }

    fn write(&self, rel: &str, contents: &str) {
        self.write_bytes(rel, contents.as_bytes());
    }

    fn write_bytes(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every path outside `.backups` with its contents (`None` for dirs)
    fn snapshot(&self) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        walkdir::WalkDir::new(self.root())
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".backups")
            .filter_map(|e| e.ok())
            .map(|e| {
                let contents = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
                (e.path().to_path_buf(), contents)
            })
            .collect()
    }
}

fn name(s: &str) -> ComponentName {
    ComponentName::parse(s).unwrap()
}

fn no_backup() -> RefactorOptions {
    RefactorOptions {
        no_backup: true,
        ..Default::default()
    }
}

#[test]
fn rename_updates_every_artifact_and_reference() {
    let project = Project::new().with_data();
    let engine = project.engine();
    let options = RefactorOptions {
        force: true,
        ..Default::default()
    };
    let result = engine
        .rename(ComponentType::Item, &name("ruby_gem"), &name("sapphire_gem"), &options)
        .unwrap();

    assert!(result.success, "{:?}", result.errors);
    assert!(result.operations_executed >= 10);
    assert!(result.backup_dir.is_some());

    let ctx = engine.context();
    assert!(locate(ctx, &name("ruby_gem"), ComponentType::Item).is_empty());
    assert_eq!(locate(ctx, &name("sapphire_gem"), ComponentType::Item).len(), 6);

    let class = project.read(&format!("{COMMON}/items/SapphireGem.java"));
    assert!(class.contains("public class SapphireGem extends Item"));
    assert!(class.contains("ID = \"sapphire_gem\""));

    let fabric = project.read("shared/fabric/src/main/java/com/testmod/platform/fabric/SapphireGemFabric.java");
    assert!(fabric.contains("import com.testmod.items.SapphireGem;"));
    assert!(fabric.contains("public class SapphireGemFabric"));
    assert!(fabric.contains("new SapphireGem()"));

    let registry = project.read(&format!("{COMMON}/registry/ModItems.java"));
    assert!(registry.contains("register(\"sapphire_gem\", SapphireGem::new)"));
    assert!(registry.contains("import com.testmod.items.SapphireGem;"));

    assert!(project
        .read(&format!("{V1}/assets/testmod/models/item/sapphire_gem.json"))
        .contains("testmod:item/sapphire_gem"));
    assert!(project.exists(&format!("{V1}/assets/testmod/textures/item/sapphire_gem.png")));

    let lang = project.read(&format!("{V1}/assets/testmod/lang/en_us.json"));
    assert!(lang.contains("item.testmod.sapphire_gem"));
    assert!(lang.contains("item.testmod.topaz_shard"));

    assert!(project
        .read(&format!("{V1}/data/testmod/recipes/ruby_block.json"))
        .contains("\"testmod:sapphire_gem\""));
    assert!(project
        .read(&format!("{V1}/data/testmod/tags/items/gems.json"))
        .contains("\"testmod:sapphire_gem\""));
}

#[test]
fn dry_run_leaves_tree_untouched() {
    let project = Project::new();
    let before = project.snapshot();

    let options = RefactorOptions {
        dry_run: true,
        ..Default::default()
    };
    let result = project
        .engine()
        .rename(ComponentType::Item, &name("ruby_gem"), &name("sapphire_gem"), &options)
        .unwrap();

    assert!(result.success);
    assert!(result.dry_run);
    assert_eq!(result.operations_executed, 0);
    assert!(result.operations_planned >= 10);
    assert!(result
        .paths_created
        .contains(&project.path(&format!("{COMMON}/items/SapphireGem.java"))));
    assert_eq!(project.snapshot(), before);
    assert!(!project.exists(".backups"));
}

#[test]
fn remove_then_remove_again_is_not_found() {
    let project = Project::new();
    let engine = project.engine();

    let result = engine
        .remove(ComponentType::Item, &name("topaz_shard"), &no_backup())
        .unwrap();
    assert!(result.success, "{:?}", result.errors);
    assert!(!project.exists(&format!("{COMMON}/items/TopazShard.java")));
    assert!(!project.exists(&format!("{V1}/assets/testmod/models/item/topaz_shard.json")));
    // Unrelated files survive
    assert!(project.exists(&format!("{COMMON}/items/RubyGem.java")));

    let err = engine
        .remove(ComponentType::Item, &name("topaz_shard"), &no_backup())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn dependencies_block_removal_unless_forced() {
    let project = Project::new().with_data();
    let engine = project.engine();

    let deps = engine.find_all_dependencies(&name("ruby_gem"), ComponentType::Item);
    let described: Vec<&str> = deps.edges.iter().map(|e| e.description.as_str()).collect();
    assert!(described.iter().any(|d| d.contains("recipes/ruby_block.json")));
    assert!(described.iter().any(|d| d.contains("tags/items/gems.json")));

    let before = project.snapshot();
    let blocked = engine
        .remove(ComponentType::Item, &name("ruby_gem"), &RefactorOptions::default())
        .unwrap();
    assert!(!blocked.success);
    assert!(blocked.warnings.iter().any(|w| w.contains("ruby_block.json")));
    assert!(blocked.warnings.iter().any(|w| w.contains("gems.json")));
    assert_eq!(project.snapshot(), before);

    let recipe_before = project.read(&format!("{V1}/data/testmod/recipes/ruby_block.json"));
    let options = RefactorOptions {
        force: true,
        ..no_backup()
    };
    let result = engine
        .remove(ComponentType::Item, &name("ruby_gem"), &options)
        .unwrap();
    assert!(result.success, "{:?}", result.errors);
    assert!(result.warnings.iter().any(|w| w.contains("will dangle")));
    assert!(!project.exists(&format!("{COMMON}/items/RubyGem.java")));
    assert!(!project.exists("shared/forge/src/main/java/com/testmod/platform/forge"));
    // Referencing files are reported, never edited
    assert_eq!(
        project.read(&format!("{V1}/data/testmod/recipes/ruby_block.json")),
        recipe_before
    );
}

#[test]
fn failed_operation_rolls_back_everything() {
    let project = Project::new();
    let engine = project.engine();
    let request = Request::Rename {
        component: ComponentType::Item,
        old: name("ruby_gem"),
        new: name("sapphire_gem"),
    };
    let mut plan = engine.plan(&request, &RefactorOptions::default()).unwrap();
    let applied = plan.len();
    plan.push(Operation::Delete {
        path: project.path("does/not/exist.json"),
    });

    let before = project.snapshot();
    let result = TransactionalExecutor::new().execute(&plan, false);

    assert!(!result.success);
    assert!(result.rolled_back);
    assert_eq!(result.operations_rolled_back, applied);
    assert_eq!(result.operations_executed, 0);
    assert!(result.errors[0].starts_with(&format!("operation {} failed", applied)));
    assert_eq!(project.snapshot(), before);
}

#[test]
fn sync_merges_lang_without_losing_keys() {
    let project = Project::new();
    project.write(
        &format!("{V2}/assets/testmod/lang/en_us.json"),
        "{\n  \"item.testmod.ruby_gem\": \"Rubis\",\n  \"item.testmod.only_here\": \"Kept\"\n}\n",
    );
    let engine = project.engine();
    let result = engine.sync("v1", "v2", &RefactorOptions::default()).unwrap();
    assert!(result.success, "{:?}", result.errors);

    let merged: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&project.read(&format!("{V2}/assets/testmod/lang/en_us.json"))).unwrap();
    assert_eq!(merged["item.testmod.ruby_gem"], "Rubis");
    assert_eq!(merged["item.testmod.only_here"], "Kept");
    assert_eq!(merged["item.testmod.topaz_shard"], "Topaz Shard");

    assert!(project.exists(&format!("{V2}/assets/testmod/models/item/ruby_gem.json")));
    assert!(project.exists(&format!("{V2}/assets/testmod/textures/item/ruby_gem.png")));

    // A second sync finds nothing left to do
    let again = engine.sync("v1", "v2", &RefactorOptions::default()).unwrap();
    assert!(again.success);
    assert_eq!(again.operations_planned, 0);
}

#[test]
fn migrate_copies_version_and_applies_fixes() {
    let project = Project::new();
    project.write("versions/1_20_1/config.yml", "minecraft_version: \"1.20.1\"\n");
    project.write(
        "versions/1_20_1/forge/src/main/java/com/testmod/Compat.java",
        "class Compat {\n  Object p = Block.Properties.of().strength(1.5f);\n  Object i = Item.Properties.stacksTo(16);\n}\n",
    );

    let options = RefactorOptions {
        auto_fix: true,
        ..Default::default()
    };
    let result = project.engine().migrate("1.20.1", "1.21.1", &options).unwrap();
    assert!(result.success, "{:?}", result.errors);

    assert!(project
        .read("versions/1_21_1/forge/src/main/java/com/testmod/Compat.java")
        .contains(".destroyTime(1.5f)"));
    assert!(project
        .read("versions/1_20_1/forge/src/main/java/com/testmod/Compat.java")
        .contains(".strength(1.5f)"));
    assert!(project
        .read("versions/1_21_1/config.yml")
        .contains("minecraft_version: \"1.21.1\""));
    assert!(project.path("versions/1_21_1/fabric").is_dir());
    assert!(project.read("config.yml").contains("  - 1.21.1"));
    assert!(result.manual_steps.iter().any(|s| s.contains("Item properties changes")));

    let again = project.engine().migrate("1.20.1", "1.21.1", &options).unwrap();
    assert!(!again.success);
}

#[test]
fn rename_into_extended_name_rewrites_once() {
    let project = Project::bare();
    project.write(
        &format!("{COMMON}/items/Ruby.java"),
        "package com.testmod.items;\n\npublic class Ruby extends Item {\n    public static final String ID = \"ruby\";\n    public static final String FULL = \"testmod:ruby\";\n}\n",
    );
    project.write(
        &format!("{V1}/assets/testmod/models/item/ruby.json"),
        "{\n  \"textures\": {\n    \"layer0\": \"testmod:item/ruby\"\n  }\n}\n",
    );
    project.write(
        &format!("{COMMON}/registry/ModItems.java"),
        "package com.testmod.registry;\n\nimport com.testmod.items.Ruby;\n\npublic final class ModItems {\n    public static final Item RUBY = register(\"ruby\", Ruby::new);\n}\n",
    );

    let result = project
        .engine()
        .rename(ComponentType::Item, &name("ruby"), &name("ruby_gem"), &no_backup())
        .unwrap();
    assert!(result.success, "{:?}", result.errors);

    let class = project.read(&format!("{COMMON}/items/RubyGem.java"));
    assert!(class.contains("public class RubyGem extends Item"));
    assert!(class.contains("FULL = \"testmod:ruby_gem\";"));
    assert!(class.contains("ID = \"ruby_gem\";"));
    let model = project.read(&format!("{V1}/assets/testmod/models/item/ruby_gem.json"));
    assert!(model.contains("\"testmod:item/ruby_gem\""));
    let registry = project.read(&format!("{COMMON}/registry/ModItems.java"));
    assert!(registry.contains("import com.testmod.items.RubyGem;"));
    assert!(registry.contains("RubyGem::new"));
    for text in [&class, &model, &registry] {
        assert!(!text.contains("ruby_gem_gem"), "{}", text);
        assert!(!text.contains("RubyGemGem"), "{}", text);
    }
}

#[test]
fn rename_leaves_words_containing_the_old_name_alone() {
    let project = Project::bare();
    project.write(
        &format!("{COMMON}/blocks/Ore.java"),
        "package com.testmod.blocks;\n\nimport net.minecraft.core.BlockPos;\n\n// ignore more before\npublic class Ore extends Block {\n    public static final String ID = \"ore\";\n}\n",
    );
    project.write(
        &format!("{V1}/assets/testmod/blockstates/ore.json"),
        "{\n  \"variants\": {\n    \"\": { \"model\": \"testmod:block/ore\" }\n  }\n}\n",
    );

    let result = project
        .engine()
        .rename(ComponentType::Block, &name("ore"), &name("ruby_ore"), &no_backup())
        .unwrap();
    assert!(result.success, "{:?}", result.errors);

    let class = project.read(&format!("{COMMON}/blocks/RubyOre.java"));
    assert!(class.contains("import net.minecraft.core.BlockPos;"));
    assert!(class.contains("// ignore more before"));
    assert!(class.contains("public class RubyOre extends Block"));
    assert!(class.contains("ID = \"ruby_ore\";"));
    let blockstate = project.read(&format!("{V1}/assets/testmod/blockstates/ruby_ore.json"));
    assert!(blockstate.contains("\"testmod:block/ruby_ore\""));
}
