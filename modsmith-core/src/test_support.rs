//! Scratch project trees for unit tests

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::path_utils::relative_display;
use crate::types::ProjectContext;

pub(crate) const CONFIG: &str = "mod:
  id: testmod
  name: Test Mod
  version: 1.0.0
  package: com.testmod
minecraft_versions:
  - 1.20.1
loaders:
  - fabric
  - forge
  - neoforge
";

pub(crate) const COMMON: &str = "shared/common/src/main/java/com/testmod";
pub(crate) const PACK: &str = "versions/shared/v1";

pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Config plus an empty `v1` asset pack
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), CONFIG).unwrap();
        fs::create_dir_all(dir.path().join(PACK).join("assets/testmod")).unwrap();
        fs::create_dir_all(dir.path().join(PACK).join("data/testmod")).unwrap();
        Self { dir }
    }

    /// `ruby_gem`: common class, three loader registrations, model, texture,
    /// plus a registry class and lang file that refer to it
    pub fn with_ruby_gem() -> Self {
        let fx = Self::new();
        fx.write(
            &format!("{COMMON}/items/RubyGem.java"),
            "package com.testmod.items;\n\npublic class RubyGem extends Item {\n    public static final String ID = \"ruby_gem\";\n\n    public RubyGem(Properties props) {\n        super(props);\n    }\n}\n",
        );
        for (loader, suffix) in [("fabric", "Fabric"), ("forge", "Forge"), ("neoforge", "NeoForge")] {
            fx.write(
                &format!("shared/{loader}/src/main/java/com/testmod/platform/{loader}/RubyGem{suffix}.java"),
                &format!(
                    "package com.testmod.platform.{loader};\n\nimport com.testmod.items.RubyGem;\n\npublic class RubyGem{suffix} {{\n    public static void register() {{\n        Registry.register(Registries.ITEM, id(RubyGem.ID), new RubyGem(new Item.Properties()));\n    }}\n}}\n"
                ),
            );
        }
        fx.write(
            &format!("{PACK}/assets/testmod/models/item/ruby_gem.json"),
            "{\n  \"parent\": \"minecraft:item/generated\",\n  \"textures\": {\n    \"layer0\": \"testmod:item/ruby_gem\"\n  }\n}\n",
        );
        fx.write_bytes(
            &format!("{PACK}/assets/testmod/textures/item/ruby_gem.png"),
            b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR",
        );
        fx.write(
            &format!("{PACK}/assets/testmod/lang/en_us.json"),
            "{\n  \"item.testmod.ruby_gem\": \"Ruby Gem\",\n  \"item.testmod.topaz_shard\": \"Topaz Shard\"\n}\n",
        );
        fx.write(
            &format!("{COMMON}/registry/ModItems.java"),
            "package com.testmod.registry;\n\nimport com.testmod.items.RubyGem;\n\npublic final class ModItems {\n    public static final Item RUBY_GEM = register(\"ruby_gem\", RubyGem::new);\n}\n",
        );
        fx.write(
            &format!("{COMMON}/items/TopazShard.java"),
            "package com.testmod.items;\n\npublic class TopazShard extends Item {\n    public static final String ID = \"topaz_shard\";\n}\n",
        );
        fx.write(
            &format!("{PACK}/assets/testmod/models/item/topaz_shard.json"),
            "{\n  \"parent\": \"minecraft:item/generated\",\n  \"textures\": {\n    \"layer0\": \"testmod:item/topaz_shard\"\n  }\n}\n",
        );
        fx
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn ctx(&self) -> ProjectContext {
        ProjectContext::load(self.root()).unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        self.write_bytes(rel, contents.as_bytes());
    }

    pub fn write_bytes(&self, rel: &str, contents: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn rel(&self, path: &Path) -> String {
        relative_display(self.root(), path)
    }

    /// Every file and directory (relative path -> contents, `None` for dirs)
    pub fn snapshot(&self) -> BTreeMap<String, Option<Vec<u8>>> {
        walkdir::WalkDir::new(self.root())
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| {
                let contents = if e.file_type().is_file() {
                    Some(fs::read(e.path()).unwrap())
                } else {
                    None
                };
                (self.rel(e.path()), contents)
            })
            .collect()
    }
}
