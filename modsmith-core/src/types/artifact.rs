//! Artifact classification

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// What role a file plays in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Code,
    Model,
    Texture,
    Blockstate,
    Recipe,
    LootTable,
    Lang,
    Tag,
    Advancement,
    Config,
    Other,
}

impl ArtifactKind {
    /// Classify by extension first, then by the nearest well-known directory.
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "java" | "kt" | "kts" | "groovy" => return ArtifactKind::Code,
            "png" | "jpg" | "jpeg" | "gif" | "mcmeta" => return ArtifactKind::Texture,
            "yml" | "yaml" | "toml" | "properties" | "cfg" => return ArtifactKind::Config,
            "json" => {}
            _ => return ArtifactKind::Other,
        }

        for component in path.components().rev().skip(1) {
            let Some(dir) = component.as_os_str().to_str() else {
                continue;
            };
            let kind = match dir {
                "models" => ArtifactKind::Model,
                "textures" => ArtifactKind::Texture,
                "blockstates" => ArtifactKind::Blockstate,
                "recipe" | "recipes" => ArtifactKind::Recipe,
                "loot_table" | "loot_tables" => ArtifactKind::LootTable,
                "lang" => ArtifactKind::Lang,
                "tags" => ArtifactKind::Tag,
                "advancement" | "advancements" => ArtifactKind::Advancement,
                _ => continue,
            };
            return kind;
        }
        ArtifactKind::Other
    }

    /// Binary assets are never scanned or edited in place
    pub fn is_binary_asset(self) -> bool {
        matches!(self, ArtifactKind::Texture)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Code => "code",
            ArtifactKind::Model => "model",
            ArtifactKind::Texture => "texture",
            ArtifactKind::Blockstate => "blockstate",
            ArtifactKind::Recipe => "recipe",
            ArtifactKind::LootTable => "loot_table",
            ArtifactKind::Lang => "lang",
            ArtifactKind::Tag => "tag",
            ArtifactKind::Advancement => "advancement",
            ArtifactKind::Config => "config",
            ArtifactKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// A file on disk plus its classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArtifactRef {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl ArtifactRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = ArtifactKind::classify(&path);
        Self { path, kind }
    }

    /// `testmod:gems/shiny` for `data/testmod/tags/item/gems/shiny.json`.
    /// The id is the path below the tag registry dir, so nested tags keep
    /// their directories.
    pub fn tag_id(&self) -> Option<String> {
        if self.kind != ArtifactKind::Tag {
            return None;
        }
        let parts: Vec<&str> = self.path.iter().filter_map(|c| c.to_str()).collect();
        let tags = parts.iter().rposition(|p| *p == "tags")?;
        let namespace = parts.get(tags.checked_sub(1)?)?;
        let rest = parts.get(tags + 2..).filter(|r| !r.is_empty())?;
        let joined = rest.join("/");
        let id = joined.strip_suffix(".json").unwrap_or(&joined);
        Some(format!("{}:{}", namespace, id))
    }
}
