//! Project configuration and layout
//!
//! Defines the root `config.yml` format and the [`ProjectContext`] every
//! engine operation works against.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RefactorError, Result};
use crate::naming::default_package;
use crate::walk::subdirs;

/// Name of the project metadata file at the root (and in each version dir).
pub const CONFIG_FILE: &str = "config.yml";

/// Platform variant holding the shared source tree.
pub const COMMON_VARIANT: &str = "common";

/// The root project configuration file (config.yml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(rename = "mod")]
    pub mod_info: ModInfo,

    /// Supported game versions ("1.20.1", ...)
    #[serde(default, deserialize_with = "string_list")]
    pub minecraft_versions: Vec<String>,

    /// Mod loaders a registration class is generated for
    #[serde(default = "default_loaders", deserialize_with = "string_list")]
    pub loaders: Vec<String>,
}

/// The `mod:` block of config.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Java package; derived from the id when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

fn default_loaders() -> Vec<String> {
    vec!["fabric".to_string(), "forge".to_string(), "neoforge".to_string()]
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Accept a list, a single scalar, or an empty key; scalars are stringified
/// so unquoted versions and quoted versions read the same.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    let items = match value {
        None | Some(serde_yaml::Value::Null) => Vec::new(),
        Some(serde_yaml::Value::Sequence(seq)) => seq.into_iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other).into_iter().collect(),
    };
    Ok(items)
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl ProjectConfig {
    /// Load config.yml from a project root
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Err(RefactorError::ConfigNotFound(path));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Package name, `com.<id>` with separators stripped when not configured
    pub fn package_name(&self) -> String {
        match &self.mod_info.package {
            Some(pkg) if !pkg.trim().is_empty() => pkg.trim().to_string(),
            _ => default_package(&self.mod_info.id),
        }
    }
}

/// A named asset pack rooted at a directory holding `assets/` and/or `data/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPack {
    pub name: String,
    pub root: PathBuf,
}

impl AssetPack {
    pub fn assets_dir(&self, namespace: &str) -> PathBuf {
        self.root.join("assets").join(namespace)
    }

    pub fn data_dir(&self, namespace: &str) -> PathBuf {
        self.root.join("data").join(namespace)
    }
}

/// Everything an engine operation needs to know about the project.
///
/// Built fresh for each command from disk; never cached.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub namespace: String,
    pub package_name: String,
    /// `common` followed by each loader
    pub variants: Vec<String>,
    pub asset_packs: Vec<AssetPack>,
    pub minecraft_versions: Vec<String>,
}

impl ProjectContext {
    /// Read config.yml under `root` and discover asset packs on disk
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config = ProjectConfig::load(&root)?;
        Ok(Self::from_config(root, &config))
    }

    pub fn from_config(root: PathBuf, config: &ProjectConfig) -> Self {
        let mut variants = vec![COMMON_VARIANT.to_string()];
        let loaders = if config.loaders.is_empty() {
            default_loaders()
        } else {
            config.loaders.clone()
        };
        variants.extend(loaders.into_iter().map(|l| l.to_ascii_lowercase()));

        let asset_packs = discover_asset_packs(&root);
        Self {
            namespace: config.mod_info.id.clone(),
            package_name: config.package_name(),
            variants,
            asset_packs,
            minecraft_versions: config.minecraft_versions.clone(),
            root,
        }
    }

    /// `com/testmod` for package `com.testmod`
    pub fn package_path(&self) -> String {
        self.package_name.replace('.', "/")
    }

    /// Loader variants, i.e. every variant except `common`
    pub fn loaders(&self) -> impl Iterator<Item = &str> {
        self.variants
            .iter()
            .map(String::as_str)
            .filter(|v| *v != COMMON_VARIANT)
    }

    /// `shared/<variant>`
    pub fn module_dir(&self, variant: &str) -> PathBuf {
        self.root.join("shared").join(variant)
    }

    /// `shared/<variant>/src/main/java/<package path>`
    pub fn source_root(&self, variant: &str) -> PathBuf {
        self.module_dir(variant)
            .join("src/main/java")
            .join(self.package_path())
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// `versions/1_20_1` for `1.20.1`
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.versions_dir().join(version_dir_name(version))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Resolve a pack by name, accepting `1.20.1` for the `1_20_1` pack
    pub fn asset_pack(&self, name: &str) -> Result<&AssetPack> {
        let dir_name = version_dir_name(name);
        self.asset_packs
            .iter()
            .find(|p| p.name == name || p.name == dir_name)
            .ok_or_else(|| RefactorError::UnknownAssetPack(name.to_string()))
    }

    /// Layout directories that must survive even when emptied
    pub fn protected_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.root.clone(),
            self.root.join("shared"),
            self.versions_dir(),
            self.versions_dir().join("shared"),
        ];
        for variant in &self.variants {
            dirs.push(self.module_dir(variant));
            dirs.push(self.source_root(variant));
        }
        for pack in &self.asset_packs {
            dirs.push(pack.root.clone());
            dirs.push(pack.root.join("assets"));
            dirs.push(pack.root.join("data"));
            dirs.push(pack.assets_dir(&self.namespace));
            dirs.push(pack.data_dir(&self.namespace));
        }
        dirs
    }
}

/// Version strings map to directory names with `.` replaced by `_`
pub fn version_dir_name(version: &str) -> String {
    version.replace('.', "_")
}

fn discover_asset_packs(root: &Path) -> Vec<AssetPack> {
    let versions = root.join("versions");
    let mut packs = Vec::new();

    for dir in subdirs(&versions.join("shared")) {
        if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
            packs.push(AssetPack {
                name: name.to_string(),
                root: dir.clone(),
            });
        }
    }

    for dir in subdirs(&versions) {
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name == "shared" {
            continue;
        }
        if dir.join("assets").is_dir() || dir.join("data").is_dir() {
            packs.push(AssetPack {
                name: name.to_string(),
                root: dir.clone(),
            });
        }
    }
    packs
}
