//! Game API change rules applied during version migration
//!
//! A rule names a literal pattern that marks use of an API which changed
//! between two game versions. Auto-fixable rules carry a literal find/replace
//! pair; the rest become manual follow-up steps.
//!
//! Projects can add rules in `api_changes.toml`:
//!
//! ```toml
//! [[change]]
//! from = "1.21.1"
//! to = "1.21.4"
//! type = "RENAME"
//! old_pattern = "new ResourceLocation("
//! description = "ResourceLocation constructor is private"
//! auto_fixable = true
//! fix = { find = "new ResourceLocation(", replace = "ResourceLocation.fromNamespaceAndPath(" }
//! ```

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RefactorError;

/// Project-local rules file name
pub const RULES_FILE: &str = "api_changes.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiChangeType {
    Rename,
    ParameterChange,
    PackageMove,
    MethodSignature,
    Removed,
    Deprecated,
}

/// Literal text substitution applied to a file that matches a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFix {
    pub find: String,
    pub replace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChange {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub change_type: ApiChangeType,
    pub old_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_pattern: Option<String>,
    pub description: String,
    #[serde(default)]
    pub auto_fixable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<AutoFix>,
}

impl ApiChange {
    /// The fix to apply, if this rule is auto-fixable and has one
    pub fn auto_fix(&self) -> Option<&AutoFix> {
        if self.auto_fixable {
            self.fix.as_ref()
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default, rename = "change")]
    changes: Vec<ApiChange>,
}

/// A rule that matched a file's content
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedChange<'a> {
    pub change: &'a ApiChange,
    /// 1-based lines containing the old pattern
    pub lines: Vec<usize>,
}

impl DetectedChange<'_> {
    pub fn can_auto_fix(&self) -> bool {
        self.change.auto_fix().is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiChangeRules {
    changes: Vec<ApiChange>,
}

impl ApiChangeRules {
    pub fn new(changes: Vec<ApiChange>) -> Self {
        Self { changes }
    }

    /// Known changes between the supported game versions
    pub fn builtin() -> Self {
        let change = |from: &str,
                      to: &str,
                      change_type: ApiChangeType,
                      old: &str,
                      new: &str,
                      description: &str,
                      fix: Option<(&str, &str)>| ApiChange {
            from: from.to_string(),
            to: to.to_string(),
            change_type,
            old_pattern: old.to_string(),
            new_pattern: Some(new.to_string()),
            description: description.to_string(),
            auto_fixable: fix.is_some(),
            fix: fix.map(|(find, replace)| AutoFix {
                find: find.to_string(),
                replace: replace.to_string(),
            }),
        };

        Self::new(vec![
            change(
                "1.20.1",
                "1.20.4",
                ApiChangeType::Rename,
                "Registry.register",
                "Registry.register",
                "Registry API minor changes",
                None,
            ),
            change(
                "1.20.4",
                "1.21.1",
                ApiChangeType::ParameterChange,
                "Block.Properties.of",
                "Block.Properties.of",
                "Block properties builder changes",
                Some((".strength(1.5f)", ".destroyTime(1.5f)")),
            ),
            change(
                "1.20.4",
                "1.21.1",
                ApiChangeType::PackageMove,
                "net.minecraft.world.item.CreativeModeTab",
                "net.minecraft.world.item.CreativeModeTabs",
                "Creative tab reorganization",
                Some(("CreativeModeTab.", "CreativeModeTabs.")),
            ),
            change(
                "1.20.4",
                "1.21.1",
                ApiChangeType::MethodSignature,
                "Item.Properties.stacksTo",
                "Item.Properties.stacksTo",
                "Item properties changes",
                None,
            ),
        ])
    }

    /// Load rules from a TOML file of `[[change]]` tables
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        let rules = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))?;
        Ok(rules)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RefactorError> {
        let file: RulesFile = toml::from_str(content)?;
        Ok(Self::new(file.changes))
    }

    /// Built-in rules plus `api_changes.toml` under `root`, if present
    pub fn for_project(root: &Path) -> Result<Self, RefactorError> {
        let mut rules = Self::builtin();
        let path = root.join(RULES_FILE);
        if path.is_file() {
            let content = fs::read_to_string(&path)?;
            let extra = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded {} API rule(s) from {}", extra.len(), path.display());
            rules.extend(extra);
        }
        Ok(rules)
    }

    pub fn extend(&mut self, other: ApiChangeRules) {
        self.changes.extend(other.changes);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Rules whose version step lies inside `from..=to`, oldest step first.
    ///
    /// Migrating 1.20.1 to 1.21.1 picks up both the 1.20.1 -> 1.20.4 and the
    /// 1.20.4 -> 1.21.1 rules.
    pub fn between(&self, from: &str, to: &str) -> Vec<&ApiChange> {
        if compare_versions(from, to) != Ordering::Less {
            return Vec::new();
        }
        let mut selected: Vec<&ApiChange> = self
            .changes
            .iter()
            .filter(|c| {
                compare_versions(from, &c.from) != Ordering::Greater
                    && compare_versions(&c.to, to) != Ordering::Greater
                    && compare_versions(&c.from, &c.to) == Ordering::Less
            })
            .collect();
        selected.sort_by(|a, b| compare_versions(&a.from, &b.from));
        selected
    }

    /// Rules from `between(from, to)` whose old pattern occurs in `content`
    pub fn analyze<'a>(&'a self, content: &str, from: &str, to: &str) -> Vec<DetectedChange<'a>> {
        self.between(from, to)
            .into_iter()
            .filter_map(|change| {
                let lines: Vec<usize> = content
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| line.contains(&change.old_pattern))
                    .map(|(i, _)| i + 1)
                    .collect();
                (!lines.is_empty()).then_some(DetectedChange { change, lines })
            })
            .collect()
    }
}

/// Numeric component-wise comparison (`1.20.4` < `1.21`); missing parts are 0
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Option<Vec<u64>> { v.split(|c: char| c == '.' || c == '_').map(|p| p.parse().ok()).collect() };
    match (parse(a), parse(b)) {
        (Some(x), Some(y)) => {
            let len = x.len().max(y.len());
            for i in 0..len {
                let ord = x.get(i).copied().unwrap_or(0).cmp(&y.get(i).copied().unwrap_or(0));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }
        _ => a.cmp(b),
    }
}
