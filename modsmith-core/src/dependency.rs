//! Dependency analysis for safe removal
//!
//! Narrows scanner hits down to the references that break when a component
//! disappears: recipe inputs and outputs, tag values, loot-table entries,
//! advancement criteria, and code that names the class.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::naming::{ComponentName, ComponentType};
use crate::path_utils::relative_display;
use crate::scanner::{find_references, Identifiers, Reference, ReferenceKind};
use crate::types::{ArtifactKind, ArtifactRef, ProjectContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Recipe,
    Tag,
    LootTable,
    Advancement,
    Code,
}

impl DependencyKind {
    fn for_artifact(kind: ArtifactKind) -> Option<Self> {
        match kind {
            ArtifactKind::Recipe => Some(DependencyKind::Recipe),
            ArtifactKind::Tag => Some(DependencyKind::Tag),
            ArtifactKind::LootTable => Some(DependencyKind::LootTable),
            ArtifactKind::Advancement => Some(DependencyKind::Advancement),
            ArtifactKind::Code => Some(DependencyKind::Code),
            _ => None,
        }
    }

    /// JSON keys under which an id counts as a use of the component
    fn json_keys(self) -> &'static [&'static str] {
        match self {
            DependencyKind::Recipe => &[
                "item", "id", "result", "ingredient", "ingredients", "base", "addition",
                "template", "key",
            ],
            DependencyKind::Tag => &["values", "id"],
            DependencyKind::LootTable => &["name"],
            DependencyKind::Advancement => &["items", "item", "id", "icon"],
            DependencyKind::Code => &[],
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyKind::Recipe => "recipe",
            DependencyKind::Tag => "tag",
            DependencyKind::LootTable => "loot table",
            DependencyKind::Advancement => "advancement",
            DependencyKind::Code => "code",
        };
        f.write_str(s)
    }
}

/// A file that would dangle if the component were removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub component: String,
    pub artifact: ArtifactRef,
    pub kind: DependencyKind,
    pub line: usize,
    pub description: String,
}

#[derive(Debug, Default, Serialize)]
pub struct DependencyReport {
    pub edges: Vec<DependencyEdge>,
    pub warnings: Vec<String>,
}

impl DependencyReport {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Every blocking dependency on a component, one edge per referencing file
pub fn find_all_dependencies(
    ctx: &ProjectContext,
    name: &ComponentName,
    component: ComponentType,
    owned: &[ArtifactRef],
) -> DependencyReport {
    let scan = find_references(ctx, name, component, owned);
    let namespaced_id = Identifiers::located(ctx, name, component, owned).namespaced_id;
    let mut report = DependencyReport {
        edges: Vec::new(),
        warnings: scan.warnings,
    };

    let mut start = 0;
    while start < scan.references.len() {
        let path = &scan.references[start].artifact.path;
        let end = start
            + scan.references[start..]
                .iter()
                .take_while(|r| &r.artifact.path == path)
                .count();
        let group = &scan.references[start..end];
        start = end;

        let artifact = &group[0].artifact;
        let Some(kind) = DependencyKind::for_artifact(artifact.kind) else {
            continue;
        };
        let rel = relative_display(&ctx.root, &artifact.path);

        let hit = if kind == DependencyKind::Code {
            group.first()
        } else {
            let id_hits: Vec<&Reference> = group
                .iter()
                .filter(|r| {
                    matches!(
                        r.kind,
                        ReferenceKind::JsonId | ReferenceKind::TagValue | ReferenceKind::LootEntry
                    )
                })
                .collect();
            if id_hits.is_empty() {
                continue;
            }
            match json_uses_id(&artifact.path, &namespaced_id, kind) {
                Ok(true) => id_hits.first().copied(),
                Ok(false) => None,
                Err(e) => {
                    tracing::warn!("Malformed JSON in {}: {}", rel, e);
                    report
                        .warnings
                        .push(format!("{} is not valid JSON ({}); matched as text", rel, e));
                    id_hits.first().copied()
                }
            }
        };

        if let Some(hit) = hit {
            report.edges.push(DependencyEdge {
                component: name.to_string(),
                artifact: artifact.clone(),
                kind,
                line: hit.line,
                description: format!("{} {} (line {}) references {}", kind, rel, hit.line, hit.matched),
            });
        }
    }

    tracing::debug!("Found {} dependency edge(s) on '{}'", report.edges.len(), name);
    report
}

/// Whether the JSON file holds `id` under one of the kind's keys
fn json_uses_id(path: &Path, id: &str, kind: DependencyKind) -> Result<bool, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let value: Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    Ok(contains_keyed_id(&value, id, kind.json_keys(), false))
}

fn contains_keyed_id(value: &Value, id: &str, keys: &[&str], under_key: bool) -> bool {
    match value {
        Value::String(s) => under_key && s.strip_prefix('#').unwrap_or(s) == id,
        Value::Array(items) => items.iter().any(|v| contains_keyed_id(v, id, keys, under_key)),
        Value::Object(map) => map.iter().any(|(k, v)| {
            contains_keyed_id(v, id, keys, under_key || keys.contains(&k.as_str()))
        }),
        _ => false,
    }
}
