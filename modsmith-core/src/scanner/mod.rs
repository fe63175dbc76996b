//! Reference scanning
//!
//! Walks the project tree looking for files outside a component's own
//! artifacts that mention one of its derived identifiers. Matching is textual
//! and convention-based; malformed files are scanned as plain text, and
//! unreadable or oversized files are skipped with a warning.

mod matchers;

pub use matchers::{CodeMatcher, JsonMatcher, PlainTextMatcher, RawMatch, ReferenceMatcher};

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;

use crate::naming::{ComponentName, ComponentType};
use crate::path_utils::relative_display;
use crate::types::{ArtifactKind, ArtifactRef, ProjectContext};
use crate::walk::files_under;

/// Files above this size are skipped rather than scanned
pub const DEFAULT_MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;

/// Bytes inspected when sniffing for binary content
const BINARY_SNIFF_LEN: usize = 8000;

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ogg", "wav", "mp3", "nbt", "jar", "zip", "class", "ttf", "otf",
    "ico", "bin", "dat",
];

/// How a reference mentions the component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Import,
    ClassRef,
    StringId,
    JsonId,
    TagValue,
    LootEntry,
    ResourcePath,
    LangKey,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceKind::Import => "import",
            ReferenceKind::ClassRef => "class_ref",
            ReferenceKind::StringId => "string_id",
            ReferenceKind::JsonId => "json_id",
            ReferenceKind::TagValue => "tag_value",
            ReferenceKind::LootEntry => "loot_entry",
            ReferenceKind::ResourcePath => "resource_path",
            ReferenceKind::LangKey => "lang_key",
        };
        f.write_str(s)
    }
}

/// One occurrence of a component identifier in a file it does not own
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub artifact: ArtifactRef,
    /// Byte offset of the match
    pub offset: usize,
    /// 1-based line number
    pub line: usize,
    pub kind: ReferenceKind,
    pub matched: String,
}

/// The textual forms a component's identity takes across the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    pub snake: String,
    pub class_name: Option<String>,
    pub import_path: Option<String>,
    pub namespaced_id: String,
    /// `testmod:item/ruby_gem` style model/texture pointers
    pub resource_paths: Vec<String>,
    /// `item.testmod.ruby_gem` style translation keys
    pub lang_keys: Vec<String>,
}

impl Identifiers {
    pub fn new(namespace: &str, package: &str, name: &ComponentName, component: ComponentType) -> Self {
        let class_name = component.has_code().then(|| name.class_name().to_string());
        let import_path = component
            .code_dir()
            .map(|dir| format!("{}.{}.{}", package, dir, name.class_name()));

        let segments: &[&str] = match component {
            ComponentType::Item => &["item"],
            ComponentType::Block => &["block", "item"],
            ComponentType::Entity => &["entity"],
            ComponentType::Recipe
            | ComponentType::Tag
            | ComponentType::Enchantment
            | ComponentType::Biome => &[],
        };
        let resource_paths = segments
            .iter()
            .map(|seg| format!("{}:{}/{}", namespace, seg, name))
            .collect();
        let lang_keys = component
            .resource_segment()
            .map(|seg| format!("{}.{}.{}", seg, namespace, name))
            .into_iter()
            .collect();

        Self {
            snake: name.as_str().to_string(),
            class_name,
            import_path,
            namespaced_id: name.namespaced_id(namespace),
            resource_paths,
            lang_keys,
        }
    }

    pub fn from_ctx(ctx: &ProjectContext, name: &ComponentName, component: ComponentType) -> Self {
        Self::new(&ctx.namespace, &ctx.package_name, name, component)
    }

    /// Identifiers as the owned files address the component; a tag in a
    /// subdirectory is `testmod:gems/shiny`, not `testmod:shiny`
    pub fn located(ctx: &ProjectContext, name: &ComponentName, component: ComponentType, owned: &[ArtifactRef]) -> Self {
        let mut ids = Self::from_ctx(ctx, name, component);
        if let Some(id) = owned.iter().find_map(ArtifactRef::tag_id) {
            ids.namespaced_id = id;
        }
        ids
    }

    /// Identifiers of `new` in the same place, keeping any tag directory
    pub fn renamed(&self, ctx: &ProjectContext, new: &ComponentName, component: ComponentType) -> Self {
        let mut ids = Self::from_ctx(ctx, new, component);
        if let Some((dir, _)) = self.namespaced_id.rsplit_once('/') {
            ids.namespaced_id = format!("{}/{}", dir, new);
        }
        ids
    }

    pub fn quoted_snake(&self) -> String {
        format!("\"{}\"", self.snake)
    }

    /// The counterpart of `matched` in another component's identifiers
    pub fn translate(&self, matched: &str, to: &Identifiers) -> Option<String> {
        if self.class_name.as_deref() == Some(matched) {
            return to.class_name.clone();
        }
        if self.import_path.as_deref() == Some(matched) {
            return to.import_path.clone();
        }
        if matched == self.namespaced_id {
            return Some(to.namespaced_id.clone());
        }
        if matched == self.quoted_snake() {
            return Some(to.quoted_snake());
        }
        if matched == self.snake {
            return Some(to.snake.clone());
        }
        if let Some(i) = self.resource_paths.iter().position(|p| p == matched) {
            return to.resource_paths.get(i).cloned();
        }
        if let Some(i) = self.lang_keys.iter().position(|k| k == matched) {
            return to.lang_keys.get(i).cloned();
        }
        None
    }
}

/// References found plus files that could not be scanned
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub references: Vec<Reference>,
    pub warnings: Vec<String>,
}

impl ScanReport {
    /// Distinct referencing files, in path order
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self
            .references
            .iter()
            .map(|r| r.artifact.path.as_path())
            .collect();
        files.dedup();
        files
    }
}

enum FileScan {
    Hits(Vec<Reference>),
    Skipped,
    Warning(String),
}

/// Scans a project tree with a set of matchers, first match per file wins
pub struct ReferenceScanner {
    matchers: Vec<Box<dyn ReferenceMatcher>>,
    max_file_bytes: u64,
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self {
            matchers: vec![
                Box::new(CodeMatcher),
                Box::new(JsonMatcher),
                Box::new(PlainTextMatcher),
            ],
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ReferenceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a matcher ahead of the built-in ones
    pub fn with_matcher(mut self, matcher: Box<dyn ReferenceMatcher>) -> Self {
        self.matchers.insert(0, matcher);
        self
    }

    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    /// Find every reference to `ids` outside `owned`, sorted by path then offset
    pub fn scan(&self, root: &Path, ids: &Identifiers, owned: &[ArtifactRef]) -> ScanReport {
        let owned: HashSet<&Path> = owned.iter().map(|a| a.path.as_path()).collect();
        let walk = files_under(root);
        let candidates: Vec<PathBuf> = walk
            .files
            .into_iter()
            .filter(|p| !owned.contains(p.as_path()))
            .collect();

        let results: Vec<FileScan> = candidates
            .par_iter()
            .map(|path| self.scan_file(root, path, ids))
            .collect();

        let mut report = ScanReport {
            references: Vec::new(),
            warnings: walk.warnings,
        };
        for result in results {
            match result {
                FileScan::Hits(hits) => report.references.extend(hits),
                FileScan::Warning(w) => report.warnings.push(w),
                FileScan::Skipped => {}
            }
        }
        report.references.sort_by(|a, b| {
            a.artifact
                .path
                .cmp(&b.artifact.path)
                .then(a.offset.cmp(&b.offset))
        });
        tracing::debug!(
            "Scanned {} file(s): {} reference(s), {} warning(s)",
            candidates.len(),
            report.references.len(),
            report.warnings.len()
        );
        report
    }

    fn scan_file(&self, root: &Path, path: &Path, ids: &Identifiers) -> FileScan {
        let rel = relative_display(root, path);
        let kind = ArtifactKind::classify(path);
        let binary_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| BINARY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if kind.is_binary_asset() || binary_ext {
            return FileScan::Skipped;
        }

        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.max_file_bytes => {
                tracing::warn!("Skipping oversized file {:?} ({} bytes)", path, meta.len());
                return FileScan::Warning(format!(
                    "skipped {}: larger than {} bytes",
                    rel, self.max_file_bytes
                ));
            }
            Ok(_) => {}
            Err(e) => return FileScan::Warning(format!("skipped {}: {}", rel, e)),
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read file {:?}: {}", path, e);
                return FileScan::Warning(format!("skipped {}: {}", rel, e));
            }
        };
        if bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0) {
            return FileScan::Skipped;
        }
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => return FileScan::Warning(format!("skipped {}: not valid UTF-8", rel)),
        };

        let Some(matcher) = self.matchers.iter().find(|m| m.handles(kind, path)) else {
            return FileScan::Skipped;
        };
        let mut raw = matcher.find(&text, kind, ids);
        if raw.is_empty() {
            return FileScan::Hits(Vec::new());
        }
        raw.sort_by_key(|m| m.offset);

        let line_starts = line_starts(&text);
        let artifact = ArtifactRef {
            path: path.to_path_buf(),
            kind,
        };
        FileScan::Hits(
            raw.into_iter()
                .map(|m| Reference {
                    artifact: artifact.clone(),
                    offset: m.offset,
                    line: line_starts.partition_point(|&s| s <= m.offset),
                    kind: m.kind,
                    matched: m.matched,
                })
                .collect(),
        )
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Scan the whole project for references to a component
pub fn find_references(
    ctx: &ProjectContext,
    name: &ComponentName,
    component: ComponentType,
    owned: &[ArtifactRef],
) -> ScanReport {
    let ids = Identifiers::located(ctx, name, component, owned);
    ReferenceScanner::default().scan(&ctx.root, &ids, owned)
}
