//! Per-kind reference matchers
//!
//! Each matcher knows the textual shapes a component's identifiers take in
//! one family of files. Swapping a matcher for a real parser only touches
//! this module.

use std::path::Path;

use super::{Identifiers, ReferenceKind};
use crate::types::{ArtifactKind, TextPattern};

/// A hit inside one file, before line numbers are attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub offset: usize,
    pub kind: ReferenceKind,
    pub matched: String,
}

pub trait ReferenceMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    fn handles(&self, kind: ArtifactKind, path: &Path) -> bool;

    fn find(&self, text: &str, kind: ArtifactKind, ids: &Identifiers) -> Vec<RawMatch>;
}

/// Java/Kotlin sources: imports, bare class uses, quoted ids
pub struct CodeMatcher;

impl ReferenceMatcher for CodeMatcher {
    fn name(&self) -> &'static str {
        "code"
    }

    fn handles(&self, kind: ArtifactKind, _path: &Path) -> bool {
        kind == ArtifactKind::Code
    }

    fn find(&self, text: &str, _kind: ArtifactKind, ids: &Identifiers) -> Vec<RawMatch> {
        let mut out = Vec::new();
        let mut import_spans = Vec::new();

        if let Some(import_path) = &ids.import_path {
            for offset in TextPattern::Identifier(import_path.clone()).find_all(text) {
                let (line_start, line_end) = line_bounds(text, offset);
                if text[line_start..line_end].trim_start().starts_with("import ") {
                    import_spans.push((line_start, line_end));
                    out.push(RawMatch {
                        offset,
                        kind: ReferenceKind::Import,
                        matched: import_path.clone(),
                    });
                }
            }
        }

        if let Some(class_name) = &ids.class_name {
            for offset in TextPattern::Identifier(class_name.clone()).find_all(text) {
                let in_import = import_spans
                    .iter()
                    .any(|&(start, end)| offset >= start && offset < end);
                if !in_import {
                    out.push(RawMatch {
                        offset,
                        kind: ReferenceKind::ClassRef,
                        matched: class_name.clone(),
                    });
                }
            }
        }

        let quoted = ids.quoted_snake();
        push_all(&mut out, text, &TextPattern::Literal(quoted.clone()), ReferenceKind::StringId, &quoted);
        push_all(
            &mut out,
            text,
            &TextPattern::Identifier(ids.namespaced_id.clone()),
            ReferenceKind::StringId,
            &ids.namespaced_id,
        );
        push_resource_ids(&mut out, text, ids);
        out
    }
}

/// JSON resources: ids in recipes, tags, loot tables, models and lang files
pub struct JsonMatcher;

impl ReferenceMatcher for JsonMatcher {
    fn name(&self) -> &'static str {
        "json"
    }

    fn handles(&self, _kind: ArtifactKind, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some("json")
    }

    fn find(&self, text: &str, kind: ArtifactKind, ids: &Identifiers) -> Vec<RawMatch> {
        let id_kind = match kind {
            ArtifactKind::Tag => ReferenceKind::TagValue,
            ArtifactKind::LootTable => ReferenceKind::LootEntry,
            _ => ReferenceKind::JsonId,
        };
        let mut out = Vec::new();
        push_all(
            &mut out,
            text,
            &TextPattern::Identifier(ids.namespaced_id.clone()),
            id_kind,
            &ids.namespaced_id,
        );
        push_resource_ids(&mut out, text, ids);
        out
    }
}

/// Any other text file: configs, build scripts, docs
pub struct PlainTextMatcher;

impl ReferenceMatcher for PlainTextMatcher {
    fn name(&self) -> &'static str {
        "text"
    }

    fn handles(&self, _kind: ArtifactKind, _path: &Path) -> bool {
        true
    }

    fn find(&self, text: &str, _kind: ArtifactKind, ids: &Identifiers) -> Vec<RawMatch> {
        let mut out = Vec::new();
        if let Some(class_name) = &ids.class_name {
            push_all(
                &mut out,
                text,
                &TextPattern::Identifier(class_name.clone()),
                ReferenceKind::ClassRef,
                class_name,
            );
        }
        push_all(
            &mut out,
            text,
            &TextPattern::Identifier(ids.namespaced_id.clone()),
            ReferenceKind::StringId,
            &ids.namespaced_id,
        );
        out
    }
}

fn push_resource_ids(out: &mut Vec<RawMatch>, text: &str, ids: &Identifiers) {
    for path in &ids.resource_paths {
        push_all(out, text, &TextPattern::Identifier(path.clone()), ReferenceKind::ResourcePath, path);
    }
    for key in &ids.lang_keys {
        push_all(out, text, &TextPattern::Identifier(key.clone()), ReferenceKind::LangKey, key);
    }
}

fn push_all(out: &mut Vec<RawMatch>, text: &str, pattern: &TextPattern, kind: ReferenceKind, matched: &str) {
    out.extend(pattern.find_all(text).into_iter().map(|offset| RawMatch {
        offset,
        kind,
        matched: matched.to_string(),
    }));
}

fn line_bounds(text: &str, offset: usize) -> (usize, usize) {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
    (start, end)
}
