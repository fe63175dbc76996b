//! Operations, plans and execution results
//!
//! Operations are data: a [`Plan`] is an ordered list of them that the
//! executor applies (or previews) in sequence.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::naming::is_ident_char;

/// How a `ContentReplace` finds the text it replaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum TextPattern {
    /// Every occurrence of the exact text
    Literal(String),
    /// Occurrences not directly preceded or followed by an identifier
    /// character (checked only on sides where the text itself ends in one)
    Identifier(String),
}

impl TextPattern {
    pub fn text(&self) -> &str {
        match self {
            TextPattern::Literal(s) | TextPattern::Identifier(s) => s,
        }
    }

    /// Byte offsets of every match, ascending
    pub fn find_all(&self, haystack: &str) -> Vec<usize> {
        let needle = self.text();
        if needle.is_empty() {
            return Vec::new();
        }
        let mut offsets = Vec::new();
        let mut from = 0;
        while let Some(pos) = haystack[from..].find(needle) {
            let start = from + pos;
            let end = start + needle.len();
            let accept = match self {
                TextPattern::Literal(_) => true,
                TextPattern::Identifier(_) => is_bounded(haystack, needle, start, end),
            };
            if accept {
                offsets.push(start);
                from = end;
            } else {
                from = start + needle.chars().next().map_or(1, char::len_utf8);
            }
        }
        offsets
    }

    /// Replace every match, returning the new text and the match count
    pub fn replace_all(&self, haystack: &str, replacement: &str) -> (String, usize) {
        let offsets = self.find_all(haystack);
        if offsets.is_empty() {
            return (haystack.to_string(), 0);
        }
        let needle_len = self.text().len();
        let mut out = String::with_capacity(haystack.len());
        let mut last = 0;
        for &start in &offsets {
            out.push_str(&haystack[last..start]);
            out.push_str(replacement);
            last = start + needle_len;
        }
        out.push_str(&haystack[last..]);
        (out, offsets.len())
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        !self.find_all(haystack).is_empty()
    }
}

/// Boundary check for identifier matches
pub(crate) fn is_bounded(haystack: &str, needle: &str, start: usize, end: usize) -> bool {
    let starts_ident = needle.chars().next().is_some_and(is_ident_char);
    let ends_ident = needle.chars().next_back().is_some_and(is_ident_char);

    let before_ok = !starts_ident
        || haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_ident_char(c));
    let after_ok = !ends_ident
        || haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_ident_char(c));
    before_ok && after_ok
}

/// A primitive file-system mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    FileRename {
        from: PathBuf,
        to: PathBuf,
    },
    FileCopy {
        from: PathBuf,
        to: PathBuf,
    },
    ContentReplace {
        path: PathBuf,
        pattern: TextPattern,
        replacement: String,
    },
    /// Replace (or create) a file with computed contents
    WriteFile {
        path: PathBuf,
        contents: String,
    },
    Delete {
        path: PathBuf,
    },
    CreateDir {
        path: PathBuf,
    },
    /// Remove a directory; only ever succeeds when it is empty
    RemoveDir {
        path: PathBuf,
    },
}

impl Operation {
    /// Short label used when grouping operations in reports
    pub fn label(&self) -> &'static str {
        match self {
            Operation::FileRename { .. } => "rename",
            Operation::FileCopy { .. } => "copy",
            Operation::ContentReplace { .. } => "edit",
            Operation::WriteFile { .. } => "write",
            Operation::Delete { .. } => "delete",
            Operation::CreateDir { .. } => "mkdir",
            Operation::RemoveDir { .. } => "rmdir",
        }
    }

    /// The path this operation changes (the destination for moves/copies)
    pub fn target(&self) -> &Path {
        match self {
            Operation::FileRename { to, .. } | Operation::FileCopy { to, .. } => to,
            Operation::ContentReplace { path, .. }
            | Operation::WriteFile { path, .. }
            | Operation::Delete { path }
            | Operation::CreateDir { path }
            | Operation::RemoveDir { path } => path,
        }
    }

    /// Existing files whose current content this operation destroys or edits
    pub fn touches_existing(&self) -> Option<&Path> {
        match self {
            Operation::FileRename { from, .. } => Some(from),
            Operation::FileCopy { to, .. } => Some(to),
            Operation::ContentReplace { path, .. }
            | Operation::WriteFile { path, .. }
            | Operation::Delete { path } => Some(path),
            Operation::CreateDir { .. } | Operation::RemoveDir { .. } => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::FileRename { from, to } => {
                write!(f, "rename {} -> {}", from.display(), to.display())
            }
            Operation::FileCopy { from, to } => {
                write!(f, "copy {} -> {}", from.display(), to.display())
            }
            Operation::ContentReplace {
                path,
                pattern,
                replacement,
            } => write!(
                f,
                "edit {}: '{}' -> '{}'",
                path.display(),
                pattern.text(),
                replacement
            ),
            Operation::WriteFile { path, .. } => write!(f, "write {}", path.display()),
            Operation::Delete { path } => write!(f, "delete {}", path.display()),
            Operation::CreateDir { path } => write!(f, "mkdir {}", path.display()),
            Operation::RemoveDir { path } => write!(f, "rmdir {}", path.display()),
        }
    }
}

/// An ordered sequence of operations plus what the planner wants the user to know
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Human label, e.g. `rename item ruby_gem -> sapphire_gem`
    pub subject: String,
    pub operations: Vec<Operation>,
    pub warnings: Vec<String>,
    pub manual_steps: Vec<String>,
}

impl Plan {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether executing the plan would destroy or rewrite existing content
    pub fn is_destructive(&self) -> bool {
        self.operations.iter().any(|op| {
            !matches!(
                op,
                Operation::CreateDir { .. } | Operation::RemoveDir { .. }
            )
        })
    }
}

/// Outcome of one `execute` call
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub dry_run: bool,
    pub operations_planned: usize,
    /// Operations applied and kept (0 in dry-run or after rollback)
    pub operations_executed: usize,
    pub operations_rolled_back: usize,
    pub rolled_back: bool,
    pub paths_removed: Vec<PathBuf>,
    pub paths_created: Vec<PathBuf>,
    pub paths_modified: Vec<PathBuf>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub manual_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
}

impl ExecutionResult {
    /// A failed result carrying every reason, with nothing applied
    pub fn blocked(planned: usize, reasons: Vec<String>) -> Self {
        Self {
            success: false,
            operations_planned: planned,
            errors: vec![format!("blocked by {} conflict(s)", reasons.len())],
            warnings: reasons,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_boundaries() {
        let p = TextPattern::Identifier("ruby_gem".into());
        assert_eq!(p.find_all("ruby_gem ruby_gem_block xruby_gem \"ruby_gem\""), vec![0, 35]);

        let p = TextPattern::Identifier("testmod:ruby_gem".into());
        assert_eq!(p.find_all("\"testmod:ruby_gem\", \"testmod:ruby_gem_ore\""), vec![1]);

        let p = TextPattern::Identifier("\"ruby_gem\"".into());
        assert_eq!(p.find_all("ID = \"ruby_gem\";"), vec![5]);
    }

    #[test]
    fn test_literal_matches_everywhere() {
        let p = TextPattern::Literal("Gem".into());
        assert_eq!(p.find_all("RubyGem GemX"), vec![4, 8]);
    }

    #[test]
    fn test_replace_all() {
        let p = TextPattern::Identifier("RubyGem".into());
        let (out, n) = p.replace_all("class RubyGem extends RubyGemBase { RubyGem() {} }", "SapphireGem");
        assert_eq!(n, 2);
        assert_eq!(out, "class SapphireGem extends RubyGemBase { SapphireGem() {} }");
    }

    #[test]
    fn test_plan_destructive() {
        let mut plan = Plan::new("test");
        plan.push(Operation::CreateDir { path: "a".into() });
        assert!(!plan.is_destructive());
        plan.push(Operation::Delete { path: "a/b".into() });
        assert!(plan.is_destructive());
    }

    #[test]
    fn test_operation_serializes_tagged() {
        let op = Operation::Delete { path: "x.json".into() };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"op":"delete","path":"x.json"}"#);
    }
}
