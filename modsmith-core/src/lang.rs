//! Key-by-key merging of translation files
//!
//! A merge only ever adds keys to the target (or, when the source is forced
//! to win, overwrites values); a key present only in the target survives.

use std::path::Path;

use regex::Regex;
use serde_json::{Map, Value};

/// Result of merging one lang file into another
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LangMerge {
    /// New target contents; `None` when the target needs no change
    pub merged: Option<String>,
    pub added: Vec<String>,
    pub overwritten: Vec<String>,
    pub warnings: Vec<String>,
}

/// `assets/<ns>/lang/<locale>.json`
pub fn is_lang_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
        && path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            == Some("lang")
}

/// Merge `source` keys into `target`. Existing target values win unless
/// `source_wins` is set. Output keeps the target's key order with new keys
/// appended in source order.
pub fn merge_lang(source: &str, target: &str, source_wins: bool) -> LangMerge {
    let mut outcome = LangMerge::default();

    let mut merged: Map<String, Value> = match serde_json::from_str(target) {
        Ok(map) => map,
        Err(e) => {
            outcome
                .warnings
                .push(format!("target lang file is not a JSON object ({}); left unchanged", e));
            return outcome;
        }
    };

    let entries = match serde_json::from_str::<Map<String, Value>>(source) {
        Ok(map) => map.into_iter().collect::<Vec<_>>(),
        Err(e) => {
            outcome.warnings.push(format!(
                "source lang file is not valid JSON ({}); recovered entries by pattern",
                e
            ));
            recover_entries(source)
        }
    };

    for (key, value) in entries {
        match merged.get(&key) {
            None => {
                merged.insert(key.clone(), value);
                outcome.added.push(key);
            }
            Some(existing) if source_wins && *existing != value => {
                merged.insert(key.clone(), value);
                outcome.overwritten.push(key);
            }
            Some(_) => {}
        }
    }

    if outcome.added.is_empty() && outcome.overwritten.is_empty() {
        return outcome;
    }
    match serde_json::to_string_pretty(&Value::Object(merged)) {
        Ok(text) => outcome.merged = Some(text + "\n"),
        Err(e) => outcome.warnings.push(format!("failed to serialize merged lang file: {}", e)),
    }
    outcome
}

/// Pull `"key": "value"` pairs out of text that does not parse as JSON
fn recover_entries(text: &str) -> Vec<(String, Value)> {
    let Ok(re) = Regex::new(r#""((?:[^"\\]|\\.)*)"\s*:\s*"((?:[^"\\]|\\.)*)""#) else {
        return Vec::new();
    };
    re.captures_iter(text)
        .map(|caps| {
            let key = unescape(&caps[1]);
            let value = unescape(&caps[2]);
            (key, Value::String(value))
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_missing_keys_only() {
        let source = r#"{"a": "A", "b": "B-source", "c": "C"}"#;
        let target = r#"{"b": "B-target", "z": "Z"}"#;
        let out = merge_lang(source, target, false);

        assert_eq!(out.added, vec!["a", "c"]);
        assert!(out.overwritten.is_empty());
        let merged: Map<String, Value> = serde_json::from_str(out.merged.as_deref().unwrap()).unwrap();
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "z", "a", "c"]);
        assert_eq!(merged["b"], "B-target");
        assert_eq!(merged["z"], "Z");
    }

    #[test]
    fn test_merge_source_wins_when_forced() {
        let out = merge_lang(r#"{"b": "new"}"#, r#"{"b": "old", "z": "Z"}"#, true);
        assert_eq!(out.overwritten, vec!["b"]);
        let merged: Map<String, Value> = serde_json::from_str(out.merged.as_deref().unwrap()).unwrap();
        assert_eq!(merged["b"], "new");
        assert_eq!(merged["z"], "Z");
    }

    #[test]
    fn test_merge_no_change() {
        let out = merge_lang(r#"{"a": "X"}"#, r#"{"a": "A", "b": "B"}"#, false);
        assert!(out.merged.is_none());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_malformed_target_left_alone() {
        let out = merge_lang(r#"{"a": "A"}"#, r#"{"b": "B",,}"#, true);
        assert!(out.merged.is_none());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_malformed_source_recovered() {
        let out = merge_lang("{\"a\": \"A \\\"quoted\\\"\", \"b\": \"B\",,", r#"{"b": "B0"}"#, false);
        assert_eq!(out.added, vec!["a"]);
        assert_eq!(out.warnings.len(), 1);
        let merged: Map<String, Value> = serde_json::from_str(out.merged.as_deref().unwrap()).unwrap();
        assert_eq!(merged["a"], "A \"quoted\"");
    }

    #[test]
    fn test_is_lang_file() {
        assert!(is_lang_file(Path::new("assets/x/lang/en_us.json")));
        assert!(!is_lang_file(Path::new("assets/x/models/en_us.json")));
        assert!(!is_lang_file(Path::new("assets/x/lang/en_us.lang")));
    }
}
