//! Error taxonomy for the refactoring engine

use std::path::PathBuf;

use crate::naming::ComponentType;

/// Errors surfaced by discovery, planning, execution and validation.
#[derive(Debug, thiserror::Error)]
pub enum RefactorError {
    /// The component owns no artifacts.
    #[error("{component} '{name}' not found")]
    NotFound { component: String, name: String },

    /// Destination exists or dependencies block the operation.
    #[error("operation blocked by {} conflict(s):\n  - {}", .reasons.len(), .reasons.join("\n  - "))]
    Conflict { reasons: Vec<String> },

    /// Operation `index` of a plan failed; completed steps were rolled back.
    #[error("operation {index} failed: {message}")]
    PartialFailure { index: usize, message: String },

    /// A post-execution check did not hold.
    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("invalid component name '{0}': expected snake_case like 'ruby_gem'")]
    InvalidName(String),

    #[error("invalid package name '{0}': expected dot-separated lowercase identifiers like 'com.example.mymod'")]
    InvalidPackage(String),

    #[error("invalid mod id '{0}': expected 2-64 lowercase letters, digits, '_' or '-'")]
    InvalidModId(String),

    #[error("project config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("unknown asset pack '{0}'")]
    UnknownAssetPack(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl RefactorError {
    pub fn not_found(component: ComponentType, name: impl Into<String>) -> Self {
        RefactorError::NotFound {
            component: component.to_string(),
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RefactorError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RefactorError::Conflict { .. })
    }
}

pub type Result<T, E = RefactorError> = std::result::Result<T, E>;
