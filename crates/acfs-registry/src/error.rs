//! Error categories and the typed error surfaced when `throw_on_error` is
//! set (SPEC_FULL.md §4.C, §7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ManifestMissing,
    ManifestReadError,
    ManifestParseError,
    ManifestValidationError,
    RegistryLoadFailed,
}

impl ErrorCategory {
    /// Fixed human-readable string keyed by category, surfaced as
    /// `RegistryMetadata.user_message`.
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::ManifestMissing => {
                "No tool manifest was found; using the built-in fallback tool list."
            }
            Self::ManifestReadError => {
                "The tool manifest could not be read; using the built-in fallback tool list."
            }
            Self::ManifestParseError => {
                "The tool manifest is not valid YAML; using the built-in fallback tool list."
            }
            Self::ManifestValidationError => {
                "The tool manifest failed schema validation; using the built-in fallback tool list."
            }
            Self::RegistryLoadFailed => {
                "The tool manifest could not be loaded; using the built-in fallback tool list."
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ManifestMissing => "manifest_missing",
            Self::ManifestReadError => "manifest_read_error",
            Self::ManifestParseError => "manifest_parse_error",
            Self::ManifestValidationError => "manifest_validation_error",
            Self::RegistryLoadFailed => "registry_load_failed",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("manifest not found at {path}")]
    ManifestMissing { path: String },
    #[error("failed to read manifest at {path}: {source}")]
    ManifestReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest at {path}: {source}")]
    ManifestParseError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("manifest at {path} failed validation: {reason}")]
    ManifestValidationError { path: String, reason: String },
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ManifestMissing { .. } => ErrorCategory::ManifestMissing,
            Self::ManifestReadError { .. } => ErrorCategory::ManifestReadError,
            Self::ManifestParseError { .. } => ErrorCategory::ManifestParseError,
            Self::ManifestValidationError { .. } => ErrorCategory::ManifestValidationError,
        }
    }
}
