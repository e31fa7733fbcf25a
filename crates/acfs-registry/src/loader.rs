//! Manifest resolution, loading, validation, and TTL caching
//! (SPEC_FULL.md §4.C, §6).

use crate::error::{ErrorCategory, RegistryError};
use crate::fallback::fallback_registry;
use crate::types::ToolRegistry;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_MANIFEST_FILENAME: &str = "acfs.manifest.yaml";
const ENV_MANIFEST_PATH: &str = "ACFS_MANIFEST_PATH";
const ENV_MANIFEST_PATH_LEGACY: &str = "TOOL_REGISTRY_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrySource {
    Manifest,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub manifest_path: String,
    pub manifest_hash: Option<String>,
    pub schema_version: String,
    pub source: Option<String>,
    pub generated_at: Option<String>,
    pub loaded_at: DateTime<Utc>,
    pub registry_source: RegistrySource,
    pub error_category: Option<ErrorCategory>,
    pub user_message: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub ttl_ms: u64,
    pub manifest_override: Option<PathBuf>,
    pub throw_on_error: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 60_000,
            manifest_override: None,
            throw_on_error: false,
        }
    }
}

/// Resolves the manifest path: explicit override → `ACFS_MANIFEST_PATH` →
/// `TOOL_REGISTRY_PATH` → `acfs.manifest.yaml` under the project root.
pub fn resolve_manifest_path(project_root: &Path, r#override: Option<&Path>) -> PathBuf {
    let raw = r#override
        .map(|p| p.to_path_buf())
        .or_else(|| std::env::var_os(ENV_MANIFEST_PATH).map(PathBuf::from))
        .or_else(|| std::env::var_os(ENV_MANIFEST_PATH_LEGACY).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILENAME));

    if raw.is_absolute() {
        raw
    } else {
        project_root.join(raw)
    }
}

fn manifest_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn validate(registry: &ToolRegistry) -> Result<(), String> {
    let mut seen_ids = std::collections::HashSet::new();
    for tool in &registry.tools {
        if tool.id.trim().is_empty() {
            return Err("tool entry has an empty id".to_string());
        }
        if tool.name.trim().is_empty() {
            return Err(format!("tool '{}' has an empty name", tool.id));
        }
        if !seen_ids.insert(tool.id.as_str()) {
            return Err(format!("duplicate tool id '{}'", tool.id));
        }
    }
    let mut seen_names: std::collections::HashSet<(crate::types::ToolCategory, &str)> =
        std::collections::HashSet::new();
    for tool in &registry.tools {
        if !seen_names.insert((tool.category, tool.name.as_str())) {
            return Err(format!(
                "duplicate tool name '{}' within category",
                tool.name
            ));
        }
    }
    Ok(())
}

fn load_from_disk(path: &Path) -> Result<ToolRegistry, RegistryError> {
    if !path.exists() {
        return Err(RegistryError::ManifestMissing {
            path: path.display().to_string(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| RegistryError::ManifestReadError {
        path: path.display().to_string(),
        source,
    })?;
    let registry: ToolRegistry =
        serde_yaml::from_slice(&bytes).map_err(|source| RegistryError::ManifestParseError {
            path: path.display().to_string(),
            source,
        })?;
    validate(&registry).map_err(|reason| RegistryError::ManifestValidationError {
        path: path.display().to_string(),
        reason,
    })?;
    Ok(registry)
}

fn build_metadata(
    path: &Path,
    registry: &ToolRegistry,
    hash: Option<String>,
    error_category: Option<ErrorCategory>,
) -> RegistryMetadata {
    RegistryMetadata {
        manifest_path: path.display().to_string(),
        manifest_hash: hash,
        schema_version: registry.schema_version.clone(),
        source: registry.source.clone(),
        generated_at: registry.generated_at.clone(),
        loaded_at: Utc::now(),
        registry_source: if error_category.is_some() {
            RegistrySource::Fallback
        } else {
            RegistrySource::Manifest
        },
        error_category,
        user_message: error_category.map(ErrorCategory::user_message),
    }
}

struct CacheEntry {
    registry: Arc<ToolRegistry>,
    metadata: RegistryMetadata,
    loaded_at: Instant,
}

#[derive(Default)]
struct RegistryCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl RegistryCache {
    fn get_if_fresh(&self, path: &Path, ttl: Duration) -> Option<(Arc<ToolRegistry>, RegistryMetadata)> {
        let entries = self.entries.read();
        let entry = entries.get(path)?;
        if entry.loaded_at.elapsed() < ttl {
            Some((entry.registry.clone(), entry.metadata.clone()))
        } else {
            None
        }
    }

    fn insert(&self, path: PathBuf, registry: Arc<ToolRegistry>, metadata: RegistryMetadata) {
        self.entries.write().insert(
            path,
            CacheEntry {
                registry,
                metadata,
                loaded_at: Instant::now(),
            },
        );
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Loads, validates, and caches the tool registry, substituting the
/// fallback bundle on failure unless `throw_on_error` is set.
pub struct ToolRegistryLoader {
    config: RegistryConfig,
    cache: RegistryCache,
}

impl ToolRegistryLoader {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            cache: RegistryCache::default(),
        }
    }

    pub fn load(
        &self,
        project_root: &Path,
        bypass_cache: bool,
    ) -> Result<(Arc<ToolRegistry>, RegistryMetadata), RegistryError> {
        let path = resolve_manifest_path(project_root, self.config.manifest_override.as_deref());

        if !bypass_cache {
            if let Some(hit) = self.cache.get_if_fresh(&path, Duration::from_millis(self.config.ttl_ms)) {
                return Ok(hit);
            }
        }

        let raw_bytes = std::fs::read(&path).ok();
        let load_result = load_from_disk(&path);

        let (registry, error_category) = match load_result {
            Ok(registry) => (registry, None),
            Err(err) => {
                if self.config.throw_on_error {
                    return Err(err);
                }
                tracing::warn!(
                    path = %path.display(),
                    category = err.category().label(),
                    "tool manifest load failed, substituting fallback registry"
                );
                (fallback_registry(), Some(err.category()))
            }
        };

        let hash = raw_bytes.as_deref().map(manifest_hash);
        let metadata = build_metadata(&path, &registry, hash, error_category);
        let arc = Arc::new(registry);
        self.cache.insert(path, arc.clone(), metadata.clone());
        Ok((arc, metadata))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
