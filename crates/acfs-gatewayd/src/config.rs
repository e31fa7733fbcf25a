//! Layered configuration: one explicit record per coordination core
//! (SPEC_FULL.md §6 REDESIGN FLAGS: "migrate dynamic config objects to
//! explicit configuration records"), loaded from `acfs.toml` the same
//! way the donor's `csa-config::ProjectConfig` loads `.csa/config.toml`
//! via `toml::from_str`, then layered under the environment variables
//! from SPEC_FULL.md §6.

use std::path::{Path, PathBuf};

use acfs_context::ContextHealthConfig;
use acfs_eventbus::HubConfig;
use acfs_registry::RegistryConfig;
use acfs_snapshot::AggregatorConfig;
use serde::{Deserialize, Serialize};

const ENV_CONFIG_PATH: &str = "ACFS_CONFIG_PATH";
const ENV_MANIFEST_TTL_MS: &str = "ACFS_MANIFEST_TTL_MS";
const ENV_MANIFEST_TTL_MS_LEGACY: &str = "TOOL_REGISTRY_TTL_MS";
const DEFAULT_CONFIG_FILENAME: &str = "acfs.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub detection_ttl_ms: u64,
    pub probe_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            detection_ttl_ms: 60_000,
            probe_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubToml {
    pub backlog_capacity: usize,
    pub backlog_ttl_ms: u64,
    pub subscriber_queue_capacity: usize,
}

impl Default for HubToml {
    fn default() -> Self {
        let defaults = HubConfig::default();
        Self {
            backlog_capacity: defaults.backlog_capacity,
            backlog_ttl_ms: defaults.backlog_ttl_ms,
            subscriber_queue_capacity: defaults.subscriber_queue_capacity,
        }
    }
}

impl From<HubToml> for HubConfig {
    fn from(value: HubToml) -> Self {
        HubConfig {
            backlog_capacity: value.backlog_capacity,
            backlog_ttl_ms: value.backlog_ttl_ms,
            subscriber_queue_capacity: value.subscriber_queue_capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryToml {
    pub ttl_ms: u64,
    pub manifest_override: Option<PathBuf>,
    pub throw_on_error: bool,
}

impl Default for RegistryToml {
    fn default() -> Self {
        let defaults = RegistryConfig::default();
        Self {
            ttl_ms: defaults.ttl_ms,
            manifest_override: defaults.manifest_override,
            throw_on_error: defaults.throw_on_error,
        }
    }
}

impl From<RegistryToml> for RegistryConfig {
    fn from(value: RegistryToml) -> Self {
        RegistryConfig {
            ttl_ms: value.ttl_ms,
            manifest_override: value.manifest_override,
            throw_on_error: value.throw_on_error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorToml {
    pub cache_ttl_ms: u64,
    pub collection_timeout_ms: u64,
    pub mail_subdir: PathBuf,
}

impl Default for AggregatorToml {
    fn default() -> Self {
        let defaults = AggregatorConfig::default();
        Self {
            cache_ttl_ms: defaults.cache_ttl_ms,
            collection_timeout_ms: defaults.collection_timeout_ms,
            mail_subdir: defaults.mail_subdir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Project root every relative path (manifest, Agent Mail folder) is
    /// resolved against. Defaults to the current working directory at
    /// startup.
    #[serde(skip)]
    pub cwd: PathBuf,
    pub registry: RegistryToml,
    pub probe: ProbeConfig,
    pub aggregator: AggregatorToml,
    pub context: ContextHealthConfig,
    pub hub: HubToml,
    /// Interval between the gatewayd `serve` loop's background snapshot
    /// refresh ticks.
    pub monitor_interval_ms: u64,
    /// Seconds a `serve` shutdown spends draining in-flight requests
    /// before exiting unconditionally.
    pub drain_deadline_seconds: u64,
}

fn default_monitor_interval_ms() -> u64 {
    30_000
}

fn default_drain_deadline_seconds() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            registry: RegistryToml::default(),
            probe: ProbeConfig::default(),
            aggregator: AggregatorToml::default(),
            context: ContextHealthConfig::default(),
            hub: HubToml::default(),
            monitor_interval_ms: default_monitor_interval_ms(),
            drain_deadline_seconds: default_drain_deadline_seconds(),
        }
    }
}

impl GatewayConfig {
    fn with_defaults(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Self::default()
        }
    }

    /// Resolves the config file path (`ACFS_CONFIG_PATH` env override,
    /// else `acfs.toml` under the project root), parses it if present,
    /// then layers the manifest-TTL environment variables from
    /// SPEC_FULL.md §6 on top — mirroring the donor's own env-over-file
    /// precedent in `csa-config`.
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let mut config = Self::with_defaults(project_root.to_path_buf());

        let config_path = std::env::var_os(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| project_root.join(DEFAULT_CONFIG_FILENAME));

        if config_path.exists() {
            let raw = std::fs::read_to_string(&config_path)?;
            let parsed: GatewayConfig = toml::from_str(&raw)?;
            config.registry = parsed.registry;
            config.probe = parsed.probe;
            config.aggregator = parsed.aggregator;
            config.context = parsed.context;
            config.hub = parsed.hub;
            config.monitor_interval_ms = parsed.monitor_interval_ms;
            config.drain_deadline_seconds = parsed.drain_deadline_seconds;
            tracing::debug!(path = %config_path.display(), "loaded gatewayd config");
        }

        if let Some(ttl) = env_u64(ENV_MANIFEST_TTL_MS).or_else(|| env_u64(ENV_MANIFEST_TTL_MS_LEGACY)) {
            config.registry.ttl_ms = ttl;
        }

        Ok(config)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = GatewayConfig::with_defaults(PathBuf::from("."));
        let rendered = toml::to_string(&config).unwrap();
        let parsed: GatewayConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.monitor_interval_ms, config.monitor_interval_ms);
        assert_eq!(parsed.registry.ttl_ms, config.registry.ttl_ms);
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load(dir.path()).unwrap();
        assert_eq!(config.registry.ttl_ms, RegistryConfig::default().ttl_ms);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("acfs.toml"),
            "monitor_interval_ms = 5000\n[registry]\nttl_ms = 1234\n",
        )
        .unwrap();
        let config = GatewayConfig::load(dir.path()).unwrap();
        assert_eq!(config.monitor_interval_ms, 5000);
        assert_eq!(config.registry.ttl_ms, 1234);
    }

    #[test]
    fn env_ttl_overrides_file_value() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("acfs.toml"), "[registry]\nttl_ms = 1234\n").unwrap();
        // SAFETY: test-local env var, no other test in this process reads it concurrently.
        unsafe { std::env::set_var(ENV_MANIFEST_TTL_MS, "9999") };
        let config = GatewayConfig::load(dir.path()).unwrap();
        unsafe { std::env::remove_var(ENV_MANIFEST_TTL_MS) };
        assert_eq!(config.registry.ttl_ms, 9999);
    }
}
