//! Process bootstrap: constructs every coordination core explicitly at
//! startup and hands back owned handles (SPEC_FULL.md §9 "avoid hidden
//! globals" — no `lazy_static`/process-wide singletons; every component
//! is built once here and threaded through by `Arc`, the same way
//! `cli-sub-agent::main` constructs its registries and clients inline
//! rather than behind statics).

use std::sync::Arc;
use std::time::Duration;

use acfs_context::ContextHealthEngine;
use acfs_eventbus::{Hub, HubConfig, SharedHub};
use acfs_maintenance::MaintenanceCoordinator;
use acfs_probe::{CliDefinition, Capabilities, DetectionCache};
use acfs_registry::{ToolRegistry, ToolRegistryLoader};
use acfs_snapshot::{AggregatorConfig, CommandBeadsSource, CommandNtmSource, SnapshotAggregator};

use crate::config::GatewayConfig;

pub struct Gateway {
    pub config: GatewayConfig,
    pub hub: SharedHub,
    pub registry: Arc<ToolRegistry>,
    pub registry_loader: Arc<ToolRegistryLoader>,
    pub detection_cache: Arc<DetectionCache>,
    pub aggregator: Arc<SnapshotAggregator>,
    pub context: Arc<ContextHealthEngine>,
    pub maintenance: Arc<MaintenanceCoordinator>,
}

impl Gateway {
    /// Builds a minimal probe [`CliDefinition`] from a manifest entry
    /// (name is the executable basename, `--version` is the convention
    /// every fallback-bundle tool honors) — the same shape `acfs-snapshot`
    /// builds internally for its own tool-health collector.
    pub fn cli_definition(name: &str) -> CliDefinition {
        CliDefinition {
            name: name.to_string(),
            commands: vec![],
            version_flag: "--version".to_string(),
            auth_check_cmd: None,
            capabilities: Capabilities::default(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.config.probe.probe_timeout_ms)
    }
}

pub fn bootstrap(config: GatewayConfig) -> anyhow::Result<Gateway> {
    let hub: SharedHub = Some(Arc::new(Hub::new(HubConfig::from(config.hub.clone()))));

    let registry_loader = Arc::new(ToolRegistryLoader::new(config.registry.clone().into()));
    let (registry, metadata) = registry_loader.load(&config.cwd, false)?;
    tracing::info!(
        source = ?metadata.registry_source,
        tools = registry.list_all().len(),
        "tool registry loaded"
    );

    let detection_cache = Arc::new(DetectionCache::new(
        Duration::from_millis(config.probe.detection_ttl_ms),
        Duration::from_millis(config.probe.probe_timeout_ms),
    ));

    let aggregator_config = AggregatorConfig {
        cache_ttl_ms: config.aggregator.cache_ttl_ms,
        collection_timeout_ms: config.aggregator.collection_timeout_ms,
        cwd: config.cwd.clone(),
        mail_subdir: config.aggregator.mail_subdir.clone(),
    };
    let aggregator = Arc::new(SnapshotAggregator::new(
        aggregator_config,
        registry.clone(),
        detection_cache.clone(),
        Arc::new(CommandNtmSource::default()),
        Arc::new(CommandBeadsSource),
    ));

    let context = Arc::new(ContextHealthEngine::new(config.context.clone(), hub.clone()));
    let maintenance = Arc::new(MaintenanceCoordinator::new(hub.clone()));

    Ok(Gateway {
        config,
        hub,
        registry,
        registry_loader,
        detection_cache,
        aggregator,
        context,
        maintenance,
    })
}
