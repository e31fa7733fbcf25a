//! Tool-health collector: composes the registry, probe, and diagnostics
//! crates into the `tools` sub-snapshot (SPEC_FULL.md §4.G — "DCG/SLB/UBS
//! status + checksum info + ecosystem detection").

use crate::types::{ComponentStatus, ToolHealthSnapshot};
use acfs_diagnostics::diagnose;
use acfs_probe::types::{Capabilities, CliDefinition, DetectedCli};
use acfs_probe::DetectionCache;
use acfs_registry::types::ToolDefinition;
use chrono::Utc;
use std::time::Duration;

/// Builds a minimal [`CliDefinition`] from a manifest [`ToolDefinition`]
/// for probing purposes: `name` is the executable basename, `--version`
/// is the conventional flag every tool in the fallback bundle supports.
fn cli_definition(tool: &ToolDefinition) -> CliDefinition {
    CliDefinition {
        name: tool.name.clone(),
        commands: vec![],
        version_flag: "--version".to_string(),
        auth_check_cmd: None,
        capabilities: Capabilities::default(),
    }
}

/// Probes every tool in the registry (through the shared detection
/// cache), runs dependency diagnostics over the results, and folds that
/// into the snapshot's tool-health status: any missing-required tool or
/// cascade failure degrades the status; otherwise healthy.
pub async fn collect_tool_health(
    tools: &[ToolDefinition],
    cache: &DetectionCache,
    probe_timeout: Duration,
) -> ToolHealthSnapshot {
    let mut detected: Vec<DetectedCli> = Vec::with_capacity(tools.len());
    for tool in tools {
        let def = cli_definition(tool);
        detected.push(tokio::time::timeout(probe_timeout, cache.detect(&def))
            .await
            .unwrap_or_else(|_| DetectedCli::unavailable(&tool.name, acfs_core::UnavailabilityReason::Timeout, probe_timeout.as_millis() as u64)));
    }

    let report = diagnose(tools, &detected);
    let required_missing = report
        .tools
        .iter()
        .zip(tools.iter())
        .filter(|(h, t)| !h.available && acfs_registry::classify_tool(t) == acfs_registry::Classification::Required)
        .count();

    let status = if required_missing > 0 {
        ComponentStatus::Unhealthy
    } else if report.summary.cascade_failures > 0 {
        ComponentStatus::Degraded
    } else {
        ComponentStatus::Healthy
    };

    ToolHealthSnapshot {
        status,
        required_missing,
        cascade_failures: report.summary.cascade_failures,
        detected_available: detected.iter().filter(|d| d.available).count(),
        detected_total: detected.len(),
        captured_at: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acfs_registry::fallback_registry;
    use std::time::Duration;

    #[tokio::test]
    async fn fallback_registry_with_nothing_detected_is_unhealthy() {
        let registry = fallback_registry();
        let cache = DetectionCache::new(Duration::from_secs(60), Duration::from_millis(200));
        let snapshot = collect_tool_health(&registry.tools, &cache, Duration::from_millis(200)).await;
        assert_eq!(snapshot.status, ComponentStatus::Unhealthy);
        assert!(snapshot.required_missing > 0);
    }
}
