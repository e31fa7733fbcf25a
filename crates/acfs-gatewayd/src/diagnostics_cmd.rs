//! `acfsd diagnostics` — dependency-aware health diagnostics over every
//! manifest tool (SPEC_FULL.md §4.E).

use acfs_core::UnavailabilityReason;
use acfs_probe::DetectedCli;
use acfs_diagnostics::diagnose;

use crate::wiring::Gateway;

async fn detect_all(gateway: &Gateway) -> Vec<DetectedCli> {
    let timeout = gateway.probe_timeout();
    let mut detected = Vec::with_capacity(gateway.registry.list_all().len());
    for tool in gateway.registry.list_all() {
        let def = Gateway::cli_definition(&tool.name);
        let result = tokio::time::timeout(timeout, gateway.detection_cache.detect(&def))
            .await
            .unwrap_or_else(|_| DetectedCli::unavailable(&tool.name, UnavailabilityReason::Timeout, timeout.as_millis() as u64));
        detected.push(result);
    }
    detected
}

pub async fn run(gateway: &Gateway, json: bool) -> anyhow::Result<()> {
    let detected = detect_all(gateway).await;
    let report = diagnose(gateway.registry.list_all(), &detected);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{}/{} tools available, {} cascade failure(s)",
        report.summary.available, report.summary.total, report.summary.cascade_failures
    );
    if !report.summary.root_cause_ids.is_empty() {
        println!("root causes: {}", report.summary.root_cause_ids.join(", "));
    }
    for tool in &report.tools {
        if tool.available {
            continue;
        }
        let reason = tool.reason_label.as_deref().unwrap_or("unknown");
        println!("- {} ({reason}): {}", tool.id, tool.explanation.as_deref().unwrap_or(""));
    }

    Ok(())
}
