//! `acfsd plan` — diffs the tool registry against detection results and
//! prints the phased install plan or its runnable `installScript`
//! (SPEC_FULL.md §4.F).

use acfs_core::UnavailabilityReason;
use acfs_planner::{format_install_script, plan, DetectedTool};
use acfs_probe::DetectedCli;

use crate::wiring::Gateway;

async fn detect_all(gateway: &Gateway) -> Vec<DetectedTool> {
    let timeout = gateway.probe_timeout();
    let mut out = Vec::with_capacity(gateway.registry.list_all().len());
    for tool in gateway.registry.list_all() {
        let def = Gateway::cli_definition(&tool.name);
        let detected: DetectedCli = tokio::time::timeout(timeout, gateway.detection_cache.detect(&def))
            .await
            .unwrap_or_else(|_| DetectedCli::unavailable(&tool.name, UnavailabilityReason::Timeout, timeout.as_millis() as u64));
        out.push(DetectedTool {
            name: detected.name,
            available: detected.available,
            version: detected.version,
            error: detected.auth_error.or_else(|| detected.unavailability_reason.map(|r| r.label().to_string())),
        });
    }
    out
}

pub async fn run(gateway: &Gateway, script: bool, json: bool) -> anyhow::Result<()> {
    let detected = detect_all(gateway).await;
    let install_plan = plan(gateway.registry.list_all(), &detected);

    if script {
        print!("{}", format_install_script(&install_plan));
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&install_plan)?);
        return Ok(());
    }

    println!(
        "ready: {} ({} installed, {} missing required, {} missing optional)",
        install_plan.ready, install_plan.installed, install_plan.missing_required, install_plan.missing_optional
    );
    for entry in &install_plan.entries {
        println!("- [{:?}] {} (phase {})", entry.status, entry.display_name, entry.phase);
    }

    Ok(())
}
