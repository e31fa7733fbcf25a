//! `acfsd serve` — the long-lived process loop. A ticker periodically
//! refreshes the Snapshot Aggregator's cache and republishes it on the
//! event hub; a shutdown signal stops the ticker, moves the Maintenance
//! Coordinator into `draining`, and waits for in-flight requests to
//! reach zero (bounded by `drain_deadline_seconds`) before exiting —
//! the direct generalization of the donor's `csa-mcp-hub::serve` select
//! loop over `ctrl_c`/a `watch` shutdown channel.

use std::time::Duration;

use acfs_eventbus::{publish_if_present, Channel};
use tracing::info;

use crate::wiring::Gateway;

pub async fn run(gateway: &Gateway) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(gateway.config.monitor_interval_ms));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        monitor_interval_ms = gateway.config.monitor_interval_ms,
        "acfsd serve loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = gateway.aggregator.get_snapshot(true).await;
                publish_if_present(
                    &gateway.hub,
                    Channel::new("system"),
                    "snapshot.refreshed",
                    serde_json::json!({ "status": snapshot.summary.status }),
                    None,
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, draining in-flight requests");
                break;
            }
        }
    }

    let deadline = Duration::from_secs(gateway.config.drain_deadline_seconds);
    let _ = gateway
        .maintenance
        .start_draining(gateway.config.drain_deadline_seconds, Some("acfsd shutdown".to_string()), None);

    let drain_start = tokio::time::Instant::now();
    while gateway.maintenance.status().in_flight_requests > 0 && drain_start.elapsed() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    if gateway.maintenance.status().in_flight_requests > 0 {
        tracing::warn!(
            in_flight = gateway.maintenance.status().in_flight_requests,
            "drain deadline reached with requests still in flight"
        );
    }

    let _ = gateway.maintenance.exit_maintenance(None);
    info!("acfsd serve loop stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use acfs_maintenance::{MaintenanceCoordinator, MaintenanceMode};

    #[test]
    fn mode_after_drain_is_observable() {
        let coordinator = MaintenanceCoordinator::new(None);
        coordinator.start_draining(0, None, None).unwrap();
        assert_eq!(coordinator.status().mode, MaintenanceMode::Draining);
    }
}
