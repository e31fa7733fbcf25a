//! `acfsd maintenance` — inspect or drive the Maintenance Coordinator's
//! running/maintenance/draining state machine (SPEC_FULL.md §4.I).

use acfs_maintenance::MaintenanceError;

use crate::cli::MaintenanceCommands;
use crate::wiring::Gateway;

fn print_status(status: &acfs_maintenance::MaintenanceStatus, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }
    println!("mode: {:?}", status.mode);
    if let Some(reason) = &status.reason {
        println!("reason: {reason}");
    }
    if let Some(retry) = status.retry_after_seconds {
        println!("retry_after_seconds: {retry}");
    }
    println!("in_flight_requests: {}", status.in_flight_requests);
    Ok(())
}

pub fn run(gateway: &Gateway, cmd: MaintenanceCommands, json: bool) -> anyhow::Result<()> {
    let result = match cmd {
        MaintenanceCommands::Status => Ok(gateway.maintenance.status()),
        MaintenanceCommands::Enter { reason } => gateway.maintenance.enter_maintenance(reason, None),
        MaintenanceCommands::Drain { seconds, reason } => gateway.maintenance.start_draining(seconds, reason, None),
        MaintenanceCommands::Exit => Ok(gateway.maintenance.exit_maintenance(None)),
    };

    match result {
        Ok(status) => print_status(&status, json),
        Err(err @ MaintenanceError::InvalidTransition { .. }) => {
            anyhow::bail!(err);
        }
    }
}
