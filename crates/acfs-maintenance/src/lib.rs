//! Maintenance Coordinator: process-wide running/maintenance/draining
//! state and request-admission gating.

mod coordinator;
mod errors;
mod types;

pub use coordinator::{MaintenanceCoordinator, RequestGuard};
pub use errors::MaintenanceError;
pub use types::{MaintenanceMode, MaintenanceState, MaintenanceStatus};
