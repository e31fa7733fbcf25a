//! Typed errors the Maintenance Coordinator raises at its component
//! boundary (SPEC_FULL.md §7).

use crate::types::MaintenanceMode;

fn mode_label(mode: MaintenanceMode) -> &'static str {
    match mode {
        MaintenanceMode::Running => "running",
        MaintenanceMode::Maintenance => "maintenance",
        MaintenanceMode::Draining => "draining",
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceError {
    #[error("cannot enter {requested} from {current} mode, only 'running' admits this transition")]
    InvalidTransition {
        current: &'static str,
        requested: &'static str,
    },
}

impl MaintenanceError {
    pub fn invalid_transition(current: MaintenanceMode, requested: &'static str) -> Self {
        Self::InvalidTransition {
            current: mode_label(current),
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_current_mode() {
        let err = MaintenanceError::invalid_transition(MaintenanceMode::Draining, "maintenance");
        assert_eq!(
            err.to_string(),
            "cannot enter maintenance from draining mode, only 'running' admits this transition"
        );
    }
}
