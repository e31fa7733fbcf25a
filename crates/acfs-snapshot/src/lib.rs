//! Snapshot Aggregator: parallel, timeout-bounded, partially-failing
//! collection of heterogeneous subsystem states into one cached view.

pub mod agent_mail;
pub mod aggregator;
pub mod beads;
pub mod ntm;
pub mod tools;
pub mod types;

pub use aggregator::{AggregatorConfig, CacheStats, SnapshotAggregator};
pub use beads::{BeadsSource, CommandBeadsSource};
pub use ntm::{CommandNtmSource, NtmSource};
pub use types::{ComponentStatus, HealthSummary, OverallStatus, SystemSnapshot};
