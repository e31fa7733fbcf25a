//! Detects installed agent and tool CLIs, classifies why they're
//! unavailable, and caches the results.

pub mod cache;
pub mod classify;
pub mod probe;
pub mod types;

pub use cache::DetectionCache;
pub use classify::{classify_unavailability, detect_auth_error, parse_version, ClassificationInput};
pub use probe::probe_cli;
pub use types::{Capabilities, CliDefinition, DetectedCli, DetectionSnapshot, DetectionSummary};
