//! Context Health Engine: per-session token-budget tracking with
//! graduated interventions (warn → compact/summarize → rotate with
//! transfer).

mod compaction;
mod config;
mod engine;
mod errors;
mod redact;
mod rotation;
mod tokens;
mod types;

pub use compaction::CompactOptions;
pub use config::{ContextHealthConfig, Thresholds};
pub use engine::ContextHealthEngine;
pub use errors::{ContextHealthError, RotationError, SummarizationError};
pub use rotation::RotationInputs;
pub use tokens::{count_tokens, split_into_chunks, truncate_to_tokens};
pub use types::{
    CompactStrategy, CompactionResult, ContextHealth, ContextTransfer, HealthStatus, Message, Recommendation,
    RecommendedAction, RotationResult, SessionState, SessionStatus, TokenHistoryEntry, Urgency,
};
