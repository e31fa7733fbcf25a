//! Manifest-driven tool catalog: load, validate, cache, classify.

pub mod accessors;
pub mod classify;
pub mod error;
pub mod fallback;
pub mod loader;
pub mod types;

pub use classify::{categorize, classify as classify_tool, Categorized, Classification};
pub use error::{ErrorCategory, RegistryError};
pub use fallback::fallback_registry;
pub use loader::{resolve_manifest_path, RegistryConfig, RegistryMetadata, RegistrySource, ToolRegistryLoader};
pub use types::{
    InstallSpec, InstalledCheckSpec, ToolCategory, ToolDefinition, ToolRegistry, VerifiedInstaller, VerifySpec,
};
