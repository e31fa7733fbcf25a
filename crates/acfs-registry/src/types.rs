//! Manifest-driven tool catalog data model (SPEC_FULL.md §3, §6).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Agent,
    Tool,
}

/// A single entry in the manifest, immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    pub category: ToolCategory,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub enabled_by_default: Option<bool>,
    #[serde(default)]
    pub phase: Option<i64>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub docs_url: Option<String>,
    #[serde(default)]
    pub install: Vec<InstallSpec>,
    #[serde(default)]
    pub verified_installer: Option<VerifiedInstaller>,
    #[serde(default)]
    pub verify: Option<VerifySpec>,
    #[serde(default)]
    pub installed_check: Option<InstalledCheckSpec>,
    #[serde(default)]
    pub checksums: HashMap<String, String>,
    #[serde(default)]
    pub robot_mode: Option<bool>,
    #[serde(default)]
    pub mcp: Option<serde_json::Value>,
}

impl ToolDefinition {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Default phase bucket for tools with no explicit `phase`.
    pub fn phase_or_default(&self) -> i64 {
        self.phase.unwrap_or(999)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub requires_sudo: bool,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedInstaller {
    pub runner: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub fallback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySpec {
    pub command: Vec<String>,
    #[serde(default)]
    pub expected_exit_codes: Vec<i32>,
    #[serde(default)]
    pub min_version: Option<String>,
    #[serde(default)]
    pub version_regex: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledCheckSpec {
    pub command: Vec<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Root manifest object (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRegistry {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

pub fn default_schema_version() -> String {
    "1.0.0".to_string()
}

impl ToolRegistry {
    pub fn find(&self, id: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.id == id)
    }
}
