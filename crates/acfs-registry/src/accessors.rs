//! Read-only views over a loaded [`ToolRegistry`] (SPEC_FULL.md §4.C).

use crate::classify::{categorize, classify, Categorized, Classification};
use crate::types::{ToolCategory, ToolDefinition, ToolRegistry};

impl ToolRegistry {
    pub fn list_all(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn list_agent(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().filter(|t| t.category == ToolCategory::Agent).collect()
    }

    pub fn list_setup(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().filter(|t| t.category == ToolCategory::Tool).collect()
    }

    pub fn get_required(&self) -> Vec<&ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| classify(t) == Classification::Required)
            .collect()
    }

    pub fn get_recommended(&self) -> Vec<&ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| classify(t) == Classification::Recommended)
            .collect()
    }

    pub fn get_optional(&self) -> Vec<&ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| classify(t) == Classification::Optional)
            .collect()
    }

    pub fn categorize_tools(&self) -> Categorized {
        categorize(&self.tools)
    }

    /// Groups tools by `phase` (default bucket 999), sorted ascending.
    /// Within a phase, tools keep registry order (stable sort).
    pub fn get_tools_by_phase(&self) -> Vec<(i64, Vec<&ToolDefinition>)> {
        let mut phases: Vec<i64> = self.tools.iter().map(|t| t.phase_or_default()).collect();
        phases.sort_unstable();
        phases.dedup();

        phases
            .into_iter()
            .map(|phase| {
                let tools: Vec<&ToolDefinition> = self
                    .tools
                    .iter()
                    .filter(|t| t.phase_or_default() == phase)
                    .collect();
                (phase, tools)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolDefinition;

    fn tool(id: &str, phase: Option<i64>) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: id.to_string(),
            category: ToolCategory::Tool,
            display_name: None,
            description: None,
            tags: vec![],
            optional: None,
            enabled_by_default: None,
            phase,
            depends: vec![],
            docs_url: None,
            install: vec![],
            verified_installer: None,
            verify: None,
            installed_check: None,
            checksums: Default::default(),
            robot_mode: None,
            mcp: None,
        }
    }

    #[test]
    fn phases_are_sorted_ascending_with_default_bucket_last() {
        let registry = ToolRegistry {
            schema_version: "1.0.0".into(),
            source: None,
            generated_at: None,
            tools: vec![tool("c", None), tool("a", Some(1)), tool("b", Some(0))],
        };
        let grouped = registry.get_tools_by_phase();
        let phases: Vec<i64> = grouped.iter().map(|(p, _)| *p).collect();
        assert_eq!(phases, vec![0, 1, 999]);
        assert_eq!(grouped[2].1[0].id, "c");
    }

    #[test]
    fn phase_tie_break_preserves_registry_order() {
        let registry = ToolRegistry {
            schema_version: "1.0.0".into(),
            source: None,
            generated_at: None,
            tools: vec![tool("second", Some(1)), tool("first", Some(1))],
        };
        let grouped = registry.get_tools_by_phase();
        let ids: Vec<&str> = grouped[0].1.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["second", "first"]);
    }
}
