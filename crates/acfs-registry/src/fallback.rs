//! Built-in fallback registry substituted whenever manifest load fails
//! (SPEC_FULL.md §3, §4.C).

use crate::types::{ToolCategory, ToolDefinition, ToolRegistry};

fn critical_tool(id: &str, name: &str, category: ToolCategory) -> ToolDefinition {
    ToolDefinition {
        id: id.to_string(),
        name: name.to_string(),
        category,
        display_name: None,
        description: None,
        tags: vec!["critical".to_string()],
        optional: Some(false),
        enabled_by_default: Some(true),
        phase: Some(0),
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

/// The built-in minimal bundle of critical tools used when the manifest
/// cannot be loaded: `agents.claude, tools.dcg, tools.slb, tools.ubs,
/// tools.br, tools.bv`.
pub fn fallback_registry() -> ToolRegistry {
    ToolRegistry {
        schema_version: crate::types::default_schema_version(),
        source: Some("fallback".to_string()),
        generated_at: None,
        tools: vec![
            critical_tool("agents.claude", "claude-code", ToolCategory::Agent),
            critical_tool("tools.dcg", "dcg", ToolCategory::Tool),
            critical_tool("tools.slb", "slb", ToolCategory::Tool),
            critical_tool("tools.ubs", "ubs", ToolCategory::Tool),
            critical_tool("tools.br", "br", ToolCategory::Tool),
            critical_tool("tools.bv", "bv", ToolCategory::Tool),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_contains_the_documented_critical_tools() {
        let registry = fallback_registry();
        let ids: Vec<&str> = registry.tools.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "agents.claude",
                "tools.dcg",
                "tools.slb",
                "tools.ubs",
                "tools.br",
                "tools.bv",
            ]
        );
    }

    #[test]
    fn every_fallback_tool_is_required() {
        let registry = fallback_registry();
        for tool in &registry.tools {
            assert_eq!(crate::classify::classify(tool), crate::classify::Classification::Required);
        }
    }
}
