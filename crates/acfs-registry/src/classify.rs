//! Derives a tool's readiness classification (SPEC_FULL.md §3).
//!
//! For any tool exactly one of `Required`/`Recommended`/`Optional` holds —
//! `Optional` is the fallback once the other two are ruled out, so the
//! three are structurally exclusive and exhaustive.

use crate::types::ToolDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Required,
    Recommended,
    Optional,
}

fn has_tag(tool: &ToolDefinition, tag: &str) -> bool {
    tool.tags.iter().any(|t| t == tag)
}

fn is_required(tool: &ToolDefinition) -> bool {
    let critical_tagged = has_tag(tool, "critical") || has_tag(tool, "required");
    let optional_not_true = tool.optional != Some(true);
    let enabled_by_default_true = tool.enabled_by_default == Some(true);
    let optional_unset = tool.optional.is_none();

    critical_tagged || (optional_not_true && enabled_by_default_true) || optional_unset
}

fn is_recommended(tool: &ToolDefinition) -> bool {
    if is_required(tool) {
        return false;
    }
    let recommended_tagged = has_tag(tool, "recommended");
    let opted_in_by_default = tool.optional == Some(true) && tool.enabled_by_default == Some(true);
    recommended_tagged || opted_in_by_default
}

pub fn classify(tool: &ToolDefinition) -> Classification {
    if is_required(tool) {
        Classification::Required
    } else if is_recommended(tool) {
        Classification::Recommended
    } else {
        Classification::Optional
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Categorized {
    pub required: Vec<ToolDefinition>,
    pub recommended: Vec<ToolDefinition>,
    pub optional: Vec<ToolDefinition>,
}

pub fn categorize<'a>(tools: impl IntoIterator<Item = &'a ToolDefinition>) -> Categorized {
    let mut out = Categorized::default();
    for tool in tools {
        match classify(tool) {
            Classification::Required => out.required.push(tool.clone()),
            Classification::Recommended => out.recommended.push(tool.clone()),
            Classification::Optional => out.optional.push(tool.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCategory;

    fn base(id: &str) -> ToolDefinition {
        ToolDefinition {
            id: id.to_string(),
            name: id.to_string(),
            category: ToolCategory::Tool,
            display_name: None,
            description: None,
            tags: vec![],
            optional: None,
            enabled_by_default: None,
            phase: None,
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
    fn unset_optional_is_required() {
        let tool = base("dcg");
        assert_eq!(classify(&tool), Classification::Required);
    }

    #[test]
    fn critical_tag_is_always_required() {
        let mut tool = base("slb");
        tool.optional = Some(true);
        tool.enabled_by_default = Some(false);
        tool.tags = vec!["critical".into()];
        assert_eq!(classify(&tool), Classification::Required);
    }

    #[test]
    fn opted_in_optional_is_recommended() {
        let mut tool = base("bv");
        tool.optional = Some(true);
        tool.enabled_by_default = Some(true);
        assert_eq!(classify(&tool), Classification::Recommended);
    }

    #[test]
    fn recommended_tag_wins_even_when_disabled_by_default() {
        let mut tool = base("cass");
        tool.optional = Some(true);
        tool.enabled_by_default = Some(false);
        tool.tags = vec!["recommended".into()];
        assert_eq!(classify(&tool), Classification::Recommended);
    }

    #[test]
    fn plain_optional_tool_is_optional() {
        let mut tool = base("experimental");
        tool.optional = Some(true);
        tool.enabled_by_default = Some(false);
        assert_eq!(classify(&tool), Classification::Optional);
    }

    #[test]
    fn exactly_one_category_holds_for_every_combination() {
        for optional in [None, Some(true), Some(false)] {
            for enabled in [None, Some(true), Some(false)] {
                for tags in [vec![], vec!["critical".to_string()], vec!["recommended".to_string()]] {
                    let mut tool = base("x");
                    tool.optional = optional;
                    tool.enabled_by_default = enabled;
                    tool.tags = tags;
                    let required = is_required(&tool);
                    let recommended = is_recommended(&tool);
                    assert!(!(required && recommended), "must not both hold");
                    let category = classify(&tool);
                    match category {
                        Classification::Required => assert!(required),
                        Classification::Recommended => assert!(recommended),
                        Classification::Optional => assert!(!required && !recommended),
                    }
                }
            }
        }
    }
}
