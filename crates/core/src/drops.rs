//! Block-break drop rules.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ItemSpec;

/// Tool families that drop rules can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// Any pickaxe.
    Pickaxe,
    /// Any axe.
    Axe,
    /// Any shovel.
    Shovel,
    /// Any hoe.
    Hoe,
    /// Shears.
    Shears,
}

impl ToolCategory {
    /// Parse a category name (e.g. "pickaxe"), case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pickaxe" => Some(ToolCategory::Pickaxe),
            "axe" => Some(ToolCategory::Axe),
            "shovel" => Some(ToolCategory::Shovel),
            "hoe" => Some(ToolCategory::Hoe),
            "shears" => Some(ToolCategory::Shears),
            _ => None,
        }
    }

    /// Classify a held material (e.g. `diamond_pickaxe`).
    pub fn from_material(material: &str) -> Option<Self> {
        let name = material.to_ascii_uppercase();
        if name.ends_with("_PICKAXE") {
            Some(ToolCategory::Pickaxe)
        } else if name.ends_with("_AXE") {
            Some(ToolCategory::Axe)
        } else if name.ends_with("_SHOVEL") {
            Some(ToolCategory::Shovel)
        } else if name.ends_with("_HOE") {
            Some(ToolCategory::Hoe)
        } else if name == "SHEARS" {
            Some(ToolCategory::Shears)
        } else {
            None
        }
    }
}

/// One `on_break` rule: conditions plus the items dropped when they hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropRule {
    /// Raw conditions; `silk_touch` and `tool` are evaluated, other keys are informational.
    pub when: IndexMap<String, Value>,
    /// Items dropped when the rule matches.
    pub drops: Vec<ItemSpec>,
}

impl DropRule {
    /// Required silk-touch state, if constrained.
    pub fn silk_touch(&self) -> Option<bool> {
        self.when.get("silk_touch").and_then(Value::as_bool)
    }

    /// Required tool family, if constrained by a recognised name.
    pub fn tool(&self) -> Option<ToolCategory> {
        self.when
            .get("tool")
            .and_then(Value::as_str)
            .and_then(ToolCategory::parse)
    }

    /// Evaluate the rule for a break event.
    pub fn matches(&self, silk_touch: bool, tool: Option<ToolCategory>) -> bool {
        if self.silk_touch().is_some_and(|required| required != silk_touch) {
            return false;
        }
        if let Some(required) = self.tool() {
            if tool != Some(required) {
                return false;
            }
        }
        true
    }

    /// Human readable condition, `Always` for an unconditional rule.
    pub fn describe_condition(&self) -> String {
        if self.when.is_empty() {
            return "Always".to_string();
        }
        self.when
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{} = {}", key.replace('_', " "), value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Drop configuration for a head block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drops {
    /// Rules evaluated in order when the block is broken.
    pub on_break: Vec<DropRule>,
}

impl Drops {
    /// Items dropped for a break event; the first matching rule wins.
    ///
    /// Returns `None` when no rule matches, in which case the block drops itself.
    pub fn resolve(&self, silk_touch: bool, tool: Option<ToolCategory>) -> Option<&[ItemSpec]> {
        self.on_break
            .iter()
            .find(|rule| rule.matches(silk_touch, tool))
            .map(|rule| rule.drops.as_slice())
    }

    /// Returns true when no rule is configured.
    pub fn is_empty(&self) -> bool {
        self.on_break.is_empty()
    }
}
