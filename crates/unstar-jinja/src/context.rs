//! dbt context for Jinja templates
//!
//! Variables visible to templates while rendering model SQL.

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use minijinja::Value as MinijinjaValue;

/// dbt context for Jinja rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbtContext {
    /// Project variables (`{{ var('name') }}` falls back to its default when absent)
    pub vars: HashMap<String, serde_json::Value>,

    /// Target configuration (dev, prod, etc.)
    pub target: TargetContext,
}

/// Target context (database connection info)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetContext {
    pub name: String,
    pub schema: String,
    #[serde(rename = "type")]
    pub target_type: String,
}

impl DbtContext {
    /// Add a project variable
    pub fn add_var(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.vars.insert(key.into(), value);
        self
    }

    /// Convert to MiniJinja value for rendering
    pub fn to_minijinja_value(&self) -> MinijinjaValue {
        MinijinjaValue::from_serialize(self)
    }
}

impl Default for TargetContext {
    fn default() -> Self {
        Self {
            name: "dev".to_string(),
            schema: "public".to_string(),
            target_type: "postgres".to_string(),
        }
    }
}
