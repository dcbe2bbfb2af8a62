use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Links;

/// Scope descriptor: scope kind (`Environment`, `Role`, ...) to the ids it is limited to.
pub type ScopeSpecification = BTreeMap<String, Vec<String>>;

/// A project's versioned variable collection.
///
/// Writes are optimistically concurrent: the server rejects a modify whose
/// `version` does not match the stored one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableSetResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub variables: Vec<VariableResource>,
    #[serde(default)]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single named value, optionally scoped.
///
/// When `is_sensitive` is set the REST layer never returns the real value;
/// `value` is then `None` or a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VariableResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub scope: ScopeSpecification,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default = "default_editable")]
    pub is_editable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_editable() -> bool {
    true
}

impl VariableResource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: Some(value.into()),
            scope: ScopeSpecification::new(),
            is_sensitive: false,
            is_editable: true,
            extra: Map::new(),
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.is_sensitive = true;
        self
    }
}
