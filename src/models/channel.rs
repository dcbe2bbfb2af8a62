use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Links;

/// Name of the channel every new project receives from the server.
///
/// Import must never create a channel with this name; it would duplicate the
/// one the server already provisioned.
pub const DEFAULT_CHANNEL_NAME: &str = "Default";

/// A release stream scoping which versions may deploy through a lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChannelResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub lifecycle_id: Option<String>,
    #[serde(default)]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChannelResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            project_id: String::new(),
            name: name.into(),
            description: None,
            is_default: false,
            lifecycle_id: None,
            links: Links::default(),
            extra: Map::new(),
        }
    }

    pub fn is_implicit_default(&self) -> bool {
        self.name == DEFAULT_CHANNEL_NAME
    }
}
