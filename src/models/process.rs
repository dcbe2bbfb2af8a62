use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Links;

/// The ordered steps describing how a project is deployed.
///
/// Versioned like [`super::VariableSetResource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentProcessResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub steps: Vec<DeploymentStepResource>,
    #[serde(default)]
    pub links: Links,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentStepResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// When the step runs (`Success`, `Failure`, `Always`, `Variable`).
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub actions: Vec<DeploymentActionResource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentActionResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub action_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeploymentStepResource {
    pub fn new(name: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            condition: condition.into(),
            actions: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_action(mut self, name: impl Into<String>, action_type: impl Into<String>) -> Self {
        self.actions.push(DeploymentActionResource {
            id: String::new(),
            name: name.into(),
            action_type: action_type.into(),
            extra: Map::new(),
        });
        self
    }
}
