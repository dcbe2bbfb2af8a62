use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Links;

/// A deployable project.
///
/// The server provisions the variable set and deployment process when the
/// project is created; a project only ever references them by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectResource {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub variable_set_id: String,
    #[serde(default)]
    pub deployment_process_id: String,
    #[serde(default)]
    pub links: Links,
    /// Server fields not modelled here, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            slug: String::new(),
            variable_set_id: String::new(),
            deployment_process_id: String::new(),
            links: Links::default(),
            extra: Map::new(),
        }
    }

    /// The identifier of the deployment process the server derives for this project.
    pub fn derived_process_id(&self) -> String {
        format!("deploymentprocess-{}", self.id)
    }
}
