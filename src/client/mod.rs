//! Client for the deployment server's REST API.
//!
//! [`OctopusApi`] is the seam the transfer workflows are written against;
//! [`OctopusClient`] is the HTTP implementation used by the binary.

mod http;

pub use http::OctopusClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::*;

/// Remote API errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key missing or invalid")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    Server(String),
}

/// CRUD over the project graph on the deployment server.
#[async_trait]
pub trait OctopusApi: Send + Sync {
    /// Look up a project by its exact name.
    async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectResource>, ClientError>;

    /// Create a project. The server assigns the project, variable set and process ids.
    async fn create_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError>;

    async fn modify_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError>;

    async fn delete_project(&self, project: &ProjectResource) -> Result<(), ClientError>;

    async fn get_variable_set(&self, id: &str) -> Result<VariableSetResource, ClientError>;

    /// Replace a variable set. Rejected when `version` is not the stored version.
    async fn modify_variable_set(
        &self,
        variables: &VariableSetResource,
    ) -> Result<VariableSetResource, ClientError>;

    async fn get_deployment_process(&self, id: &str) -> Result<DeploymentProcessResource, ClientError>;

    /// Replace a deployment process. Rejected when `version` is not the stored version.
    async fn modify_deployment_process(
        &self,
        process: &DeploymentProcessResource,
    ) -> Result<DeploymentProcessResource, ClientError>;

    async fn get_channels(
        &self,
        project: &ProjectResource,
    ) -> Result<ResourceCollection<ChannelResource>, ClientError>;

    async fn create_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError>;

    async fn modify_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError>;
}
