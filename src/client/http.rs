//! HTTP implementation of [`OctopusApi`].
//!
//! Modify and delete calls target the resource's `Self` link when it has one,
//! falling back to the collection route plus id.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ClientError, OctopusApi};
use crate::config::Config;
use crate::models::*;

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-Octopus-ApiKey";

#[derive(Debug, Clone)]
pub struct OctopusClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OctopusClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.server_url, &config.api_key)
    }

    /// Resolve a path or link against the base URL. Absolute URLs pass through.
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        tracing::debug!("{} {}", method, path);
        self.client
            .request(method, self.url(path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::status_error(status, response.text().await.unwrap_or_default()))
        }
    }

    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status, response.text().await.unwrap_or_default()))
        }
    }

    fn status_error(status: StatusCode, body: String) -> ClientError {
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::CONFLICT => ClientError::Conflict(body),
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        self.handle_response(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(method, path).json(body).send().await?;
        self.handle_response(response).await
    }
}

/// The `Self` link when present, otherwise `{collection}/{id}`.
fn target(links: &Links, collection: &str, id: &str) -> String {
    links
        .self_link()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}/{}", collection, id))
}

#[async_trait]
impl OctopusApi for OctopusClient {
    async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectResource>, ClientError> {
        let projects: Vec<ProjectResource> = self.get("/api/projects/all").await?;
        Ok(projects.into_iter().find(|p| p.name == name))
    }

    async fn create_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError> {
        self.send_json(Method::POST, "/api/projects", project).await
    }

    async fn modify_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError> {
        let path = target(&project.links, "/api/projects", &project.id);
        self.send_json(Method::PUT, &path, project).await
    }

    async fn delete_project(&self, project: &ProjectResource) -> Result<(), ClientError> {
        let path = target(&project.links, "/api/projects", &project.id);
        let response = self.request(Method::DELETE, &path).send().await?;
        self.handle_empty_response(response).await
    }

    async fn get_variable_set(&self, id: &str) -> Result<VariableSetResource, ClientError> {
        self.get(&format!("/api/variables/{}", id)).await
    }

    async fn modify_variable_set(
        &self,
        variables: &VariableSetResource,
    ) -> Result<VariableSetResource, ClientError> {
        let path = target(&variables.links, "/api/variables", &variables.id);
        self.send_json(Method::PUT, &path, variables).await
    }

    async fn get_deployment_process(&self, id: &str) -> Result<DeploymentProcessResource, ClientError> {
        self.get(&format!("/api/deploymentprocesses/{}", id)).await
    }

    async fn modify_deployment_process(
        &self,
        process: &DeploymentProcessResource,
    ) -> Result<DeploymentProcessResource, ClientError> {
        let path = target(&process.links, "/api/deploymentprocesses", &process.id);
        self.send_json(Method::PUT, &path, process).await
    }

    async fn get_channels(
        &self,
        project: &ProjectResource,
    ) -> Result<ResourceCollection<ChannelResource>, ClientError> {
        let path = project
            .links
            .get("Channels")
            .map(strip_template)
            .unwrap_or_else(|| format!("/api/projects/{}/channels", project.id));
        self.get(&path).await
    }

    async fn create_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError> {
        self.send_json(Method::POST, "/api/channels", channel).await
    }

    async fn modify_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError> {
        let path = target(&channel.links, "/api/channels", &channel.id);
        self.send_json(Method::PUT, &path, channel).await
    }
}

/// Drop a URI template suffix such as `{?skip,take}` from a link.
fn strip_template(link: &str) -> String {
    match link.find('{') {
        Some(idx) => link[..idx].to_string(),
        None => link.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_links_resolve_against_base_url() {
        let client = OctopusClient::new("http://octopus.local/", "API-KEY");
        assert_eq!(
            client.url("/api/projects/Projects-1"),
            "http://octopus.local/api/projects/Projects-1"
        );
        assert_eq!(
            client.url("https://elsewhere/api/x"),
            "https://elsewhere/api/x"
        );
    }

    #[test]
    fn modify_target_prefers_self_link() {
        let mut links = Links::default();
        assert_eq!(target(&links, "/api/channels", "Channels-3"), "/api/channels/Channels-3");

        links.set_self("/api/channels/Channels-9");
        assert_eq!(target(&links, "/api/channels", "Channels-3"), "/api/channels/Channels-9");
    }

    #[test]
    fn strips_uri_templates() {
        assert_eq!(
            strip_template("/api/projects/Projects-1/channels{?skip,take}"),
            "/api/projects/Projects-1/channels"
        );
        assert_eq!(strip_template("/api/channels"), "/api/channels");
    }
}
