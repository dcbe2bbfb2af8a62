//! In-memory deployment server for transfer tests.
//!
//! Behaves like the real REST layer where the workflows depend on it:
//! projects come with a provisioned variable set, process and `Default`
//! channel; variable sets and processes reject modifies with a stale
//! version; sensitive values are never returned by reads.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use project_porter::client::{ClientError, OctopusApi};
use project_porter::models::*;
use project_porter::secrets::SqliteSecretStore;

#[derive(Default)]
struct State {
    next_id: u32,
    projects: Vec<ProjectResource>,
    variable_sets: BTreeMap<String, VariableSetResource>,
    processes: BTreeMap<String, DeploymentProcessResource>,
    channels: Vec<ChannelResource>,
    calls: Vec<String>,
    failing_channels: BTreeSet<String>,
    bump_variables_on_read: bool,
}

#[derive(Default)]
pub struct FakeOctopus {
    state: Mutex<State>,
}

impl FakeOctopus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a project and fill its variable set, process and extra channels.
    pub fn seed_project(
        &self,
        name: &str,
        variables: Vec<VariableResource>,
        steps: Vec<DeploymentStepResource>,
        channels: Vec<ChannelResource>,
    ) -> ProjectResource {
        let mut state = self.state.lock().unwrap();
        let project = provision(&mut state, ProjectResource::new(name));

        let set = state.variable_sets.get_mut(&project.variable_set_id).unwrap();
        set.variables = variables;
        set.version = 1;

        let process = state.processes.get_mut(&project.deployment_process_id).unwrap();
        process.steps = steps;
        process.version = 1;

        for mut channel in channels {
            state.next_id += 1;
            channel.id = format!("Channels-{}", state.next_id);
            channel.project_id = project.id.clone();
            channel.links.set_self(format!("/api/channels/{}", channel.id));
            state.channels.push(channel);
        }
        project
    }

    pub fn fail_channel(&self, name: &str) {
        self.state.lock().unwrap().failing_channels.insert(name.to_string());
    }

    /// Every read of a variable set is followed by a concurrent write
    /// bumping its version.
    pub fn bump_variables_on_read(&self) {
        self.state.lock().unwrap().bump_variables_on_read = true;
    }

    pub fn project(&self, name: &str) -> Option<ProjectResource> {
        let state = self.state.lock().unwrap();
        state.projects.iter().find(|p| p.name == name).cloned()
    }

    pub fn project_count(&self) -> usize {
        self.state.lock().unwrap().projects.len()
    }

    /// Variable set as stored, sensitive values included.
    pub fn stored_variables(&self, id: &str) -> VariableSetResource {
        self.state.lock().unwrap().variable_sets[id].clone()
    }

    pub fn stored_process(&self, id: &str) -> DeploymentProcessResource {
        self.state.lock().unwrap().processes[id].clone()
    }

    pub fn channels_of(&self, project_id: &str) -> Vec<ChannelResource> {
        let state = self.state.lock().unwrap();
        state
            .channels
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Mirror a project's stored variable set into a secret store.
    pub fn mirror_secrets(&self, project: &ProjectResource, secrets: &SqliteSecretStore) {
        let variables = self.stored_variables(&project.variable_set_id);
        secrets.upsert_record(project, &variables).unwrap();
    }
}

fn provision(state: &mut State, mut project: ProjectResource) -> ProjectResource {
    state.next_id += 1;
    project.id = format!("Projects-{}", state.next_id);
    project.variable_set_id = format!("variableset-{}", project.id);
    project.deployment_process_id = format!("deploymentprocess-{}", project.id);
    project.links.set_self(format!("/api/projects/{}", project.id));

    state.variable_sets.insert(
        project.variable_set_id.clone(),
        VariableSetResource {
            id: project.variable_set_id.clone(),
            owner_id: project.id.clone(),
            version: 0,
            variables: Vec::new(),
            links: Links::default(),
            extra: Default::default(),
        },
    );
    state.processes.insert(
        project.deployment_process_id.clone(),
        DeploymentProcessResource {
            id: project.deployment_process_id.clone(),
            project_id: project.id.clone(),
            version: 0,
            steps: Vec::new(),
            links: Links::default(),
            extra: Default::default(),
        },
    );

    state.next_id += 1;
    let mut default_channel = ChannelResource::new(DEFAULT_CHANNEL_NAME);
    default_channel.id = format!("Channels-{}", state.next_id);
    default_channel.project_id = project.id.clone();
    default_channel.is_default = true;
    state.channels.push(default_channel);

    state.projects.push(project.clone());
    project
}

fn conflict(kind: &str, expected: i32, got: i32) -> ClientError {
    ClientError::Conflict(format!(
        "{} version mismatch: expected {}, got {}",
        kind, expected, got
    ))
}

#[async_trait]
impl OctopusApi for FakeOctopus {
    async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectResource>, ClientError> {
        let state = self.state.lock().unwrap();
        Ok(state.projects.iter().find(|p| p.name == name).cloned())
    }

    async fn create_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_project:{}", project.name));
        if state.projects.iter().any(|p| p.name == project.name) {
            return Err(ClientError::BadRequest(format!("Name '{}' is in use", project.name)));
        }
        Ok(provision(&mut state, project.clone()))
    }

    async fn modify_project(&self, project: &ProjectResource) -> Result<ProjectResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("modify_project:{}", project.id));
        let stored = state
            .projects
            .iter_mut()
            .find(|p| p.id == project.id)
            .ok_or_else(|| ClientError::NotFound(project.id.clone()))?;
        *stored = project.clone();
        Ok(project.clone())
    }

    async fn delete_project(&self, project: &ProjectResource) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete_project:{}", project.id));
        let before = state.projects.len();
        state.projects.retain(|p| p.id != project.id);
        if state.projects.len() == before {
            return Err(ClientError::NotFound(project.id.clone()));
        }
        state.variable_sets.remove(&project.variable_set_id);
        state.processes.remove(&project.deployment_process_id);
        state.channels.retain(|c| c.project_id != project.id);
        Ok(())
    }

    async fn get_variable_set(&self, id: &str) -> Result<VariableSetResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        let bump = state.bump_variables_on_read;
        let stored = state
            .variable_sets
            .get_mut(id)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))?;
        let mut view = stored.clone();
        if bump {
            stored.version += 1;
        }
        for variable in view.variables.iter_mut().filter(|v| v.is_sensitive) {
            variable.value = None;
        }
        Ok(view)
    }

    async fn modify_variable_set(
        &self,
        variables: &VariableSetResource,
    ) -> Result<VariableSetResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("modify_variable_set:{}", variables.id));
        let stored = state
            .variable_sets
            .get_mut(&variables.id)
            .ok_or_else(|| ClientError::NotFound(variables.id.clone()))?;
        if stored.version != variables.version {
            return Err(conflict("variable set", stored.version, variables.version));
        }
        *stored = variables.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn get_deployment_process(&self, id: &str) -> Result<DeploymentProcessResource, ClientError> {
        let state = self.state.lock().unwrap();
        state
            .processes
            .get(id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn modify_deployment_process(
        &self,
        process: &DeploymentProcessResource,
    ) -> Result<DeploymentProcessResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("modify_deployment_process:{}", process.id));
        let stored = state
            .processes
            .get_mut(&process.id)
            .ok_or_else(|| ClientError::NotFound(process.id.clone()))?;
        if stored.version != process.version {
            return Err(conflict("deployment process", stored.version, process.version));
        }
        *stored = process.clone();
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn get_channels(
        &self,
        project: &ProjectResource,
    ) -> Result<ResourceCollection<ChannelResource>, ClientError> {
        Ok(ResourceCollection::new(self.channels_of(&project.id)))
    }

    async fn create_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_channel:{}", channel.name));
        if state.failing_channels.contains(&channel.name) {
            return Err(ClientError::BadRequest(format!("Channel '{}' rejected", channel.name)));
        }
        state.next_id += 1;
        let mut created = channel.clone();
        created.id = format!("Channels-{}", state.next_id);
        created.links.set_self(format!("/api/channels/{}", created.id));
        state.channels.push(created.clone());
        Ok(created)
    }

    async fn modify_channel(&self, channel: &ChannelResource) -> Result<ChannelResource, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("modify_channel:{}", channel.name));
        if state.failing_channels.contains(&channel.name) {
            return Err(ClientError::BadRequest(format!("Channel '{}' rejected", channel.name)));
        }
        let stored = state
            .channels
            .iter_mut()
            .find(|c| c.id == channel.id)
            .ok_or_else(|| ClientError::NotFound(channel.id.clone()))?;
        *stored = channel.clone();
        Ok(channel.clone())
    }
}

// ============================================================
// Fixtures
// ============================================================

pub fn sample_variables() -> Vec<VariableResource> {
    let mut scoped = VariableResource::new("var-2", "ConnectionString", "Server=prod;");
    scoped
        .scope
        .insert("Environment".to_string(), vec!["Environments-1".to_string()]);
    vec![VariableResource::new("var-1", "AppName", "web"), scoped]
}

pub fn sample_steps() -> Vec<DeploymentStepResource> {
    vec![
        DeploymentStepResource::new("Deploy web", "Success")
            .with_action("Deploy web", "Octopus.TentaclePackage"),
        DeploymentStepResource::new("Notify", "Always")
            .with_action("Slack", "Octopus.Script")
            .with_action("Email", "Octopus.Email"),
    ]
}

pub fn sample_channels() -> Vec<ChannelResource> {
    let mut hotfix = ChannelResource::new("Hotfix");
    hotfix.description = Some("Emergency releases".to_string());
    hotfix.lifecycle_id = Some("Lifecycles-2".to_string());
    vec![hotfix, ChannelResource::new("Preview")]
}
