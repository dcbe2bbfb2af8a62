//! Export and import workflows between the deployment server and snapshots.
//!
//! - [`export`]: server → snapshot, resolving sensitive values from the secret store.
//! - [`create`]: snapshot → new project.
//! - [`update`]: snapshot → existing project, with version stamping and
//!   sensitive values routed through the secret store.
//! - [`import`]: picks `create` or `update` by whether the project exists.
//!
//! Nothing is rolled back: a failure part way through an import leaves the
//! sub-entities already written in their new state.

mod create;
mod export;
mod update;

pub use create::create;
pub use export::export;
pub use update::update;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::client::{ClientError, OctopusApi};
use crate::models::*;
use crate::secrets::{SecretStore, SecretStoreError};
use crate::snapshot::SnapshotError;

/// The remote call a [`TransferError::Remote`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStep {
    FindProject,
    CreateProject,
    ModifyProject,
    DeleteProject,
    FetchVariables,
    ModifyVariables,
    FetchProcess,
    ModifyProcess,
    FetchChannels,
    CreateChannel,
    ModifyChannel,
}

impl fmt::Display for RemoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FindProject => "find project",
            Self::CreateProject => "create project",
            Self::ModifyProject => "modify project",
            Self::DeleteProject => "delete project",
            Self::FetchVariables => "fetch variable set",
            Self::ModifyVariables => "modify variable set",
            Self::FetchProcess => "fetch deployment process",
            Self::ModifyProcess => "modify deployment process",
            Self::FetchChannels => "fetch channels",
            Self::CreateChannel => "create channel",
            Self::ModifyChannel => "modify channel",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Project '{0}' does not exist")]
    ProjectNotFound(String),

    #[error("Project '{0}' already exists")]
    ProjectAlreadyExists(String),

    #[error("Updating '{0}' restores sensitive values and needs a secret store, none is configured")]
    SecretStoreRequired(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Failed to {step}: {source}")]
    Remote {
        step: RemoteStep,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Secrets(#[from] SecretStoreError),
}

impl TransferError {
    pub(crate) fn remote(step: RemoteStep) -> impl FnOnce(ClientError) -> Self {
        move |source| Self::Remote { step, source }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ProjectNotFound(_)
            | Self::ProjectAlreadyExists(_)
            | Self::SecretStoreRequired(_)
            | Self::Snapshot(_) => FailureKind::MissingPrerequisite,
            Self::Remote { .. } | Self::Secrets(_) => FailureKind::RemoteWriteRejected,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        policy_for(self.kind())
    }
}

/// Classes of failure a transfer can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Project absent on update, present on create, or snapshot file unusable.
    MissingPrerequisite,
    /// A create or modify was refused, including version-counter conflicts.
    RemoteWriteRejected,
    /// A single channel could not be created or modified.
    BestEffortSubStep,
    /// A sensitive value was not found in the secret store.
    LookupMiss,
}

/// What a workflow does when it hits a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    AbortAll,
    SkipAndContinue,
    LogAndIgnore,
}

pub fn policy_for(kind: FailureKind) -> FailurePolicy {
    match kind {
        FailureKind::MissingPrerequisite | FailureKind::RemoteWriteRejected => {
            FailurePolicy::AbortAll
        }
        FailureKind::BestEffortSubStep => FailurePolicy::SkipAndContinue,
        FailureKind::LookupMiss => FailurePolicy::LogAndIgnore,
    }
}

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub project_id: String,
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
    /// Sensitive variables whose value was read from the secret store.
    pub sensitive_resolved: usize,
    /// Sensitive variables the secret store had no value for.
    pub sensitive_missing: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Created,
    Updated,
}

/// A channel that could not be written and was skipped.
#[derive(Debug, Clone)]
pub struct SkippedChannel {
    pub name: String,
    pub reason: String,
}

/// Result of a create or update that ran to the end.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub project_id: String,
    pub channels_applied: Vec<String>,
    pub channels_skipped: Vec<SkippedChannel>,
    pub sensitive_restored: usize,
}

impl ImportReport {
    fn new(mode: ImportMode, project_id: impl Into<String>) -> Self {
        Self {
            mode,
            project_id: project_id.into(),
            channels_applied: Vec::new(),
            channels_skipped: Vec::new(),
            sensitive_restored: 0,
        }
    }

    /// Record a failed channel write according to the policy table.
    fn channel_failed(
        &mut self,
        channel: &ChannelResource,
        step: RemoteStep,
        error: ClientError,
    ) -> Result<(), TransferError> {
        match policy_for(FailureKind::BestEffortSubStep) {
            FailurePolicy::AbortAll => Err(TransferError::Remote {
                step,
                source: error,
            }),
            FailurePolicy::SkipAndContinue => {
                tracing::warn!("Skipping channel '{}': failed to {}: {}", channel.name, step, error);
                self.channels_skipped.push(SkippedChannel {
                    name: channel.name.clone(),
                    reason: error.to_string(),
                });
                Ok(())
            }
            FailurePolicy::LogAndIgnore => {
                tracing::warn!("Ignoring channel '{}' failure: {}", channel.name, error);
                Ok(())
            }
        }
    }
}

pub async fn find_project<A: OctopusApi + ?Sized>(
    api: &A,
    name: &str,
) -> Result<Option<ProjectResource>, TransferError> {
    api.find_project_by_name(name)
        .await
        .map_err(TransferError::remote(RemoteStep::FindProject))
}

pub async fn project_exists<A: OctopusApi + ?Sized>(api: &A, name: &str) -> Result<bool, TransferError> {
    tracing::info!("Checking whether project '{}' exists", name);
    Ok(find_project(api, name).await?.is_some())
}

/// Import a snapshot, creating the project if it does not exist and
/// updating it otherwise.
pub async fn import<A: OctopusApi + ?Sized>(
    api: &A,
    secrets: Option<&dyn SecretStore>,
    project_name: &str,
    base: &std::path::Path,
) -> Result<ImportReport, TransferError> {
    if project_exists(api, project_name).await? {
        update(api, secrets, project_name, base).await
    } else {
        create(api, project_name, base).await
    }
}

/// Delete a project by name. Returns `false` when there was nothing to delete.
pub async fn delete_project<A: OctopusApi + ?Sized>(
    api: &A,
    project_name: &str,
) -> Result<bool, TransferError> {
    let Some(project) = find_project(api, project_name).await? else {
        return Ok(false);
    };
    api.delete_project(&project)
        .await
        .map_err(TransferError::remote(RemoteStep::DeleteProject))?;
    tracing::info!("Deleted project '{}' ({})", project.name, project.id);
    Ok(true)
}

/// Point a process document at `project`'s derived process id and URL.
fn rebind_process(process: &mut DeploymentProcessResource, project: &ProjectResource) {
    process.project_id = project.id.clone();
    process.id = project.derived_process_id();
    process
        .links
        .set_self(format!("/api/deploymentprocesses/{}", project.deployment_process_id));
}

/// Point a variable set document at `project`'s variable set.
fn rebind_variables(variables: &mut VariableSetResource, project: &ProjectResource) {
    variables.owner_id = project.id.clone();
    variables.id = project.variable_set_id.clone();
    variables
        .links
        .set_self(format!("/api/variables/{}", project.variable_set_id));
}
