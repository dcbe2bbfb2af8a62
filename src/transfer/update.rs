use std::collections::BTreeMap;
use std::path::Path;

use super::{
    find_project, rebind_process, rebind_variables, ImportMode, ImportReport, RemoteStep,
    TransferError,
};
use crate::client::OctopusApi;
use crate::models::VariableSetResource;
use crate::secrets::SecretStore;
use crate::snapshot::SnapshotDir;

/// Move sensitive values out of `variables`, leaving empty placeholders.
///
/// Returns the values keyed by variable id.
pub fn extract_sensitive(variables: &mut VariableSetResource) -> BTreeMap<String, String> {
    variables
        .variables
        .iter_mut()
        .filter(|v| v.is_sensitive)
        .map(|v| {
            let value = v.value.replace(String::new()).unwrap_or_default();
            (v.id.clone(), value)
        })
        .collect()
}

/// Overwrite the existing project `project_name` with the snapshot in
/// `<base>/<project_name>/`.
///
/// Order: project, variable set, deployment process, channels, then the
/// sensitive values through `secrets`. The snapshot is rebound onto the
/// existing project's ids, and the variable set and process carry the
/// server's current version counters so the writes are accepted unless
/// something else changed them in between.
///
/// `secrets` is only needed when the snapshot carries sensitive values;
/// without a store such a snapshot is refused before anything is written.
///
/// Channels are modified by the ids recorded in the snapshot, the implicit
/// Default channel included. A snapshot exported from another server holds
/// that server's channel ids, so its channels usually end up in
/// `channels_skipped` as not found.
pub async fn update<A, S>(
    api: &A,
    secrets: Option<&S>,
    project_name: &str,
    base: &Path,
) -> Result<ImportReport, TransferError>
where
    A: OctopusApi + ?Sized,
    S: SecretStore + ?Sized,
{
    let existing = find_project(api, project_name)
        .await?
        .ok_or_else(|| TransferError::ProjectNotFound(project_name.to_string()))?;

    let dir = SnapshotDir::for_project(base, project_name);
    let snapshot = dir.read()?;

    let mut variables = snapshot.variables;
    let sensitive = extract_sensitive(&mut variables);
    if secrets.is_none() && !sensitive.is_empty() {
        return Err(TransferError::SecretStoreRequired(project_name.to_string()));
    }

    let mut project = snapshot.project;
    project.id = existing.id.clone();
    project.variable_set_id = existing.variable_set_id.clone();
    project.deployment_process_id = existing.deployment_process_id.clone();
    project.links.set_self(format!("/api/projects/{}", existing.id));

    let remote_variables = api
        .get_variable_set(&existing.variable_set_id)
        .await
        .map_err(TransferError::remote(RemoteStep::FetchVariables))?;
    variables.version = remote_variables.version;

    let remote_process = api
        .get_deployment_process(&existing.deployment_process_id)
        .await
        .map_err(TransferError::remote(RemoteStep::FetchProcess))?;
    let mut process = snapshot.process;
    process.version = remote_process.version;

    api.modify_project(&project)
        .await
        .map_err(TransferError::remote(RemoteStep::ModifyProject))?;
    tracing::info!("Updated project '{}' ({})", project.name, project.id);

    let mut report = ImportReport::new(ImportMode::Updated, project.id.clone());

    rebind_variables(&mut variables, &project);
    api.modify_variable_set(&variables)
        .await
        .map_err(TransferError::remote(RemoteStep::ModifyVariables))?;
    tracing::info!("Updated {} variables", variables.variables.len());

    rebind_process(&mut process, &project);
    api.modify_deployment_process(&process)
        .await
        .map_err(TransferError::remote(RemoteStep::ModifyProcess))?;
    tracing::info!("Updated {} deployment steps", process.steps.len());

    for mut channel in snapshot.channels.items {
        channel.project_id = project.id.clone();
        channel.links.set_self(format!("/api/channels/{}", channel.id));
        match api.modify_channel(&channel).await {
            Ok(_) => report.channels_applied.push(channel.name),
            Err(e) => report.channel_failed(&channel, RemoteStep::ModifyChannel, e)?,
        }
    }

    if let Some(secrets) = secrets {
        secrets.write_all(&project.id, &sensitive)?;
        report.sensitive_restored = sensitive.len();
    }

    Ok(report)
}
