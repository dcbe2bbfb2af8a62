use std::path::Path;

use super::{
    find_project, rebind_process, rebind_variables, ImportMode, ImportReport, RemoteStep,
    TransferError,
};
use crate::client::OctopusApi;
use crate::slug;
use crate::snapshot::SnapshotDir;

/// Create `project_name` from the snapshot in `<base>/<project_name>/`.
///
/// The server provisions an empty variable set, deployment process and
/// default channel with the project; the snapshot's documents are written
/// over the first two at version 0, and every other channel is created.
/// Sensitive values travel in the variable set modify, so the secret store
/// is not touched.
pub async fn create<A: OctopusApi + ?Sized>(
    api: &A,
    project_name: &str,
    base: &Path,
) -> Result<ImportReport, TransferError> {
    if find_project(api, project_name).await?.is_some() {
        return Err(TransferError::ProjectAlreadyExists(project_name.to_string()));
    }

    let dir = SnapshotDir::for_project(base, project_name);
    let mut snapshot = dir.read()?;

    snapshot.project.name = project_name.to_string();
    snapshot.project.slug = slug::generate(project_name);
    let created = api
        .create_project(&snapshot.project)
        .await
        .map_err(TransferError::remote(RemoteStep::CreateProject))?;
    tracing::info!("Created project '{}' ({})", created.name, created.id);

    let mut report = ImportReport::new(ImportMode::Created, created.id.clone());

    let mut process = snapshot.process;
    rebind_process(&mut process, &created);
    process.version = 0;
    api.modify_deployment_process(&process)
        .await
        .map_err(TransferError::remote(RemoteStep::ModifyProcess))?;
    tracing::info!("Imported {} deployment steps", process.steps.len());

    let mut variables = snapshot.variables;
    rebind_variables(&mut variables, &created);
    variables.version = 0;
    api.modify_variable_set(&variables)
        .await
        .map_err(TransferError::remote(RemoteStep::ModifyVariables))?;
    report.sensitive_restored = variables.variables.iter().filter(|v| v.is_sensitive).count();
    tracing::info!("Imported {} variables", variables.variables.len());

    for mut channel in snapshot.channels.items {
        if channel.is_implicit_default() {
            tracing::debug!("Skipping implicit channel '{}'", channel.name);
            continue;
        }
        channel.project_id = created.id.clone();
        match api.create_channel(&channel).await {
            Ok(_) => report.channels_applied.push(channel.name),
            Err(e) => report.channel_failed(&channel, RemoteStep::CreateChannel, e)?,
        }
    }

    Ok(report)
}
