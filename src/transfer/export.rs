use std::path::Path;

use super::{find_project, ExportReport, RemoteStep, TransferError};
use crate::client::OctopusApi;
use crate::secrets::SecretStore;
use crate::snapshot::{Snapshot, SnapshotDir};

/// Write `<base>/<project_name>/` with the project's four documents.
///
/// Sensitive variables are written with their real value from `secrets`;
/// this is the only path that ever puts a secret in a snapshot file.
pub async fn export<A: OctopusApi + ?Sized>(
    api: &A,
    secrets: &dyn SecretStore,
    project_name: &str,
    base: &Path,
) -> Result<ExportReport, TransferError> {
    let project = find_project(api, project_name)
        .await?
        .ok_or_else(|| TransferError::ProjectNotFound(project_name.to_string()))?;
    tracing::info!("Exporting project '{}' ({})", project.name, project.id);

    let mut variables = api
        .get_variable_set(&project.variable_set_id)
        .await
        .map_err(TransferError::remote(RemoteStep::FetchVariables))?;

    let mut resolved = 0;
    let mut missing = 0;
    for variable in variables.variables.iter_mut().filter(|v| v.is_sensitive) {
        let value = secrets.read(&project.id, &variable.id)?;
        if value.is_empty() {
            // lookup misses export as empty values
            missing += 1;
            tracing::debug!("No stored value for sensitive variable '{}'", variable.name);
        } else {
            resolved += 1;
        }
        variable.value = Some(value);
    }

    let process = api
        .get_deployment_process(&project.deployment_process_id)
        .await
        .map_err(TransferError::remote(RemoteStep::FetchProcess))?;
    let channels = api
        .get_channels(&project)
        .await
        .map_err(TransferError::remote(RemoteStep::FetchChannels))?;

    let dir = SnapshotDir::for_project(base, project_name);
    dir.ensure_exists()?;
    let project_id = project.id.clone();
    let files = dir.write(&Snapshot {
        project,
        variables,
        process,
        channels,
    })?;

    tracing::info!(
        "Exported {} files to {} ({} sensitive values resolved)",
        files.len(),
        dir.path().display(),
        resolved
    );

    Ok(ExportReport {
        project_id,
        directory: dir.path().to_path_buf(),
        files,
        sensitive_resolved: resolved,
        sensitive_missing: missing,
    })
}
