//! On-disk snapshot of a project: four JSON documents in a directory named
//! after the project.
//!
//! ```text
//! <base>/<project name>/
//!   project.json     ProjectResource
//!   variables.json   VariableSetResource
//!   process.json     DeploymentProcessResource
//!   channels.json    ResourceCollection<ChannelResource>
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::models::*;

pub const PROJECT_FILE: &str = "project.json";
pub const VARIABLES_FILE: &str = "variables.json";
pub const PROCESS_FILE: &str = "process.json";
pub const CHANNELS_FILE: &str = "channels.json";

/// Every file a complete snapshot consists of.
pub const SNAPSHOT_FILES: [&str; 4] = [PROJECT_FILE, VARIABLES_FILE, PROCESS_FILE, CHANNELS_FILE];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot file {0:?} does not exist")]
    MissingFile(PathBuf),

    #[error("snapshot io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The full exportable state of one project.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub project: ProjectResource,
    pub variables: VariableSetResource,
    pub process: DeploymentProcessResource,
    pub channels: ResourceCollection<ChannelResource>,
}

/// The directory holding one project's snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    root: PathBuf,
}

impl SnapshotDir {
    /// `<base>/<project_name>`.
    pub fn for_project(base: &Path, project_name: &str) -> Self {
        Self {
            root: base.join(project_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.root).map_err(|source| SnapshotError::Io {
            path: self.root.clone(),
            source,
        })
    }

    pub fn read(&self) -> Result<Snapshot, SnapshotError> {
        Ok(Snapshot {
            project: self.read_document(PROJECT_FILE)?,
            variables: self.read_document(VARIABLES_FILE)?,
            process: self.read_document(PROCESS_FILE)?,
            channels: self.read_document(CHANNELS_FILE)?,
        })
    }

    /// Write all four documents as indented JSON.
    ///
    /// Every document is serialized before the first file is touched, so a
    /// serialization failure writes nothing. An I/O failure part way through
    /// can still leave earlier files behind.
    pub fn write(&self, snapshot: &Snapshot) -> Result<Vec<PathBuf>, SnapshotError> {
        let documents = [
            (PROJECT_FILE, self.render(PROJECT_FILE, &snapshot.project)?),
            (VARIABLES_FILE, self.render(VARIABLES_FILE, &snapshot.variables)?),
            (PROCESS_FILE, self.render(PROCESS_FILE, &snapshot.process)?),
            (CHANNELS_FILE, self.render(CHANNELS_FILE, &snapshot.channels)?),
        ];

        let mut written = Vec::with_capacity(documents.len());
        for (name, content) in documents {
            let path = self.file(name);
            fs::write(&path, content).map_err(|source| SnapshotError::Io {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }
        Ok(written)
    }

    fn render<T: Serialize>(&self, name: &str, value: &T) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(value).map_err(|source| SnapshotError::Json {
            path: self.file(name),
            source,
        })
    }

    fn read_document<T: DeserializeOwned>(&self, name: &str) -> Result<T, SnapshotError> {
        let path = self.file(name);
        if !path.exists() {
            return Err(SnapshotError::MissingFile(path));
        }
        let content = fs::read_to_string(&path).map_err(|source| SnapshotError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SnapshotError::Json { path, source })
    }
}
