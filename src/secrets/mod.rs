//! Direct access to sensitive variable values in the server's datastore.
//!
//! The REST API never returns sensitive values in plaintext, so export reads
//! them and update writes them here instead. The datastore keeps each
//! project's variable set as a JSON document in the `VariableSet` table.

mod schema;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ProjectResource, VariableSetResource};

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("Secret store database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Secret store not found at {0}")]
    Missing(PathBuf),

    #[error("Secret store at {0} has no Project/VariableSet tables")]
    SchemaMissing(PathBuf),

    #[error("Can't retrieve project {0} from the secret store")]
    ProjectNotFound(String),

    #[error("Can't retrieve variable set {variable_set_id} of project {project_id} from the secret store")]
    VariableSetNotFound {
        project_id: String,
        variable_set_id: String,
    },

    #[error("Variable set {0} has an empty JSON document")]
    EmptyVariableSet(String),

    #[error("Variable set {variable_set_id} holds invalid JSON: {source}")]
    InvalidJson {
        variable_set_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Secret store setup failed: {0}")]
    Setup(#[from] anyhow::Error),
}

/// Read and write sensitive variable values keyed by project and variable id.
pub trait SecretStore: Send + Sync {
    /// The stored value of a variable, or an empty string when the project,
    /// its variable set or the variable cannot be found.
    fn read(&self, project_id: &str, variable_id: &str) -> Result<String, SecretStoreError>;

    /// Overwrite the values of the given variables.
    ///
    /// Ids without a stored variable are skipped. A missing project or
    /// variable set is an error: the caller wrote secrets before the
    /// project existed.
    fn write_all(
        &self,
        project_id: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<(), SecretStoreError>;
}

#[derive(Deserialize)]
struct StoredVariableSet {
    #[serde(rename = "Variables", default)]
    variables: Vec<StoredVariable>,
}

#[derive(Deserialize)]
struct StoredVariable {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Value", default)]
    value: Option<String>,
}

/// [`SecretStore`] over a SQLite copy of the server's datastore.
#[derive(Clone)]
pub struct SqliteSecretStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSecretStore {
    /// Open an existing datastore. Fails if the file or its tables are missing.
    pub fn open(path: &Path) -> Result<Self, SecretStoreError> {
        if !path.exists() {
            return Err(SecretStoreError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        if !schema::is_installed(&conn)? {
            return Err(SecretStoreError::SchemaMissing(path.to_path_buf()));
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open or create a datastore file, installing the tables if needed.
    pub fn create(path: &Path) -> Result<Self, SecretStoreError> {
        let conn = Connection::open(path)?;
        schema::install(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_memory() -> Result<Self, SecretStoreError> {
        let conn = Connection::open_in_memory()?;
        schema::install(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert or replace a project's backing rows with the given variable set.
    pub fn upsert_record(
        &self,
        project: &ProjectResource,
        variables: &VariableSetResource,
    ) -> Result<(), SecretStoreError> {
        let json = serde_json::to_string(variables).map_err(|source| {
            SecretStoreError::InvalidJson {
                variable_set_id: variables.id.clone(),
                source,
            }
        })?;
        let conn = self.conn.lock().expect("secret store lock poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO Project (Id, Name, VariableSetId) VALUES (?, ?, ?)",
            (&project.id, &project.name, &project.variable_set_id),
        )?;
        conn.execute(
            "INSERT OR REPLACE INTO VariableSet (Id, OwnerId, JSON) VALUES (?, ?, ?)",
            (&project.variable_set_id, &project.id, &json),
        )?;
        Ok(())
    }

    fn variable_set_id(conn: &Connection, project_id: &str) -> Result<Option<String>, SecretStoreError> {
        let id: Option<Option<String>> = conn
            .query_row(
                "SELECT VariableSetId FROM Project WHERE Id = ?",
                [project_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.flatten())
    }

    fn variable_set_json(conn: &Connection, variable_set_id: &str) -> Result<Option<String>, SecretStoreError> {
        let json: Option<Option<String>> = conn
            .query_row(
                "SELECT JSON FROM VariableSet WHERE Id = ?",
                [variable_set_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.flatten())
    }
}

impl SecretStore for SqliteSecretStore {
    fn read(&self, project_id: &str, variable_id: &str) -> Result<String, SecretStoreError> {
        let conn = self.conn.lock().expect("secret store lock poisoned");

        let Some(variable_set_id) = Self::variable_set_id(&conn, project_id)? else {
            tracing::debug!("No backing record for project {}", project_id);
            return Ok(String::new());
        };
        let Some(json) = Self::variable_set_json(&conn, &variable_set_id)? else {
            tracing::debug!("No backing variable set {}", variable_set_id);
            return Ok(String::new());
        };
        if json.is_empty() {
            return Ok(String::new());
        }

        let stored: StoredVariableSet = match serde_json::from_str(&json) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::debug!("Unreadable variable set {}: {}", variable_set_id, e);
                return Ok(String::new());
            }
        };

        Ok(stored
            .variables
            .into_iter()
            .find(|v| v.id == variable_id)
            .and_then(|v| v.value)
            .unwrap_or_default())
    }

    fn write_all(
        &self,
        project_id: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<(), SecretStoreError> {
        if values.is_empty() {
            return Ok(());
        }

        let conn = self.conn.lock().expect("secret store lock poisoned");

        let variable_set_id = Self::variable_set_id(&conn, project_id)?
            .ok_or_else(|| SecretStoreError::ProjectNotFound(project_id.to_string()))?;
        let json = Self::variable_set_json(&conn, &variable_set_id)?.ok_or_else(|| {
            SecretStoreError::VariableSetNotFound {
                project_id: project_id.to_string(),
                variable_set_id: variable_set_id.clone(),
            }
        })?;
        if json.is_empty() {
            return Err(SecretStoreError::EmptyVariableSet(variable_set_id));
        }

        let invalid = |source: serde_json::Error| SecretStoreError::InvalidJson {
            variable_set_id: variable_set_id.clone(),
            source,
        };
        let mut document: Value = serde_json::from_str(&json).map_err(invalid)?;

        let mut updated = 0;
        if let Some(variables) = document.get_mut("Variables").and_then(Value::as_array_mut) {
            for variable in variables.iter_mut() {
                let Some(value) = variable
                    .get("Id")
                    .and_then(Value::as_str)
                    .and_then(|id| values.get(id))
                else {
                    continue;
                };
                variable["Value"] = Value::String(value.clone());
                updated += 1;
            }
        }

        let new_json = serde_json::to_string(&document).map_err(invalid)?;
        conn.execute(
            "UPDATE VariableSet SET JSON = ? WHERE Id = ?",
            (&new_json, &variable_set_id),
        )?;

        tracing::info!(
            "Restored {} of {} sensitive values for project {}",
            updated,
            values.len(),
            project_id
        );
        Ok(())
    }
}
