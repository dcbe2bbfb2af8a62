use anyhow::{Context, Result};
use rusqlite::Connection;

/// Server-side tables the bridge reads and writes.
///
/// Only the columns the bridge touches are declared. Against a real server
/// datastore the tables already exist and this is never run.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Project (
        Id TEXT PRIMARY KEY,
        Name TEXT NOT NULL,
        VariableSetId TEXT
    );
    CREATE TABLE IF NOT EXISTS VariableSet (
        Id TEXT PRIMARY KEY,
        OwnerId TEXT,
        JSON TEXT
    );
";

pub fn install(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create secret store tables")?;
    tracing::debug!("Secret store schema installed");
    Ok(())
}

/// Whether both backing tables are present.
pub fn is_installed(conn: &Connection) -> Result<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('Project', 'VariableSet')",
        [],
        |row| row.get(0),
    )?;
    Ok(count == 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!is_installed(&conn).unwrap());

        install(&conn).unwrap();
        assert!(is_installed(&conn).unwrap());
    }

    #[test]
    fn install_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        install(&conn).unwrap();
        install(&conn).unwrap();
        assert!(is_installed(&conn).unwrap());
    }
}
