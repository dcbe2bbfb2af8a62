//! Legacy command-line tokens: `/action:ACTION /project:NAME /path:DIR`.
//!
//! Each token is split on its first colon, so values may contain colons
//! (`/path:C:\exports`).

use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str =
    "Usage: porter /action:ACTION(IMPORT | EXPORT) /project:PROJECT /path:FOLDER_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Export,
    Import,
}

impl Action {
    /// Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    pub project: String,
    pub path: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("expected 3 arguments, got {0}")]
    WrongCount(usize),

    #[error("unknown argument '{0}'")]
    UnknownFlag(String),

    #[error("argument '{0}' has no value")]
    MissingValue(String),

    #[error("argument '{0}' given more than once")]
    Duplicate(String),

    #[error("missing /{0}")]
    Missing(&'static str),

    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

pub fn parse_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Invocation, UsageError> {
    if tokens.len() != 3 {
        return Err(UsageError::WrongCount(tokens.len()));
    }

    let mut action = None;
    let mut project = None;
    let mut path = None;

    for token in tokens {
        let token = token.as_ref();
        let (key, value) = token
            .split_once(':')
            .ok_or_else(|| UsageError::MissingValue(token.to_string()))?;
        let slot = match key {
            "/action" => &mut action,
            "/project" => &mut project,
            "/path" => &mut path,
            _ => return Err(UsageError::UnknownFlag(key.to_string())),
        };
        if value.is_empty() {
            return Err(UsageError::MissingValue(key.to_string()));
        }
        if slot.replace(value.to_string()).is_some() {
            return Err(UsageError::Duplicate(key.to_string()));
        }
    }

    let action = action.ok_or(UsageError::Missing("action"))?;
    Ok(Invocation {
        action: Action::parse(&action).ok_or(UsageError::UnknownAction(action))?,
        project: project.ok_or(UsageError::Missing("project"))?,
        path: PathBuf::from(path.ok_or(UsageError::Missing("path"))?),
    })
}
