//! Resource models for the deployment server.
//!
//! # Core Concepts
//!
//! - [`ProjectResource`]: Top-level deployable unit. References exactly one
//!   variable set and one deployment process, and owns zero or more channels.
//! - [`VariableSetResource`]: Versioned list of [`VariableResource`]s attached to a project.
//! - [`DeploymentProcessResource`]: Versioned list of [`DeploymentStepResource`]s.
//! - [`ChannelResource`]: Release stream configuration owned by a project.
//!
//! All resources serialize with the server's PascalCase field names and keep
//! any field they do not model in a flattened `extra` map, so a snapshot
//! written by export carries everything the server returned.

mod channel;
mod links;
mod process;
mod project;
mod variables;

pub use channel::*;
pub use links::*;
pub use process::*;
pub use project::*;
pub use variables::*;
