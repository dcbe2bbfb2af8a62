//! Export and import deployment project definitions.
//!
//! A project's metadata, variable set, deployment process and channels are
//! exported from the deployment server into a directory of JSON documents
//! ([`snapshot`]) and imported back, onto a new or an existing project
//! ([`transfer`]). Sensitive variable values bypass the REST API and go
//! through [`secrets`].

pub mod cli;
pub mod client;
pub mod compare;
pub mod config;
pub mod models;
pub mod secrets;
pub mod slug;
pub mod snapshot;
pub mod transfer;
