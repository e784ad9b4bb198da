//! Core traits, types, and error handling for azdo-bridge.
//!
//! This crate provides the domain model shared by the Azure DevOps client
//! and the MCP server: work items, JSON Patch documents, tag sets,
//! relation kinds, wiki and sprint types, and the provider traits.

pub mod config;
pub mod error;
pub mod patch;
pub mod provider;
pub mod relations;
pub mod tags;
pub mod types;

pub use config::{Config, ConnectionSettings};
pub use error::{Error, Result};
pub use patch::{PatchOp, PatchOperation};
pub use provider::{Provider, SprintProvider, WikiProvider, WorkItemProvider};
pub use relations::RelationKind;
pub use tags::{TagOperation, TagSet};
pub use types::*;
