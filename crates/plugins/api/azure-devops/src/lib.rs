//! Azure DevOps provider implementation for azdo-bridge.
//!
//! This crate talks to the Azure DevOps REST API (work item tracking,
//! work/iterations and wikis) with personal access token authentication
//! and maps responses to the unified types of `azdo-core`.

mod client;
mod http;
mod resolve;
mod types;
mod wiki;

pub use client::AzureDevOpsClient;
pub use http::{Body, HttpClient, RawResponse};
pub use resolve::select_wiki;
pub use types::*;
