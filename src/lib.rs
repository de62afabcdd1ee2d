//! # Instance Metadata Server
//!
//! Emulates the cloud instance metadata server for workloads running outside
//! a real VM: static instance/project facts plus on-demand access and
//! identity tokens minted for a configured identity.
//!
//! Modules:
//! - `config` — command line, metadata file and credential file loading
//! - `minter` — token minting (JWT-bearer and refresh-token impersonation flows)
//! - `server` — metadata HTTP router and listeners
//! - `observability` — prometheus metrics

pub mod config;
pub mod error;
pub mod helpers;
pub mod minter;
pub mod observability;
pub mod server;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::settings::ServiceConfig;
pub use crate::error::{MetadataError, Result};
