//! Virtualization collaborator seam for vmwarden.
//!
//! [`VixApi`] is the narrow, synchronous-per-call interface the daemon
//! drives. [`VmrunHost`] implements it on top of VMware's `vmrun` tool.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod api;
pub mod config;
pub mod error;
pub mod registry;
pub mod vmrun;

pub use api::VixApi;
pub use config::{HostType, VmrunConfig};
pub use error::ConfigError;
pub use registry::HandleRegistry;
pub use vmrun::VmrunHost;
