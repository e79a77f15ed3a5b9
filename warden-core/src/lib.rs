//! Core types for the vmwarden virtual machine supervisor.
//!
//! Defines the handles, VM identity, power state bitmask and error codes
//! shared between the collaborator seam and the daemon.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod handle;
pub mod power;

pub use error::{classify_suspend, ErrorCode, Outcome, VixError};
pub use handle::{HostHandle, VmHandle, VmIdentity};
pub use power::PowerState;
