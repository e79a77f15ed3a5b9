//! Supervising daemon for a single VMware virtual machine.
//!
//! Powers the VM on at startup, polls its power state and powers it on again
//! if it is found off, and suspends it when the process receives SIGTERM.
//! Any collaborator failure outside shutdown ends the process with a failure
//! status so the surrounding process manager can decide what to do.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod health;
pub mod power;
pub mod shutdown;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use bootstrap::Session;
pub use config::DaemonConfig;
pub use error::{DaemonError, Operation};
pub use health::HealthCheck;
pub use supervisor::{ExitStatus, LifecycleState, Supervisor};
