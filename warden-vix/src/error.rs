//! Error types for the collaborator crate.

/// Errors building a [`crate::VmrunConfig`] from the environment.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `VMWARDEN_HOST_TYPE` named a host type vmrun does not know.
    #[error("unknown host type {value:?}: expected \"fusion\" or \"ws\"")]
    UnknownHostType { value: String },

    /// An environment variable held non-UTF-8 data.
    #[error("{name} is not valid unicode")]
    NotUnicode { name: &'static str },
}
