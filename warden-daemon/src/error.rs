//! Error types for the daemon crate.

use std::fmt;

use warden_core::VixError;

/// A collaborator operation, named the way it appears in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Connecting to the virtualization host.
    HostConnect,
    /// Opening the VM's `.vmx` file.
    VmOpen,
    /// Powering the VM on.
    PowerOn,
    /// Suspending the VM.
    Suspend,
    /// Reading the VM's power state.
    GetPowerState,
}

impl Operation {
    /// Label used in log lines.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::HostConnect => "VixHost_Connect",
            Self::VmOpen => "VixVM_Open",
            Self::PowerOn => "VixVM_PowerOn",
            Self::Suspend => "VixVM_Suspend",
            Self::GetPowerState => "Vix_GetProperties",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors that end the daemon with a failure status.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DaemonError {
    /// A collaborator call failed where the daemon cannot continue.
    #[error("{op}: {source}")]
    Fatal { op: Operation, source: VixError },

    /// The collaborator could not be configured.
    #[error("configuration error: {0}")]
    Config(#[from] warden_vix::ConfigError),

    /// The poll interval override is not a duration.
    #[error("invalid poll interval {value:?}: {source}")]
    PollInterval {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    /// The termination signal handler could not be installed.
    #[error("failed to install SIGTERM handler: {0}")]
    Signal(#[source] std::io::Error),
}

impl DaemonError {
    /// Wrap a collaborator error as fatal for `op`.
    #[must_use]
    pub fn fatal(op: Operation, source: VixError) -> Self {
        Self::Fatal { op, source }
    }

    /// Write this error to the log at `error` level.
    pub fn log(&self) {
        match self {
            Self::Fatal { op, source } => {
                tracing::error!(op = op.label(), code = source.code.0, "{self}");
            }
            _ => tracing::error!("{self}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use warden_core::ErrorCode;

    use super::*;

    #[test]
    fn fatal_display_has_operation_text_and_code() {
        let err = DaemonError::fatal(
            Operation::HostConnect,
            VixError::new(ErrorCode::CANNOT_CONNECT_TO_HOST),
        );
        assert_eq!(err.to_string(), "VixHost_Connect: Cannot connect to host [18000]");
    }

    #[test]
    fn operation_labels_are_distinct() {
        let ops = [
            Operation::HostConnect,
            Operation::VmOpen,
            Operation::PowerOn,
            Operation::Suspend,
            Operation::GetPowerState,
        ];
        for (i, a) in ops.iter().enumerate() {
            for b in &ops[i + 1..] {
                assert_ne!(a.label(), b.label(), "labels must identify the operation");
            }
        }
    }

    #[test]
    fn config_error_converts() {
        let err: DaemonError = warden_vix::ConfigError::UnknownHostType {
            value: "player".to_owned(),
        }
        .into();
        assert!(err.to_string().contains("player"), "Display must include the bad value");
    }
}
