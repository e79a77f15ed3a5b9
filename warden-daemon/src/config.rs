//! Daemon tuning.

use std::time::Duration;

use crate::DaemonError;

/// Overrides the poll interval, e.g. `30s` or `2m`.
pub const POLL_INTERVAL_ENV: &str = "VMWARDEN_POLL_INTERVAL";

/// Period between health checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for the [`crate::Supervisor`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct DaemonConfig {
    /// How often the VM's power state is polled.
    pub poll_interval: Duration,
}

impl DaemonConfig {
    /// Config with a custom poll interval, raised to [`MIN_POLL_INTERVAL`]
    /// if shorter.
    #[must_use]
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Defaults, with the poll interval taken from [`POLL_INTERVAL_ENV`]
    /// when set.
    ///
    /// # Errors
    /// Returns [`DaemonError::PollInterval`] if the variable is not a
    /// duration.
    pub fn from_env() -> Result<Self, DaemonError> {
        match std::env::var(POLL_INTERVAL_ENV) {
            Ok(value) => parse_poll_interval(&value).map(Self::with_poll_interval),
            Err(_) => Ok(Self::default()),
        }
    }
}

fn parse_poll_interval(value: &str) -> Result<Duration, DaemonError> {
    humantime::parse_duration(value.trim()).map_err(|source| DaemonError::PollInterval {
        value: value.to_owned(),
        source,
    })
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
