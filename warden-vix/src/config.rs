//! vmrun host configuration.

use std::env::{self, VarError};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ConfigError;

/// Environment variable overriding the vmrun binary path.
pub const VMRUN_ENV: &str = "VMWARDEN_VMRUN";

/// Environment variable selecting the host type.
pub const HOST_TYPE_ENV: &str = "VMWARDEN_HOST_TYPE";

/// Which VMware product vmrun should talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostType {
    /// VMware Fusion (`-T fusion`).
    Fusion,
    /// VMware Workstation (`-T ws`).
    Workstation,
}

impl HostType {
    /// The value passed to vmrun's `-T` flag.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Self::Fusion => "fusion",
            Self::Workstation => "ws",
        }
    }
}

impl Default for HostType {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Fusion
        } else {
            Self::Workstation
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

impl FromStr for HostType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fusion" => Ok(Self::Fusion),
            "ws" | "workstation" => Ok(Self::Workstation),
            _ => Err(ConfigError::UnknownHostType { value: s.to_owned() }),
        }
    }
}

/// Configuration for [`crate::VmrunHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct VmrunConfig {
    /// Path to the `vmrun` binary, absolute or looked up in `$PATH`.
    pub binary: PathBuf,

    /// Product vmrun should target.
    pub host_type: HostType,
}

impl VmrunConfig {
    /// Create a config with an explicit binary and host type.
    #[must_use]
    pub fn new(binary: PathBuf, host_type: HostType) -> Self {
        Self { binary, host_type }
    }

    /// Build a config from the defaults, overridden by
    /// [`VMRUN_ENV`] and [`HOST_TYPE_ENV`] when set.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownHostType`] for an unrecognised host type
    /// and [`ConfigError::NotUnicode`] if either variable is not UTF-8.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(binary) = read_var(VMRUN_ENV)? {
            config.binary = PathBuf::from(binary);
        }
        if let Some(host_type) = read_var(HOST_TYPE_ENV)? {
            config.host_type = host_type.parse()?;
        }
        Ok(config)
    }
}

impl Default for VmrunConfig {
    fn default() -> Self {
        let host_type = HostType::default();
        let binary = match host_type {
            HostType::Fusion => PathBuf::from("/Applications/VMware Fusion.app/Contents/Library/vmrun"),
            HostType::Workstation => PathBuf::from("vmrun"),
        };
        Self { binary, host_type }
    }
}

fn read_var(name: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { name }),
    }
}
