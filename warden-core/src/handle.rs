use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// A live connection to the virtualization host.
///
/// Handles are move-only: releasing one consumes it, so a released handle
/// can never be passed to the collaborator again.
#[derive(Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct HostHandle(NonZeroU32);

impl HostHandle {
    /// Wraps a raw handle id issued by the collaborator.
    #[must_use]
    pub fn from_raw(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle id.
    #[must_use]
    pub fn raw(&self) -> NonZeroU32 {
        self.0
    }
}

impl fmt::Display for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// An open session on the single managed virtual machine.
///
/// Like [`HostHandle`], this is move-only and must be released before the
/// host connection it was opened against.
#[derive(Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct VmHandle(NonZeroU32);

impl VmHandle {
    /// Wraps a raw handle id issued by the collaborator.
    #[must_use]
    pub fn from_raw(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle id.
    #[must_use]
    pub fn raw(&self) -> NonZeroU32 {
        self.0
    }
}

impl fmt::Display for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm#{}", self.0)
    }
}

/// The path of the `.vmx` file naming the managed VM.
///
/// Supplied once at startup and never mutated; used to open the VM and to
/// label log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct VmIdentity(PathBuf);

impl VmIdentity {
    /// Creates an identity from any path-like value.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Returns the `.vmx` path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for VmIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for VmIdentity {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}
