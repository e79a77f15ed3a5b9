use std::fmt;

/// Numeric error code returned by a collaborator operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u64);

impl ErrorCode {
    pub const FAIL: Self = Self(1);
    pub const INVALID_ARG: Self = Self(3);
    pub const FILE_NOT_FOUND: Self = Self(4);
    pub const INVALID_HANDLE: Self = Self(1000);
    pub const VM_NOT_RUNNING: Self = Self(3006);
    pub const CANNOT_CONNECT_TO_HOST: Self = Self(18000);

    /// Fixed human-readable text for this code.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::FAIL => "Unknown error",
            Self::INVALID_ARG => "One of the parameters was invalid",
            Self::FILE_NOT_FOUND => "A file was not found",
            Self::INVALID_HANDLE => "The handle is not a valid VIX object",
            Self::VM_NOT_RUNNING => "The virtual machine needs to be powered on",
            Self::CANNOT_CONNECT_TO_HOST => "Cannot connect to host",
            _ => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A failed collaborator operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{} [{}]{}",
    .code.text(),
    .code,
    .detail.as_deref().map_or_else(String::new, |d| format!(": {d}"))
)]
#[non_exhaustive]
pub struct VixError {
    /// The numeric code.
    pub code: ErrorCode,
    /// Tool output or other context, if any.
    pub detail: Option<String>,
}

impl VixError {
    /// Creates an error with no detail text.
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    /// Creates an error carrying extra detail text.
    #[must_use]
    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self { code, detail: Some(detail.into()) }
    }

    /// Returns the code's fixed text.
    #[must_use]
    pub fn text(&self) -> &'static str {
        self.code.text()
    }

    /// Returns `true` if the VM was not running when the operation was issued.
    #[must_use]
    pub fn is_vm_not_running(&self) -> bool {
        self.code == ErrorCode::VM_NOT_RUNNING
    }
}

/// How the supervisor treats the result of a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed.
    Success,
    /// The operation failed in an expected way; carry on.
    Tolerated(VixError),
    /// The operation failed.
    Fatal(VixError),
}

/// Classifies the result of a suspend request.
///
/// Only "VM not running" is tolerated; the VM may already be off.
#[must_use]
pub fn classify_suspend(result: Result<(), VixError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Success,
        Err(e) if e.is_vm_not_running() => Outcome::Tolerated(e),
        Err(e) => Outcome::Fatal(e),
    }
}
