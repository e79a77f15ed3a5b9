//! Collaborator abstraction trait.
//!
//! The daemon only ever talks to the virtualization host through this
//! trait, so the lifecycle logic is independent of how VMs are actually
//! powered on or queried.

use std::path::Path;

use async_trait::async_trait;
use warden_core::{HostHandle, PowerState, VixError, VmHandle};

/// Virtualization control API for one host and one VM.
///
/// Every call runs to completion before returning. Handles are consumed on
/// release, so they cannot be used afterwards.
#[async_trait]
pub trait VixApi: Send + Sync {
    /// Connect to the local virtualization host.
    ///
    /// # Errors
    /// Returns [`warden_core::ErrorCode::CANNOT_CONNECT_TO_HOST`] if the host
    /// cannot be reached.
    async fn connect(&self) -> Result<HostHandle, VixError>;

    /// Open the VM described by the `.vmx` file at `path`.
    ///
    /// # Errors
    /// Returns [`warden_core::ErrorCode::FILE_NOT_FOUND`] if the file does not
    /// exist, or [`warden_core::ErrorCode::INVALID_HANDLE`] if `host` is not
    /// connected.
    async fn open_vm(&self, host: &HostHandle, path: &Path) -> Result<VmHandle, VixError>;

    /// Power the VM on. Succeeds if it is already running.
    ///
    /// # Errors
    /// Returns any failure reported by the host.
    async fn power_on(&self, vm: &VmHandle) -> Result<(), VixError>;

    /// Suspend the VM.
    ///
    /// # Errors
    /// Returns [`warden_core::ErrorCode::VM_NOT_RUNNING`] if there is nothing
    /// to suspend, or any other failure reported by the host.
    async fn suspend(&self, vm: &VmHandle) -> Result<(), VixError>;

    /// Read the VM's current power state.
    ///
    /// # Errors
    /// Returns any failure reported by the host.
    async fn power_state(&self, vm: &VmHandle) -> Result<PowerState, VixError>;

    /// Release a VM handle.
    async fn release_vm(&self, vm: VmHandle);

    /// Disconnect from the host. The handle itself stays allocated until
    /// [`VixApi::release_host`].
    async fn disconnect(&self, host: &HostHandle);

    /// Release a host handle.
    async fn release_host(&self, host: HostHandle);
}
