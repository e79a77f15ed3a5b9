//! Connection bootstrap: host connection plus the opened VM.

use warden_core::{HostHandle, VmHandle, VmIdentity};
use warden_vix::VixApi;

use crate::error::{DaemonError, Operation};

/// The two process-lifetime handles.
///
/// Both are valid for as long as the session exists. [`Session::release`]
/// consumes it and returns the handles in order: VM first, then host.
#[derive(Debug)]
pub struct Session {
    host: HostHandle,
    vm: VmHandle,
}

impl Session {
    /// The managed VM.
    #[must_use]
    pub fn vm(&self) -> &VmHandle {
        &self.vm
    }

    /// Release the VM handle, disconnect the host and release the host
    /// handle.
    pub async fn release<C: VixApi + ?Sized>(self, api: &C) {
        api.release_vm(self.vm).await;
        api.disconnect(&self.host).await;
        api.release_host(self.host).await;
        tracing::debug!("released collaborator handles");
    }
}

/// Connect to the host and open the VM named by `identity`.
///
/// If the VM cannot be opened the host connection is torn down before
/// returning, so on error no handle is left behind.
///
/// # Errors
/// Returns [`DaemonError::Fatal`] for [`Operation::HostConnect`] or
/// [`Operation::VmOpen`].
pub async fn connect<C: VixApi + ?Sized>(api: &C, identity: &VmIdentity) -> Result<Session, DaemonError> {
    let host = api
        .connect()
        .await
        .map_err(|e| DaemonError::fatal(Operation::HostConnect, e))?;

    match api.open_vm(&host, identity.path()).await {
        Ok(vm) => {
            tracing::info!(vm = %identity, %host, handle = %vm, "opened VM");
            Ok(Session { host, vm })
        }
        Err(e) => {
            api.disconnect(&host).await;
            api.release_host(host).await;
            Err(DaemonError::fatal(Operation::VmOpen, e))
        }
    }
}
