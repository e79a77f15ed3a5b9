//! Handle registry for a collaborator implementation.
//!
//! Issues opaque handle ids and remembers what each one refers to, so a
//! stale or foreign handle is rejected instead of acting on the wrong VM.

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use warden_core::{ErrorCode, HostHandle, VixError, VmHandle};

/// What a VM handle refers to.
#[derive(Debug, Clone)]
pub struct VmEntry {
    /// Host the VM was opened against.
    pub host: NonZeroU32,
    /// Canonical `.vmx` path.
    pub vmx: PathBuf,
    /// When the handle was issued.
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    last_id: u32,
    hosts: BTreeSet<NonZeroU32>,
    vms: BTreeMap<NonZeroU32, VmEntry>,
}

impl State {
    fn next_id(&mut self) -> Result<NonZeroU32, VixError> {
        let id = self
            .last_id
            .checked_add(1)
            .and_then(NonZeroU32::new)
            .ok_or_else(|| VixError::with_detail(ErrorCode::FAIL, "handle ids exhausted"))?;
        self.last_id = id.get();
        Ok(id)
    }
}

/// Registry of live host and VM handles.
///
/// All operations are serialized through an async mutex.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    state: Mutex<State>,
}

impl HandleRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new host handle.
    ///
    /// # Errors
    /// Returns [`ErrorCode::FAIL`] if the id space is exhausted.
    pub async fn register_host(&self) -> Result<HostHandle, VixError> {
        let mut state = self.state.lock().await;
        let id = state.next_id()?;
        state.hosts.insert(id);
        Ok(HostHandle::from_raw(id))
    }

    /// Issue a new VM handle bound to `host` and `vmx`.
    ///
    /// # Errors
    /// Returns [`ErrorCode::INVALID_HANDLE`] if `host` is not registered.
    pub async fn register_vm(&self, host: &HostHandle, vmx: PathBuf) -> Result<VmHandle, VixError> {
        let mut state = self.state.lock().await;
        if !state.hosts.contains(&host.raw()) {
            return Err(invalid(host.to_string()));
        }
        let id = state.next_id()?;
        state.vms.insert(
            id,
            VmEntry {
                host: host.raw(),
                vmx,
                opened_at: Utc::now(),
            },
        );
        Ok(VmHandle::from_raw(id))
    }

    /// Look up what a VM handle refers to.
    ///
    /// # Errors
    /// Returns [`ErrorCode::INVALID_HANDLE`] if `vm` is unknown or released.
    pub async fn vm(&self, vm: &VmHandle) -> Result<VmEntry, VixError> {
        self.state
            .lock()
            .await
            .vms
            .get(&vm.raw())
            .cloned()
            .ok_or_else(|| invalid(vm.to_string()))
    }

    /// Return `true` if `host` is registered.
    pub async fn contains_host(&self, host: &HostHandle) -> bool {
        self.state.lock().await.hosts.contains(&host.raw())
    }

    /// Forget a VM handle and return what it referred to.
    ///
    /// # Errors
    /// Returns [`ErrorCode::INVALID_HANDLE`] if `vm` is unknown.
    pub async fn release_vm(&self, vm: VmHandle) -> Result<VmEntry, VixError> {
        self.state
            .lock()
            .await
            .vms
            .remove(&vm.raw())
            .ok_or_else(|| invalid(vm.to_string()))
    }

    /// Forget a host handle.
    ///
    /// # Errors
    /// Returns [`ErrorCode::INVALID_HANDLE`] if `host` is unknown, or
    /// [`ErrorCode::INVALID_ARG`] if VM handles opened against it are still
    /// live. The host is released in the latter case too.
    pub async fn release_host(&self, host: HostHandle) -> Result<(), VixError> {
        let mut state = self.state.lock().await;
        if !state.hosts.remove(&host.raw()) {
            return Err(invalid(host.to_string()));
        }
        let orphaned = state.vms.values().filter(|e| e.host == host.raw()).count();
        if orphaned > 0 {
            return Err(VixError::with_detail(
                ErrorCode::INVALID_ARG,
                format!("{host} released with {orphaned} open VM handle(s)"),
            ));
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn open_vm_count(&self) -> usize {
        self.state.lock().await.vms.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_open(&self, vmx: &std::path::Path) -> bool {
        self.state.lock().await.vms.values().any(|e| e.vmx == vmx)
    }
}

fn invalid(what: String) -> VixError {
    VixError::with_detail(ErrorCode::INVALID_HANDLE, what)
}
