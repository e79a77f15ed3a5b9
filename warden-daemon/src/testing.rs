//! Scripted in-memory collaborator for unit tests.

use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use warden_core::{ErrorCode, HostHandle, PowerState, VixError, VmHandle};
use warden_vix::VixApi;

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect,
    Open(PathBuf),
    PowerOn,
    Suspend,
    PowerState,
    ReleaseVm,
    Disconnect,
    ReleaseHost,
}

/// Records every call and answers from a script.
///
/// Power state reads pop from a queue and report `POWERED_ON` once it is
/// empty.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHost {
    calls: Mutex<Vec<Call>>,
    states: Mutex<VecDeque<Result<PowerState, ErrorCode>>>,
    connect_error: Option<ErrorCode>,
    open_error: Option<ErrorCode>,
    power_on_errors: Mutex<VecDeque<Option<ErrorCode>>>,
    suspend_error: Option<ErrorCode>,
}

impl ScriptedHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_connect(mut self, code: ErrorCode) -> Self {
        self.connect_error = Some(code);
        self
    }

    pub(crate) fn failing_open(mut self, code: ErrorCode) -> Self {
        self.open_error = Some(code);
        self
    }

    /// Script the outcome of successive power-on calls; unscripted calls
    /// succeed.
    pub(crate) fn power_on_results(self, results: impl IntoIterator<Item = Option<ErrorCode>>) -> Self {
        self.power_on_errors
            .lock()
            .expect("script lock")
            .extend(results);
        self
    }

    pub(crate) fn failing_suspend(mut self, code: ErrorCode) -> Self {
        self.suspend_error = Some(code);
        self
    }

    pub(crate) fn states(self, states: impl IntoIterator<Item = Result<PowerState, ErrorCode>>) -> Self {
        self.states.lock().expect("script lock").extend(states);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

fn raw(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).expect("non-zero handle id")
}

fn err(code: Option<ErrorCode>) -> Result<(), VixError> {
    match code {
        Some(code) => Err(VixError::new(code)),
        None => Ok(()),
    }
}

#[async_trait]
impl VixApi for ScriptedHost {
    async fn connect(&self) -> Result<HostHandle, VixError> {
        self.record(Call::Connect);
        err(self.connect_error)?;
        Ok(HostHandle::from_raw(raw(1)))
    }

    async fn open_vm(&self, _host: &HostHandle, path: &Path) -> Result<VmHandle, VixError> {
        self.record(Call::Open(path.to_owned()));
        err(self.open_error)?;
        Ok(VmHandle::from_raw(raw(2)))
    }

    async fn power_on(&self, _vm: &VmHandle) -> Result<(), VixError> {
        self.record(Call::PowerOn);
        let next = self.power_on_errors.lock().expect("script lock").pop_front();
        err(next.flatten())
    }

    async fn suspend(&self, _vm: &VmHandle) -> Result<(), VixError> {
        self.record(Call::Suspend);
        err(self.suspend_error)
    }

    async fn power_state(&self, _vm: &VmHandle) -> Result<PowerState, VixError> {
        self.record(Call::PowerState);
        let next = self.states.lock().expect("script lock").pop_front();
        match next {
            Some(Ok(state)) => Ok(state),
            Some(Err(code)) => Err(VixError::new(code)),
            None => Ok(PowerState::POWERED_ON),
        }
    }

    async fn release_vm(&self, _vm: VmHandle) {
        self.record(Call::ReleaseVm);
    }

    async fn disconnect(&self, _host: &HostHandle) {
        self.record(Call::Disconnect);
    }

    async fn release_host(&self, _host: HostHandle) {
        self.record(Call::ReleaseHost);
    }
}
