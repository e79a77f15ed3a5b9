//! Health monitor: one poll of the VM's power state.
//!
//! The collaborator offers no change notification, so the supervisor calls
//! [`check_state`] on a fixed period. Only the powered-off bit triggers a
//! restart; suspended, running and transitional states are left alone.

use warden_core::{PowerState, VmHandle, VmIdentity};
use warden_vix::VixApi;

use crate::error::{DaemonError, Operation};
use crate::power;

/// What a single health check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheck {
    /// The VM was not powered off; nothing was done.
    Untouched(PowerState),
    /// The VM was powered off and has been powered on again.
    Restarted(PowerState),
}

/// Read the VM's power state and power it on if it is off.
///
/// # Errors
/// Returns [`DaemonError::Fatal`] for [`Operation::GetPowerState`] if the
/// state cannot be read, or for [`Operation::PowerOn`] if the restart fails.
pub async fn check_state<C: VixApi + ?Sized>(
    api: &C,
    vm: &VmHandle,
    identity: &VmIdentity,
) -> Result<HealthCheck, DaemonError> {
    let state = api
        .power_state(vm)
        .await
        .map_err(|e| DaemonError::fatal(Operation::GetPowerState, e))?;

    if !state.is_powered_off() {
        tracing::trace!(vm = %identity, %state, "health check");
        return Ok(HealthCheck::Untouched(state));
    }

    tracing::warn!(vm = %identity, %state, "Restarting VM, state=0x{state:x}");
    power::power_on(api, vm, identity).await?;
    Ok(HealthCheck::Restarted(state))
}
