//! Power controller.

use warden_core::{VmHandle, VmIdentity};
use warden_vix::VixApi;

use crate::error::{DaemonError, Operation};

/// Power the VM on, relying on the collaborator to succeed if it is
/// already running.
///
/// # Errors
/// Returns [`DaemonError::Fatal`] for [`Operation::PowerOn`]; a VM that
/// cannot be powered on cannot be supervised.
pub async fn power_on<C: VixApi + ?Sized>(api: &C, vm: &VmHandle, identity: &VmIdentity) -> Result<(), DaemonError> {
    tracing::info!(vm = %identity, "Powering on {identity}");

    api.power_on(vm)
        .await
        .map_err(|e| DaemonError::fatal(Operation::PowerOn, e))?;

    tracing::info!(vm = %identity, "Successfully powered on {identity}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use warden_core::ErrorCode;

    use super::*;
    use crate::testing::{Call, ScriptedHost};

    fn vm() -> VmHandle {
        VmHandle::from_raw(NonZeroU32::MIN)
    }

    #[tokio::test]
    async fn power_on_issues_one_request() {
        let api = ScriptedHost::new();
        power_on(&api, &vm(), &VmIdentity::new("/vms/a.vmx"))
            .await
            .expect("power on");
        assert_eq!(api.calls(), vec![Call::PowerOn]);
    }

    #[tokio::test]
    async fn power_on_failure_is_fatal() {
        let api = ScriptedHost::new().power_on_results([Some(ErrorCode::FAIL)]);
        let result = power_on(&api, &vm(), &VmIdentity::new("/vms/a.vmx")).await;
        assert!(
            matches!(result, Err(DaemonError::Fatal { op: Operation::PowerOn, .. })),
            "power-on failure must be fatal"
        );
    }
}
