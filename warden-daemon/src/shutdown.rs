//! Shutdown handler: suspend the VM and release everything.

use warden_core::{classify_suspend, Outcome, VmIdentity};
use warden_vix::VixApi;

use crate::bootstrap::Session;
use crate::error::{DaemonError, Operation};
use crate::supervisor::ExitStatus;

/// Suspend the VM, release the session and report success.
///
/// Always the last step of the lifecycle. A VM that is not running is
/// expected here; any other suspend failure is logged and cleanup goes on
/// regardless, so this never fails.
pub async fn shut_down<C: VixApi + ?Sized>(api: &C, session: Session, identity: &VmIdentity) -> ExitStatus {
    tracing::info!(vm = %identity, "Received sigterm, suspending {identity}");

    match classify_suspend(api.suspend(session.vm()).await) {
        Outcome::Success => {
            tracing::info!(vm = %identity, "Successfully suspended {identity}");
        }
        Outcome::Tolerated(e) => {
            tracing::info!(vm = %identity, reason = %e, "VM was not running, nothing to suspend");
        }
        Outcome::Fatal(e) => DaemonError::fatal(Operation::Suspend, e).log(),
    }

    session.release(api).await;
    ExitStatus::Success
}
