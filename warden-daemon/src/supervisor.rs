//! Lifecycle supervisor.
//!
//! Drives the daemon through
//! `Bootstrapping -> PoweringOn -> Supervising -> ShuttingDown -> Terminated`.
//! Startup failures go straight to `Terminated` with a failure status.
//!
//! The steady state is a single `select!` over the termination future and the
//! poll timer. Collaborator calls are awaited inline, so no two handlers
//! ever run at once and the handles need no locking.

use std::future::Future;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use tokio::time::{self, Instant, MissedTickBehavior};
use warden_core::VmIdentity;
use warden_vix::VixApi;

use crate::bootstrap::{self, Session};
use crate::error::DaemonError;
use crate::{health, power, shutdown, DaemonConfig};

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Shut down through the termination signal.
    Success,
    /// Any other path.
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::SUCCESS,
            ExitStatus::Failure => ExitCode::FAILURE,
        }
    }
}

/// Where the supervisor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Bootstrapping,
    PoweringOn,
    Supervising,
    ShuttingDown,
    /// Absorbing; the process should exit with the carried status.
    Terminated(ExitStatus),
}

/// Owns the collaborator and the VM identity for the life of the process.
pub struct Supervisor<C: VixApi> {
    api: C,
    identity: VmIdentity,
    config: DaemonConfig,
    state: LifecycleState,
}

impl<C: VixApi> Supervisor<C> {
    /// Create a supervisor for the VM named by `identity`.
    #[must_use]
    pub fn new(api: C, identity: VmIdentity, config: DaemonConfig) -> Self {
        Self {
            api,
            identity,
            config,
            state: LifecycleState::Bootstrapping,
        }
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &C {
        &self.api
    }

    /// The managed VM.
    #[must_use]
    pub fn identity(&self) -> &VmIdentity {
        &self.identity
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Run the whole lifecycle until `terminate` resolves or a fatal error
    /// occurs, and return the status the process should exit with.
    ///
    /// Must be called once; the supervisor is `Terminated` afterwards.
    pub async fn run<F>(&mut self, terminate: F) -> ExitStatus
    where
        F: Future<Output = ()>,
    {
        if self.state != LifecycleState::Bootstrapping {
            tracing::error!(state = ?self.state, "supervisor already ran");
            return ExitStatus::Failure;
        }

        let session = match bootstrap::connect(&self.api, &self.identity).await {
            Ok(session) => session,
            Err(e) => return self.fail(&e),
        };

        self.transition(LifecycleState::PoweringOn);
        if let Err(e) = power::power_on(&self.api, session.vm(), &self.identity).await {
            session.release(&self.api).await;
            return self.fail(&e);
        }

        self.transition(LifecycleState::Supervising);
        let since = Utc::now();
        if let Err(e) = self.supervise(&session, terminate).await {
            session.release(&self.api).await;
            return self.fail(&e);
        }

        self.transition(LifecycleState::ShuttingDown);
        tracing::debug!(vm = %self.identity, since = %since, uptime = %uptime(since), "leaving steady state");
        let status = shutdown::shut_down(&self.api, session, &self.identity).await;
        self.transition(LifecycleState::Terminated(status));
        status
    }

    /// The steady state. Returns once `terminate` resolves.
    async fn supervise<F>(&self, session: &Session, terminate: F) -> Result<(), DaemonError>
    where
        F: Future<Output = ()>,
    {
        let period = self.config.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(terminate);

        tracing::info!(vm = %self.identity, poll_interval = ?period, "supervising");

        loop {
            tokio::select! {
                biased;
                () = &mut terminate => return Ok(()),
                _ = ticker.tick() => {
                    health::check_state(&self.api, session.vm(), &self.identity).await?;
                }
            }
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    fn fail(&mut self, err: &DaemonError) -> ExitStatus {
        err.log();
        self.transition(LifecycleState::Terminated(ExitStatus::Failure));
        ExitStatus::Failure
    }
}

fn uptime(since: DateTime<Utc>) -> String {
    let elapsed = Utc::now() - since;
    format!("{}s", elapsed.num_seconds())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use warden_core::{ErrorCode, PowerState};

    use super::*;
    use crate::testing::{Call, ScriptedHost};

    fn supervisor(api: ScriptedHost) -> Supervisor<ScriptedHost> {
        Supervisor::new(api, VmIdentity::new("/vms/ci.vmx"), DaemonConfig::default())
    }

    fn startup() -> Vec<Call> {
        vec![Call::Connect, Call::Open(PathBuf::from("/vms/ci.vmx")), Call::PowerOn]
    }

    #[tokio::test(start_paused = true)]
    async fn startup_then_shutdown_suspends_and_releases() {
        let mut sup = supervisor(ScriptedHost::new());
        let status = sup.run(std::future::ready(())).await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(sup.state(), LifecycleState::Terminated(ExitStatus::Success));

        let mut expected = startup();
        expected.extend([Call::Suspend, Call::ReleaseVm, Call::Disconnect, Call::ReleaseHost]);
        assert_eq!(sup.api().calls(), expected, "power-on must precede the first tick");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_failure_terminates_without_releasing_vm() {
        let mut sup = supervisor(ScriptedHost::new().failing_connect(ErrorCode::CANNOT_CONNECT_TO_HOST));
        let status = sup.run(std::future::pending()).await;

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(sup.state(), LifecycleState::Terminated(ExitStatus::Failure));
        assert_eq!(sup.api().calls(), vec![Call::Connect]);
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_terminates_after_host_cleanup() {
        let mut sup = supervisor(ScriptedHost::new().failing_open(ErrorCode::FILE_NOT_FOUND));
        let status = sup.run(std::future::pending()).await;

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(
            sup.api().calls(),
            vec![
                Call::Connect,
                Call::Open(PathBuf::from("/vms/ci.vmx")),
                Call::Disconnect,
                Call::ReleaseHost,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn power_on_failure_skips_suspend() {
        let mut sup = supervisor(ScriptedHost::new().power_on_results([Some(ErrorCode::FAIL)]));
        let status = sup.run(std::future::pending()).await;

        assert_eq!(status, ExitStatus::Failure);
        let mut expected = startup();
        expected.extend([Call::ReleaseVm, Call::Disconnect, Call::ReleaseHost]);
        assert_eq!(sup.api().calls(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_period_and_restarts_only_when_off() {
        let api = ScriptedHost::new().states([
            Ok(PowerState::POWERED_ON),
            Ok(PowerState::POWERED_OFF),
            Ok(PowerState::SUSPENDED),
        ]);
        let mut sup = supervisor(api);

        // Ticks land at 30s, 60s and 90s.
        let status = sup.run(time::sleep(Duration::from_secs(95))).await;

        assert_eq!(status, ExitStatus::Success);
        let api = sup.api();
        assert_eq!(api.count(&Call::PowerState), 3);
        assert_eq!(api.count(&Call::PowerOn), 2, "initial power-on plus one restart");
        assert_eq!(api.count(&Call::Suspend), 1);

        let calls = api.calls();
        let restart = calls
            .iter()
            .rposition(|c| *c == Call::PowerOn)
            .expect("restart recorded");
        assert_eq!(calls[restart - 1], Call::PowerState, "restart follows a state read");
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_period() {
        let mut sup = supervisor(ScriptedHost::new());
        let status = sup.run(time::sleep(Duration::from_secs(29))).await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(sup.api().count(&Call::PowerState), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_poll_interval_is_honoured() {
        let mut sup = Supervisor::new(
            ScriptedHost::new(),
            VmIdentity::new("/vms/ci.vmx"),
            DaemonConfig::with_poll_interval(Duration::from_secs(5)),
        );
        let _ = sup.run(time::sleep(Duration::from_secs(22))).await;
        assert_eq!(sup.api().count(&Call::PowerState), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_state_terminates_with_failure() {
        let api = ScriptedHost::new().states([Ok(PowerState::POWERED_ON), Err(ErrorCode::FAIL)]);
        let mut sup = supervisor(api);
        let status = sup.run(std::future::pending()).await;

        assert_eq!(status, ExitStatus::Failure);
        let api = sup.api();
        assert_eq!(api.count(&Call::Suspend), 0, "fatal path must not suspend");
        assert_eq!(
            &api.calls()[api.calls().len() - 3..],
            &[Call::ReleaseVm, Call::Disconnect, Call::ReleaseHost]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_restart_terminates_with_failure() {
        let api = ScriptedHost::new()
            .states([Ok(PowerState::POWERED_OFF)])
            .power_on_results([None, Some(ErrorCode::FAIL)]);
        let mut sup = supervisor(api);
        let status = sup.run(std::future::pending()).await;

        assert_eq!(status, ExitStatus::Failure);
        assert_eq!(sup.api().count(&Call::PowerOn), 2);
        assert_eq!(sup.api().count(&Call::ReleaseHost), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_with_vm_already_suspended_succeeds() {
        let api = ScriptedHost::new().failing_suspend(ErrorCode::VM_NOT_RUNNING);
        let mut sup = supervisor(api);
        let status = sup.run(std::future::ready(())).await;

        assert_eq!(status, ExitStatus::Success);
        assert_eq!(sup.api().count(&Call::ReleaseVm), 1);
        assert_eq!(sup.api().count(&Call::ReleaseHost), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_is_refused() {
        let mut sup = supervisor(ScriptedHost::new());
        assert_eq!(sup.run(std::future::ready(())).await, ExitStatus::Success);
        let calls = sup.api().calls().len();

        assert_eq!(sup.run(std::future::ready(())).await, ExitStatus::Failure);
        assert_eq!(sup.api().calls().len(), calls, "no collaborator call after termination");
    }
}
