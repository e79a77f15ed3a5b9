//! `vmrun`-backed collaborator implementation.
//!
//! Drives VMware Fusion or Workstation through the `vmrun` command-line
//! tool. Each operation runs one vmrun invocation to completion.
//!
//! vmrun has no handle concept, so handles are issued locally by a
//! [`HandleRegistry`] and mapped back to `.vmx` paths on every call.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use warden_core::{ErrorCode, HostHandle, PowerState, VixError, VmHandle};

use crate::{HandleRegistry, VixApi, VmrunConfig};

/// Header line printed by `vmrun list`.
const LIST_HEADER: &str = "Total running VMs:";

/// Collaborator that shells out to `vmrun`.
#[derive(Debug)]
pub struct VmrunHost {
    config: VmrunConfig,
    registry: HandleRegistry,
}

impl VmrunHost {
    /// Create a host with the given configuration.
    #[must_use]
    pub fn new(config: VmrunConfig) -> Self {
        Self {
            config,
            registry: HandleRegistry::new(),
        }
    }

    /// Run `vmrun -T <type> <args...>` and return its stdout.
    async fn vmrun<I, S>(&self, args: I) -> Result<String, VixError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.config.binary)
            .arg("-T")
            .arg(self.config.host_type.flag())
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                VixError::with_detail(
                    ErrorCode::FAIL,
                    format!("exec {}: {e}", self.config.binary.display()),
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = error_line(&stdout)
            .or_else(|| error_line(&stderr))
            .map_or_else(|| format!("vmrun exited with {}", output.status), str::to_owned);
        Err(VixError::with_detail(ErrorCode::FAIL, detail))
    }

    /// Return the `.vmx` paths vmrun currently reports as running.
    async fn running_vms(&self) -> Result<Vec<PathBuf>, VixError> {
        let output = self.vmrun(["list"]).await?;
        let listed = parse_running_vms(&output)?;

        let mut running = Vec::with_capacity(listed.len());
        for path in listed {
            running.push(tokio::fs::canonicalize(&path).await.unwrap_or_else(|_| path.clone()));
        }
        Ok(running)
    }

    async fn is_running(&self, vmx: &Path) -> Result<bool, VixError> {
        Ok(self.running_vms().await?.iter().any(|p| p == vmx))
    }
}

#[async_trait]
impl VixApi for VmrunHost {
    async fn connect(&self) -> Result<HostHandle, VixError> {
        which_binary(&self.config.binary)?;

        tracing::debug!(
            binary = %self.config.binary.display(),
            host_type = %self.config.host_type,
            "connecting to vmrun host"
        );

        self.vmrun(["list"]).await.map_err(|e| {
            let detail = e.detail.unwrap_or_else(|| e.code.text().to_owned());
            VixError::with_detail(ErrorCode::CANNOT_CONNECT_TO_HOST, detail)
        })?;

        self.registry.register_host().await
    }

    async fn open_vm(&self, host: &HostHandle, path: &Path) -> Result<VmHandle, VixError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| VixError::with_detail(ErrorCode::FILE_NOT_FOUND, format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(VixError::with_detail(
                ErrorCode::FILE_NOT_FOUND,
                format!("{} is not a .vmx file", path.display()),
            ));
        }

        let vmx = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| VixError::with_detail(ErrorCode::FILE_NOT_FOUND, format!("{}: {e}", path.display())))?;

        let vm = self.registry.register_vm(host, vmx).await?;
        tracing::debug!(%vm, path = %path.display(), "opened VM");
        Ok(vm)
    }

    async fn power_on(&self, vm: &VmHandle) -> Result<(), VixError> {
        let entry = self.registry.vm(vm).await?;
        if self.is_running(&entry.vmx).await? {
            tracing::debug!(%vm, "VM already running, skipping start");
            return Ok(());
        }
        self.vmrun([OsStr::new("start"), entry.vmx.as_os_str(), OsStr::new("nogui")])
            .await
            .map(drop)
    }

    async fn suspend(&self, vm: &VmHandle) -> Result<(), VixError> {
        let entry = self.registry.vm(vm).await?;
        if !self.is_running(&entry.vmx).await? {
            return Err(VixError::new(ErrorCode::VM_NOT_RUNNING));
        }
        self.vmrun([OsStr::new("suspend"), entry.vmx.as_os_str()])
            .await
            .map(drop)
    }

    async fn power_state(&self, vm: &VmHandle) -> Result<PowerState, VixError> {
        let entry = self.registry.vm(vm).await?;
        if self.is_running(&entry.vmx).await? {
            return Ok(PowerState::POWERED_ON);
        }
        if has_suspend_state(&entry.vmx).await {
            return Ok(PowerState::SUSPENDED);
        }
        Ok(PowerState::POWERED_OFF)
    }

    async fn release_vm(&self, vm: VmHandle) {
        match self.registry.release_vm(vm).await {
            Ok(entry) => {
                tracing::debug!(vmx = %entry.vmx.display(), opened_at = %entry.opened_at, "released VM handle");
            }
            Err(e) => tracing::warn!(error = %e, "release of VM handle failed"),
        }
    }

    async fn disconnect(&self, host: &HostHandle) {
        if self.registry.contains_host(host).await {
            tracing::debug!(%host, "disconnected from vmrun host");
        } else {
            tracing::warn!(%host, "disconnect of unknown host handle");
        }
    }

    async fn release_host(&self, host: HostHandle) {
        if let Err(e) = self.registry.release_host(host).await {
            tracing::warn!(error = %e, "release of host handle failed");
        }
    }
}

/// Parse the output of `vmrun list`.
///
/// The first line is `Total running VMs: N`, followed by one `.vmx` path per
/// line.
///
/// # Errors
/// Returns [`ErrorCode::FAIL`] if the header is missing or the number of
/// listed paths disagrees with it.
pub fn parse_running_vms(output: &str) -> Result<Vec<PathBuf>, VixError> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());

    let count = lines
        .next()
        .and_then(|header| header.strip_prefix(LIST_HEADER))
        .and_then(|n| n.trim().parse::<usize>().ok())
        .ok_or_else(|| VixError::with_detail(ErrorCode::FAIL, "unexpected vmrun list output"))?;

    let paths: Vec<PathBuf> = lines.map(PathBuf::from).collect();
    if paths.len() != count {
        return Err(VixError::with_detail(
            ErrorCode::FAIL,
            format!("vmrun list reported {count} VMs but listed {}", paths.len()),
        ));
    }
    Ok(paths)
}

/// Pick the `Error: ...` line vmrun prints on failure, if any.
fn error_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with("Error:"))
        .or_else(|| output.lines().map(str::trim).rfind(|l| !l.is_empty()))
}

/// Return `true` if `vmx` has a suspend-state file of its own.
///
/// The `.vmx` names its checkpoint in `checkpoint.vmState`; an empty value
/// means the VM is not suspended even if a stale `.vmss` is still on disk.
/// Without that key, a `.vmss` counts only if its name starts with the
/// `.vmx` file's stem.
async fn has_suspend_state(vmx: &Path) -> bool {
    let Some(dir) = vmx.parent() else {
        return false;
    };

    let contents = tokio::fs::read_to_string(vmx).await.unwrap_or_default();
    match checkpoint_vm_state(&contents) {
        Some("") => false,
        Some(state) => tokio::fs::try_exists(dir.join(state)).await.unwrap_or(false),
        None => has_own_vmss(dir, vmx).await,
    }
}

/// Value of the `checkpoint.vmState` key in `.vmx` contents, if present.
fn checkpoint_vm_state(contents: &str) -> Option<&str> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("checkpoint.vmState") {
            return None;
        }
        Some(value.trim().trim_matches('"'))
    })
}

async fn has_own_vmss(dir: &Path, vmx: &Path) -> bool {
    let Some(stem) = vmx.file_stem().and_then(OsStr::to_str) else {
        return false;
    };
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return false;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("vmss")) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        if name == stem || name.strip_prefix(stem).is_some_and(|rest| rest.starts_with('-')) {
            return true;
        }
    }
    false
}

/// Verify a binary exists either at the given path or in PATH.
fn which_binary(path: &Path) -> Result<(), VixError> {
    let missing = || {
        VixError::with_detail(
            ErrorCode::CANNOT_CONNECT_TO_HOST,
            format!("vmrun not found at {}", path.display()),
        )
    };

    if path.is_absolute() {
        return if path.exists() { Ok(()) } else { Err(missing()) };
    }

    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(path).exists()))
        .unwrap_or(false);

    if found {
        Ok(())
    } else {
        Err(missing())
    }
}
