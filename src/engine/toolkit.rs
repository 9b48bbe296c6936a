//! NVIDIA Container Toolkit installation.
//!
//! Only run for NVIDIA hosts with CUDA available. Installs the toolkit from
//! NVIDIA's apt repository, points the Docker daemon at the nvidia runtime,
//! and restarts the engine so `--gpus` works.
//!
//! There is no AMD equivalent here: ROCm passthrough is not implemented and
//! AMD hosts fall back to CPU-only serving in the launcher.

use anyhow::{Context, Result};
use tracing::info;

use crate::exec;

/// Binary installed by the toolkit; its presence short-circuits the install.
pub const TOOLKIT_BINARY: &str = "nvidia-ctk";

const KEYRING_PATH: &str = "/usr/share/keyrings/nvidia-container-toolkit-keyring.gpg";
const REPO_LIST_PATH: &str = "/etc/apt/sources.list.d/nvidia-container-toolkit.list";
const GPG_KEY_URL: &str = "https://nvidia.github.io/libnvidia-container/gpgkey";
const REPO_LIST_URL: &str =
    "https://nvidia.github.io/libnvidia-container/stable/deb/nvidia-container-toolkit.list";

/// Outcome of [`ensure_installed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolkitStatus {
    /// `nvidia-ctk` was already on `PATH`; nothing was changed.
    AlreadyInstalled,

    /// The toolkit was installed and the Docker daemon was reconfigured
    /// and restarted.
    InstalledEngineRestarted,
}

/// Ensure the NVIDIA Container Toolkit is installed and the Docker daemon
/// knows about the nvidia runtime.
pub fn ensure_installed() -> Result<ToolkitStatus> {
    if exec::binary_on_path(TOOLKIT_BINARY) {
        info!("NVIDIA Container Toolkit already installed");
        return Ok(ToolkitStatus::AlreadyInstalled);
    }

    info!("Installing NVIDIA Container Toolkit");
    install().context("NVIDIA Container Toolkit installation failed")?;
    configure_engine_runtime().context("configuring Docker for the nvidia runtime failed")?;

    Ok(ToolkitStatus::InstalledEngineRestarted)
}

fn install() -> Result<()> {
    exec::shell(&format!(
        "curl -fsSL {GPG_KEY_URL} | sudo gpg --dearmor -o {KEYRING_PATH}"
    ))?;
    exec::shell(&format!(
        "curl -s -L {REPO_LIST_URL} | \
         sed 's#deb https://#deb [signed-by={KEYRING_PATH}] https://#g' | \
         sudo tee {REPO_LIST_PATH} > /dev/null"
    ))?;

    exec::run("sudo", &["apt-get", "update"])?;
    exec::run("sudo", &["apt-get", "install", "-y", "nvidia-container-toolkit"])?;

    info!("NVIDIA Container Toolkit packages installed");
    Ok(())
}

fn configure_engine_runtime() -> Result<()> {
    exec::run(
        "sudo",
        &["nvidia-ctk", "runtime", "configure", "--runtime=docker"],
    )?;
    exec::run("sudo", &["systemctl", "restart", "docker"])?;
    info!("Docker daemon reconfigured for the nvidia runtime and restarted");
    Ok(())
}
