//! Docker engine installation (Debian/Ubuntu apt flow).
//!
//! The install is idempotent: a `docker` binary already on `PATH` short-
//! circuits the whole sequence. A fresh install adds the invoking user to the
//! `docker` group, which is invisible to the current session — the driver
//! reacts to [`EngineStatus::InstalledRelogRequired`] by asking the operator
//! to re-authenticate and re-run the tool (second invocation then takes the
//! already-installed path and resumes provisioning).
//!
//! Install-step failures are fatal with no rollback: a half-configured apt
//! repository is easier to diagnose than a half-undone one.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::exec;

/// Binary name probed on `PATH` to decide whether Docker is installed.
pub const ENGINE_BINARY: &str = "docker";

const KEYRING_PATH: &str = "/etc/apt/keyrings/docker.asc";
const REPO_LIST_PATH: &str = "/etc/apt/sources.list.d/docker.list";
const GPG_KEY_URL: &str = "https://download.docker.com/linux/ubuntu/gpg";
const REPO_URL: &str = "https://download.docker.com/linux/ubuntu";

/// Outcome of [`ensure_installed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Docker was already on `PATH`; nothing was changed.
    AlreadyInstalled,

    /// Docker was installed and the user was added to the `docker` group.
    /// The current session cannot see the new membership; the operator must
    /// re-authenticate and run the tool again.
    InstalledRelogRequired,
}

/// Ensure the Docker engine is installed, installing it if absent.
pub fn ensure_installed() -> Result<EngineStatus> {
    if exec::binary_on_path(ENGINE_BINARY) {
        info!("Docker already installed");
        return Ok(EngineStatus::AlreadyInstalled);
    }

    info!("Docker not found, installing");
    install().context("Docker installation failed")?;
    add_user_to_docker_group().context("adding user to docker group failed")?;

    Ok(EngineStatus::InstalledRelogRequired)
}

fn install() -> Result<()> {
    exec::run("sudo", &["apt-get", "update"])?;
    exec::run("sudo", &["apt-get", "install", "-y", "ca-certificates", "curl"])?;

    // Docker's signing key and apt repository.
    exec::run("sudo", &["install", "-m", "0755", "-d", "/etc/apt/keyrings"])?;
    exec::shell(&format!(
        "sudo curl -fsSL {GPG_KEY_URL} -o {KEYRING_PATH}"
    ))?;
    exec::run("sudo", &["chmod", "a+r", KEYRING_PATH])?;

    let arch = exec::capture("dpkg", &["--print-architecture"])?;
    let codename = os_release_codename()?;
    let repo_line = docker_repo_line(arch.trim(), &codename);
    exec::shell(&format!(
        "echo \"{repo_line}\" | sudo tee {REPO_LIST_PATH} > /dev/null"
    ))?;

    exec::run("sudo", &["apt-get", "update"])?;
    exec::run(
        "sudo",
        &[
            "apt-get",
            "install",
            "-y",
            "docker-ce",
            "docker-ce-cli",
            "containerd.io",
            "docker-buildx-plugin",
            "docker-compose-plugin",
        ],
    )?;

    info!("Docker packages installed");
    Ok(())
}

fn add_user_to_docker_group() -> Result<()> {
    let user = std::env::var("USER").context("USER environment variable not set")?;
    exec::run("sudo", &["usermod", "-aG", "docker", &user])?;
    info!(user, "Added user to docker group");
    Ok(())
}

/// apt source line for the Docker repository.
fn docker_repo_line(arch: &str, codename: &str) -> String {
    format!("deb [arch={arch} signed-by={KEYRING_PATH}] {REPO_URL} {codename} stable")
}

/// Distribution codename from `/etc/os-release` (`VERSION_CODENAME`).
fn os_release_codename() -> Result<String> {
    let data =
        std::fs::read_to_string("/etc/os-release").context("reading /etc/os-release")?;
    match parse_version_codename(&data) {
        Some(codename) => Ok(codename),
        None => bail!("VERSION_CODENAME not found in /etc/os-release"),
    }
}

fn parse_version_codename(os_release: &str) -> Option<String> {
    os_release
        .lines()
        .find_map(|line| line.strip_prefix("VERSION_CODENAME="))
        .map(|value| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
