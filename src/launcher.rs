//! Ollama container launch: replace any prior instance, then `docker run`.
//!
//! The container always binds host port 11434 and keeps model data in a named
//! volume, so replacing the container never loses pulled models. Stopping and
//! removing the previous instance is best-effort (a missing prior container
//! is the common case); only the final `docker run` is allowed to fail the
//! run.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::exec;
use crate::gpu::vendor::GpuVendor;

/// Reserved name used to find and replace the inference server's container.
pub const CONTAINER_NAME: &str = "ollama";

/// Image serving the Ollama API.
pub const IMAGE: &str = "ollama/ollama";

/// Named volume keeping pulled models across container replacements.
pub const VOLUME_MAPPING: &str = "ollama:/root/.ollama";

/// Fixed host-to-container port mapping.
pub const PORT_MAPPING: &str = "11434:11434";

/// Host port the served API listens on.
pub const HOST_PORT: u16 = 11434;

/// Flag exposing all host GPUs to the container.
pub const GPU_FLAG: &str = "--gpus=all";

/// Subset of `docker inspect` output consumed here.
#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "State")]
    state: InspectState,
}

#[derive(Debug, Deserialize)]
struct InspectState {
    #[serde(rename = "Running")]
    running: bool,
}

/// Build the `docker run` argument list for the given classification.
///
/// GPU passthrough is only requested for NVIDIA hosts with CUDA available.
/// AMD hosts get the CPU-only form: ROCm passthrough is intentionally not
/// attempted here (see the toolkit module).
pub fn launch_args(vendor: GpuVendor, cuda_available: bool) -> Vec<&'static str> {
    let mut args = vec!["run", "-d"];
    if vendor == GpuVendor::Nvidia && cuda_available {
        args.push(GPU_FLAG);
    }
    args.extend([
        "-v",
        VOLUME_MAPPING,
        "-p",
        PORT_MAPPING,
        "--name",
        CONTAINER_NAME,
        IMAGE,
    ]);
    args
}

/// Replace any prior `ollama` container and launch a new one.
pub fn replace_and_launch(vendor: GpuVendor, cuda_available: bool) -> Result<()> {
    remove_existing();

    let args = launch_args(vendor, cuda_available);
    info!(
        gpu = vendor == GpuVendor::Nvidia && cuda_available,
        "Launching {IMAGE} as '{CONTAINER_NAME}' on port {HOST_PORT}"
    );
    exec::run("docker", &args).context("launching the ollama container failed")?;

    Ok(())
}

/// Stop and remove a prior container with the reserved name, if any.
///
/// Every step is best-effort: absence of a prior container, or a container
/// already stopped, must not abort provisioning.
fn remove_existing() {
    match existing_container_running(CONTAINER_NAME) {
        None => {
            debug!("No existing '{CONTAINER_NAME}' container");
        }
        Some(running) => {
            warn!(running, "Replacing existing '{CONTAINER_NAME}' container");
            if running {
                exec::run_best_effort("docker", &["stop", CONTAINER_NAME]);
            }
            exec::run_best_effort("docker", &["rm", CONTAINER_NAME]);
        }
    }
}

/// Whether a container with `name` exists, and if so whether it is running.
fn existing_container_running(name: &str) -> Option<bool> {
    let output = exec::capture("docker", &["inspect", name]).ok()?;
    parse_inspect_running(&output)
}

fn parse_inspect_running(raw: &str) -> Option<bool> {
    let entries: Vec<InspectEntry> = serde_json::from_str(raw).ok()?;
    entries.first().map(|entry| entry.state.running)
}
