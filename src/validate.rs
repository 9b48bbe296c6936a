//! Post-install smoke tests.
//!
//! Two independent checks, each fatal on failure with no retries: one proves
//! the engine can run a container at all, the other proves GPU passthrough
//! reaches the driver from inside a container.

use anyhow::{Context, Result};
use tracing::info;

use crate::exec;

/// Prove the engine works by running a trivial container to completion.
pub fn verify_engine() -> Result<()> {
    exec::run("docker", &["run", "--rm", "hello-world"])
        .context("container engine smoke test failed: `docker run --rm hello-world`")?;
    info!("Container engine smoke test passed");
    Ok(())
}

/// Prove GPU passthrough works by running `nvidia-smi` inside a container.
pub fn verify_gpu_passthrough() -> Result<()> {
    exec::run("docker", &["run", "--rm", "--gpus=all", "ubuntu", "nvidia-smi"])
        .context("GPU passthrough smoke test failed: `docker run --rm --gpus=all ubuntu nvidia-smi`")?;
    info!("GPU passthrough smoke test passed");
    Ok(())
}
