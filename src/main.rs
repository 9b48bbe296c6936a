//! Provisioning driver: one linear pass over the five steps.
//!
//! engine install → engine smoke test → vendor classification →
//! (NVIDIA + CUDA: toolkit install + passthrough smoke test) → launch.
//!
//! Exit status: 0 on success and on the "re-authenticate and re-run" early
//! exit after a fresh engine install; 1 on any installer or validator
//! failure.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ollama_provision::config::ConfigFile;
use ollama_provision::engine::installer::{self, EngineStatus};
use ollama_provision::engine::toolkit::{self, ToolkitStatus};
use ollama_provision::gpu::probe::HostProbe;
use ollama_provision::gpu::vendor::{self, GpuVendor};
use ollama_provision::{launcher, validate, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    info!("ollama-provision v{}", env!("CARGO_PKG_VERSION"));

    // Resolve the host's GPU situation from config file, environment, and
    // (if needed) a live nvidia-smi query.
    let config = ConfigFile::load(&cli.config)?;
    let probe = HostProbe::gather(config.as_ref());

    if config.is_none() && probe.live_probed {
        // Persist the probe so the next invocation can skip it.
        let report = ConfigFile::from_probe(probe.cuda_available, &probe.gpu_names);
        if let Err(err) = report.save(&cli.config) {
            warn!(%err, "Could not write probed config (continuing)");
        } else {
            info!(path = %cli.config.display(), "Wrote host probe to config file");
        }
    }

    // Step 1: container engine.
    match installer::ensure_installed()? {
        EngineStatus::InstalledRelogRequired => {
            info!(
                "Docker installed and user added to the docker group. \
                 Log out and back in (or run `newgrp docker`), then re-run \
                 ollama-provision to finish."
            );
            return Ok(());
        }
        EngineStatus::AlreadyInstalled => {}
    }

    // Step 2: engine smoke test.
    validate::verify_engine()?;

    // Step 3: vendor classification.
    let vendor = vendor::classify(&probe.gpu_names);
    info!(%vendor, cuda = probe.cuda_available, "GPU vendor classification");

    // Step 4: GPU toolkit, NVIDIA + CUDA only.
    let gpu_serving = vendor == GpuVendor::Nvidia && probe.cuda_available;
    if gpu_serving {
        if toolkit::ensure_installed()? == ToolkitStatus::InstalledEngineRestarted {
            info!("Docker restarted with the nvidia runtime");
        }
        validate::verify_gpu_passthrough()?;
    } else if vendor == GpuVendor::Amd {
        // ROCm passthrough is not implemented; serve on CPU instead.
        warn!("AMD GPU detected but passthrough is unsupported, serving on CPU");
    } else if vendor == GpuVendor::Nvidia {
        warn!("NVIDIA GPU detected but CUDA unavailable, serving on CPU");
    }

    // Step 5: launch.
    launcher::replace_and_launch(vendor, probe.cuda_available)?;

    info!(
        port = launcher::HOST_PORT,
        "Ollama is serving; reach it at http://<host>:{}", launcher::HOST_PORT
    );
    Ok(())
}

/// Log to the console and append the same stream to the run's log file.
fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let default_filter = if cli.verbose {
        "ollama_provision=debug"
    } else {
        "ollama_provision=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cli.log_file)
        .with_context(|| format!("opening log file {:?}", cli.log_file))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}
