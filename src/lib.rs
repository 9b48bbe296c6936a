//! ollama-provision: single-host provisioning for an Ollama inference server.
//!
//! Installs the Docker engine, conditionally installs the NVIDIA Container
//! Toolkit, classifies the host's GPU vendor, and launches the `ollama`
//! container bound to host port 11434.
//!
//! # Two-invocation contract
//!
//! A fresh Docker install adds the invoking user to the `docker` group. The
//! current session cannot see the new membership, so the first invocation
//! stops there (exit 0) and asks the operator to re-authenticate. The second
//! invocation finds Docker on `PATH`, skips the install, and completes
//! provisioning.

pub mod config;
pub mod engine;
pub mod exec;
pub mod gpu;
pub mod launcher;
pub mod validate;

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ollama-provision",
    about = "Provision Docker and GPU passthrough, then serve Ollama on port 11434"
)]
pub struct Cli {
    /// Path to the sys_info configuration file (TOML).
    #[arg(short, long, default_value = "./config.toml")]
    pub config: PathBuf,

    /// Log file capturing the combined output of the run (appended).
    #[arg(long, default_value = "provision.log")]
    pub log_file: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}
