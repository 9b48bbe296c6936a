//! Host GPU probe: resolves CUDA availability and the device-name list.
//!
//! Each field is resolved through a precedence chain:
//!
//! 1. Environment (`CUDA_AVAILABLE`, `GPU_NAMES`)
//! 2. The sys_info config file
//! 3. A live `nvidia-smi` query

use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::exec;

/// Environment variable overriding CUDA availability (boolean-like string).
pub const CUDA_AVAILABLE_VAR: &str = "CUDA_AVAILABLE";

/// Environment variable overriding the device-name list (whitespace-separated).
pub const GPU_NAMES_VAR: &str = "GPU_NAMES";

/// Resolved view of the host's GPU situation for one run.
#[derive(Debug, Clone)]
pub struct HostProbe {
    /// Whether a CUDA-capable driver stack is usable.
    pub cuda_available: bool,

    /// Ordered GPU device names, as reported by the driver.
    pub gpu_names: Vec<String>,

    /// True when the name list came from a live `nvidia-smi` query rather
    /// than the environment or the config file.
    pub live_probed: bool,
}

impl HostProbe {
    /// Resolve the probe from the process environment, the config file, and
    /// (as a last resort) a live `nvidia-smi` query.
    pub fn gather(config: Option<&ConfigFile>) -> Self {
        let env_cuda = std::env::var(CUDA_AVAILABLE_VAR).ok();
        let env_names = std::env::var(GPU_NAMES_VAR).ok();
        Self::resolve(
            config,
            env_cuda.as_deref(),
            env_names.as_deref(),
            nvidia_smi_device_names,
        )
    }

    /// Pure resolution over explicit sources. `live` is only invoked when
    /// neither the environment nor the config file yields device names.
    pub fn resolve(
        config: Option<&ConfigFile>,
        env_cuda: Option<&str>,
        env_names: Option<&str>,
        live: impl FnOnce() -> Option<Vec<String>>,
    ) -> Self {
        let cuda_info = config.and_then(|c| c.system_info.cuda_info.as_ref());

        let mut live_probed = false;
        let gpu_names: Vec<String> = if let Some(raw) = env_names {
            raw.split_whitespace().map(str::to_string).collect()
        } else if let Some(names) = cuda_info
            .map(|ci| ci.device_names())
            .filter(|names| !names.is_empty())
        {
            names
        } else {
            live_probed = true;
            live().unwrap_or_default()
        };

        let cuda_available = if let Some(raw) = env_cuda {
            match parse_bool_like(raw) {
                Some(value) => value,
                None => {
                    warn!(raw, "Unrecognized {CUDA_AVAILABLE_VAR} value, treating as false");
                    false
                }
            }
        } else if let Some(ci) = cuda_info {
            ci.available()
        } else {
            // No declared source; a successful live probe with at least one
            // device implies a working CUDA driver stack.
            live_probed && !gpu_names.is_empty()
        };

        info!(cuda_available, gpus = ?gpu_names, live_probed, "Host GPU probe");

        Self {
            cuda_available,
            gpu_names,
            live_probed,
        }
    }
}

/// Parse a boolean-like environment string.
pub fn parse_bool_like(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Query device names from `nvidia-smi`.
///
/// Returns `None` when the binary is missing or the query fails, which on a
/// CPU-only or AMD host is the expected outcome, not an error.
pub fn nvidia_smi_device_names() -> Option<Vec<String>> {
    let output = match exec::capture("nvidia-smi", &["--query-gpu=name", "--format=csv,noheader"]) {
        Ok(out) => out,
        Err(err) => {
            debug!(%err, "nvidia-smi query failed, assuming no NVIDIA devices");
            return None;
        }
    };

    let names: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    Some(names)
}
