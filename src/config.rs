//! Host configuration loaded from the sys_info-generated `config.toml`.
//!
//! The file is produced by the system-information collector and carries a
//! `[system_info]` table with host facts plus a `CUDA_Info` section describing
//! GPU availability. The collector writes `CUDA_Info` as a plain error string
//! when no NVML is present, so that field deserializes from either shape.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level shape of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub system_info: SystemInfo,
}

/// The `[system_info]` table. Only the fields this tool consumes are modeled;
/// unknown keys written by the collector are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(rename = "OS", default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(rename = "Architecture", default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,

    #[serde(rename = "CUDA_Info", default, skip_serializing_if = "Option::is_none")]
    pub cuda_info: Option<CudaInfo>,
}

/// `CUDA_Info` is a table when the collector could query the driver, or a
/// bare message string when it could not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CudaInfo {
    Probed(CudaProbe),
    Unavailable(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CudaProbe {
    #[serde(rename = "CUDA_Available", default)]
    pub cuda_available: bool,

    #[serde(rename = "Devices", default)]
    pub devices: Vec<CudaDevice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CudaDevice {
    #[serde(rename = "Index", default)]
    pub index: usize,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Memory_Total_MB", default, skip_serializing_if = "Option::is_none")]
    pub memory_total_mb: Option<u64>,
}

impl CudaInfo {
    /// Whether the config file claims CUDA is usable.
    pub fn available(&self) -> bool {
        match self {
            CudaInfo::Probed(probe) => probe.cuda_available,
            CudaInfo::Unavailable(_) => false,
        }
    }

    /// Device names in collector order.
    pub fn device_names(&self) -> Vec<String> {
        match self {
            CudaInfo::Probed(probe) => probe.devices.iter().map(|d| d.name.clone()).collect(),
            CudaInfo::Unavailable(_) => Vec::new(),
        }
    }
}

impl ConfigFile {
    /// Load `config.toml` if present.
    ///
    /// A missing file is not an error: the host can still be described via
    /// the `CUDA_AVAILABLE` / `GPU_NAMES` environment variables or a live
    /// `nvidia-smi` probe, and a fresh file is written back afterwards.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            warn!("Config file not found at {path:?}, probing the host instead");
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path:?}"))?;
        let config: ConfigFile =
            toml::from_str(&data).with_context(|| format!("parsing config file {path:?}"))?;
        Ok(Some(config))
    }

    /// Persist the config so the next invocation can skip the live probe.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let data = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, data).with_context(|| format!("writing config file {path:?}"))?;
        Ok(())
    }

    /// Build a config describing the current host from probe results.
    pub fn from_probe(cuda_available: bool, gpu_names: &[String]) -> Self {
        Self {
            system_info: SystemInfo {
                os: Some(std::env::consts::OS.to_string()),
                architecture: Some(std::env::consts::ARCH.to_string()),
                cuda_info: Some(CudaInfo::Probed(CudaProbe {
                    cuda_available,
                    devices: gpu_names
                        .iter()
                        .enumerate()
                        .map(|(index, name)| CudaDevice {
                            index,
                            name: name.clone(),
                            memory_total_mb: None,
                        })
                        .collect(),
                })),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
[system_info]
OS = "Linux"
OS_Version = "202 SMP"
Architecture = "64bit"
Machine = "x86_64"

[system_info.CUDA_Info]
CUDA_Available = true

[[system_info.CUDA_Info.Devices]]
Index = 0
Name = "NVIDIA GeForce RTX 3090"
Memory_Total_MB = 24576

[[system_info.CUDA_Info.Devices]]
Index = 1
Name = "Tesla T4"
"#;

    #[test]
    fn test_parse_full_config() {
        let cfg: ConfigFile = toml::from_str(FULL_CONFIG).unwrap();
        let cuda = cfg.system_info.cuda_info.unwrap();
        assert!(cuda.available());
        assert_eq!(
            cuda.device_names(),
            vec!["NVIDIA GeForce RTX 3090", "Tesla T4"]
        );
    }

    #[test]
    fn test_parse_cuda_info_as_message() {
        // The collector writes a bare string when NVML is missing.
        let raw = r#"
[system_info]
OS = "Linux"
CUDA_Info = "pynvml module not installed. CUDA information not available."
"#;
        let cfg: ConfigFile = toml::from_str(raw).unwrap();
        let cuda = cfg.system_info.cuda_info.unwrap();
        assert!(!cuda.available());
        assert!(cuda.device_names().is_empty());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let raw = r#"
[system_info]
Python_Version = "3.11.4"
Processor = "x86_64"

[system_info.Disk_Usage]
Total = "512.00 GB"
"#;
        let cfg: ConfigFile = toml::from_str(raw).unwrap();
        assert!(cfg.system_info.cuda_info.is_none());
    }

    #[test]
    fn test_probe_round_trip() {
        let names = vec!["NVIDIA GeForce GTX 1070".to_string()];
        let cfg = ConfigFile::from_probe(true, &names);

        let serialized = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ConfigFile = toml::from_str(&serialized).unwrap();

        let cuda = parsed.system_info.cuda_info.unwrap();
        assert!(cuda.available());
        assert_eq!(cuda.device_names(), names);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ConfigFile::load(&dir.path().join("config.toml")).unwrap();
        assert!(loaded.is_none());
    }
}
