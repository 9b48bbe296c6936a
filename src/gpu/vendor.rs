//! GPU vendor classification from device-name strings.
//!
//! Classification is a pure function of the ordered name list: the first name
//! containing any known keyword decides the vendor. Within a single name the
//! NVIDIA keyword set is checked before the AMD set, so a name carrying both
//! (e.g. marketing strings mentioning a competitor) resolves to NVIDIA.

use serde::{Deserialize, Serialize};

/// Keywords identifying NVIDIA hardware. Matching is case-sensitive.
const NVIDIA_KEYWORDS: [&str; 5] = ["Tesla", "GeForce", "Quadro", "RTX", "GTX"];

/// Keywords identifying AMD hardware. Matching is case-sensitive.
const AMD_KEYWORDS: [&str; 2] = ["Radeon", "AMD"];

/// Detected GPU vendor for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    /// No recognized GPU; serve on CPU.
    Cpu,
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuVendor::Nvidia => write!(f, "NVIDIA"),
            GpuVendor::Amd => write!(f, "AMD"),
            GpuVendor::Cpu => write!(f, "CPU"),
        }
    }
}

/// Classify the host's GPU vendor from an ordered device-name list.
///
/// The first name matching either keyword set wins; an empty or
/// non-matching list classifies as [`GpuVendor::Cpu`].
pub fn classify<S: AsRef<str>>(names: &[S]) -> GpuVendor {
    for name in names {
        let name = name.as_ref();
        if NVIDIA_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return GpuVendor::Nvidia;
        }
        if AMD_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return GpuVendor::Amd;
        }
    }
    GpuVendor::Cpu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nvidia_keywords() {
        for name in [
            "Tesla T4",
            "NVIDIA GeForce GTX 1070",
            "Quadro M6000",
            "NVIDIA RTX A6000",
            "GTX 980 Ti",
        ] {
            assert_eq!(classify(&[name]), GpuVendor::Nvidia, "{name}");
        }
    }

    #[test]
    fn test_amd_keywords() {
        assert_eq!(classify(&["Radeon RX 7900 XTX"]), GpuVendor::Amd);
        assert_eq!(classify(&["AMD Instinct MI300"]), GpuVendor::Amd);
    }

    #[test]
    fn test_empty_and_unrecognized_are_cpu() {
        assert_eq!(classify::<&str>(&[]), GpuVendor::Cpu);
        assert_eq!(classify(&["Intel Arc A770", "llvmpipe"]), GpuVendor::Cpu);
    }

    #[test]
    fn test_first_matching_name_wins() {
        // The Radeon entry comes first, so AMD wins even though an NVIDIA
        // card appears later in the list.
        let names = ["Radeon RX 580", "NVIDIA GeForce RTX 3090"];
        assert_eq!(classify(&names), GpuVendor::Amd);

        let names = ["NVIDIA GeForce RTX 3090", "Radeon RX 580"];
        assert_eq!(classify(&names), GpuVendor::Nvidia);
    }

    #[test]
    fn test_nvidia_checked_before_amd_within_one_name() {
        // Both keyword sets match this single name; NVIDIA takes precedence.
        assert_eq!(classify(&["AMD bundle with RTX 4090"]), GpuVendor::Nvidia);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(classify(&["geforce gtx 1070"]), GpuVendor::Cpu);
        assert_eq!(classify(&["radeon rx 580"]), GpuVendor::Cpu);
    }

    #[test]
    fn test_non_matching_names_skipped() {
        let names = ["Matrox G200", "Tesla V100"];
        assert_eq!(classify(&names), GpuVendor::Nvidia);
    }
}
