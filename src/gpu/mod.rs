//! GPU discovery and vendor classification.
//!
//! - [`probe`]: resolve CUDA availability and device names from env/config/nvidia-smi
//! - [`vendor`]: classify device names into NVIDIA / AMD / CPU-only

pub mod probe;
pub mod vendor;
