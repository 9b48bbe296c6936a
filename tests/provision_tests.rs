//! End-to-end tests for the pure provisioning pipeline: config file on disk
//! → host probe → vendor classification → launch arguments.

use ollama_provision::config::ConfigFile;
use ollama_provision::gpu::probe::HostProbe;
use ollama_provision::gpu::vendor::{classify, GpuVendor};
use ollama_provision::launcher;

fn write_config(dir: &tempfile::TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_nvidia_host_gets_gpu_launch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[system_info]
OS = "Linux"

[system_info.CUDA_Info]
CUDA_Available = true

[[system_info.CUDA_Info.Devices]]
Index = 0
Name = "NVIDIA GeForce RTX 3090"
"#,
    );

    let config = ConfigFile::load(&path).unwrap().expect("config present");
    let probe = HostProbe::resolve(Some(&config), None, None, || {
        panic!("live probe must not run")
    });

    let vendor = classify(&probe.gpu_names);
    assert_eq!(vendor, GpuVendor::Nvidia);
    assert!(probe.cuda_available);

    let args = launcher::launch_args(vendor, probe.cuda_available);
    assert!(args.contains(&launcher::GPU_FLAG));
    assert!(args.contains(&"11434:11434"));
}

#[test]
fn test_amd_host_falls_back_to_cpu_launch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[system_info]
[system_info.CUDA_Info]
CUDA_Available = false

[[system_info.CUDA_Info.Devices]]
Index = 0
Name = "AMD Radeon RX 7900 XTX"
"#,
    );

    let config = ConfigFile::load(&path).unwrap().unwrap();
    let probe = HostProbe::resolve(Some(&config), None, None, || None);

    let vendor = classify(&probe.gpu_names);
    assert_eq!(vendor, GpuVendor::Amd);

    let args = launcher::launch_args(vendor, probe.cuda_available);
    assert!(!args.contains(&launcher::GPU_FLAG));
    assert!(args.contains(&"11434:11434"));
}

#[test]
fn test_cpu_host_without_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let config = ConfigFile::load(&path).unwrap();
    assert!(config.is_none());

    // Live probe finds nothing: CPU-only host.
    let probe = HostProbe::resolve(config.as_ref(), None, None, || None);
    assert!(probe.live_probed);
    assert!(!probe.cuda_available);

    let vendor = classify(&probe.gpu_names);
    assert_eq!(vendor, GpuVendor::Cpu);

    let args = launcher::launch_args(vendor, probe.cuda_available);
    assert!(!args.contains(&launcher::GPU_FLAG));
}

#[test]
fn test_probed_config_is_reloadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    // First run: live probe, persisted for the next run.
    let names = vec!["Tesla T4".to_string()];
    ConfigFile::from_probe(true, &names).save(&path).unwrap();

    // Second run: the file now short-circuits the live probe.
    let config = ConfigFile::load(&path).unwrap().expect("config written");
    let probe = HostProbe::resolve(Some(&config), None, None, || {
        panic!("live probe must not run")
    });
    assert!(probe.cuda_available);
    assert_eq!(probe.gpu_names, names);
    assert_eq!(classify(&probe.gpu_names), GpuVendor::Nvidia);
}

#[test]
fn test_env_overrides_win_over_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[system_info.CUDA_Info]
CUDA_Available = true

[[system_info.CUDA_Info.Devices]]
Index = 0
Name = "Tesla V100"
"#,
    );

    let config = ConfigFile::load(&path).unwrap().unwrap();
    let probe = HostProbe::resolve(
        Some(&config),
        Some("no"),
        Some("Radeon VII"),
        || panic!("live probe must not run"),
    );

    assert!(!probe.cuda_available);
    assert_eq!(classify(&probe.gpu_names), GpuVendor::Amd);

    let args = launcher::launch_args(classify(&probe.gpu_names), probe.cuda_available);
    assert!(!args.contains(&launcher::GPU_FLAG));
}
