//! Process execution helpers for the provisioning steps.
//!
//! Every external tool (apt, docker, nvidia-ctk, systemctl) is driven through
//! this module. Output is captured and re-emitted through `tracing` so the
//! whole run lands in both the console and the log file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Run a command to completion, failing if it exits non-zero.
///
/// stdout is logged at debug level, stderr at warn level. The error carries
/// the trailing stderr for diagnostics.
pub fn run(program: &str, args: &[&str]) -> Result<(), ExecError> {
    let command = render(program, args);
    debug!(%command, "exec");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ExecError::Spawn {
            command: command.clone(),
            source,
        })?;

    log_output(&command, &output);

    if output.status.success() {
        Ok(())
    } else {
        Err(ExecError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a command, returning its stdout on success.
pub fn capture(program: &str, args: &[&str]) -> Result<String, ExecError> {
    let command = render(program, args);
    debug!(%command, "exec (capture)");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ExecError::Spawn {
            command: command.clone(),
            source,
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(ExecError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a command and swallow any failure.
///
/// Used for the cleanup steps where "nothing to clean up" is the common case
/// (stopping or removing a container that does not exist).
pub fn run_best_effort(program: &str, args: &[&str]) {
    // The error already carries the rendered command line.
    if let Err(err) = run(program, args) {
        debug!(%err, "best-effort command failed (ignored)");
    }
}

/// Run a shell pipeline via `sh -c`.
///
/// Reserved for the key/repository registration steps that genuinely need
/// pipes and redirection; everything else goes through [`run`].
pub fn shell(script: &str) -> Result<(), ExecError> {
    let command = format!("sh -c '{script}'");
    debug!(%command, "exec (shell)");

    let output = Command::new("sh")
        .arg("-c")
        .arg(script)
        .output()
        .map_err(|source| ExecError::Spawn {
            command: command.clone(),
            source,
        })?;

    log_output(&command, &output);

    if output.status.success() {
        Ok(())
    } else {
        Err(ExecError::Failed {
            command,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Whether `name` resolves to an executable on the current `PATH`.
pub fn binary_on_path(name: &str) -> bool {
    match std::env::var_os("PATH") {
        Some(paths) => resolve_on_path(name, &paths).is_some(),
        None => false,
    }
}

/// Resolve `name` against a `PATH`-style value.
pub(crate) fn resolve_on_path(name: &str, paths: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn render(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

fn log_output(command: &str, output: &Output) {
    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        debug!(%command, "{line}");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        warn!(%command, "{line}");
    }
}
