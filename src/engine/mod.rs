//! Container engine and GPU toolkit installation.
//!
//! - [`installer`]: idempotent Docker install with the relogin handshake
//! - [`toolkit`]: NVIDIA Container Toolkit install and engine reconfiguration

pub mod installer;
pub mod toolkit;
