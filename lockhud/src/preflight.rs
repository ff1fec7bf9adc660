//! Pre-flight checks for lockhud
//!
//! Validates that the target process exists and the sampler can be found
//! before the first sampling cycle, so the common setup mistakes fail fast
//! with an actionable message.

#![allow(unsafe_code)] // kill(pid, 0) and geteuid() require unsafe

use anyhow::Result;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

use crate::domain::{MonitorError, Pid, SamplerError};

/// Run all pre-flight checks before sampling starts
///
/// # Errors
/// Missing target process or sampler program.
pub fn run_preflight_checks(pid: Pid, sampler: &str, quiet: bool) -> Result<()> {
    check_process_exists(pid)?;
    let path = find_sampler(sampler)?;
    log::debug!("Using sampler at {}", path.display());
    check_privileges(quiet);
    Ok(())
}

/// Check if the target process exists.
///
/// Signal 0 performs the permission and existence checks without delivering
/// anything. `EPERM` means the process exists but belongs to another user,
/// which is fine at this point.
///
/// # Errors
/// [`MonitorError::ProcessNotFound`] if no such process exists.
pub fn check_process_exists(pid: Pid) -> Result<(), MonitorError> {
    if pid.0 <= 0 {
        return Err(MonitorError::ProcessNotFound(pid));
    }

    if unsafe { libc::kill(pid.0, 0) } == 0 {
        return Ok(());
    }

    match io::Error::last_os_error().raw_os_error() {
        Some(libc::EPERM) => Ok(()),
        _ => Err(MonitorError::ProcessNotFound(pid)),
    }
}

/// Resolve the sampler program the same way the OS would when spawning it.
///
/// # Errors
/// [`SamplerError::ToolNotFound`] if the program is not a file and not on `PATH`.
pub fn find_sampler(program: &str) -> Result<PathBuf, SamplerError> {
    let not_found = || SamplerError::ToolNotFound { program: program.to_string() };

    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return if direct.is_file() { Ok(direct.to_path_buf()) } else { Err(not_found()) };
    }

    let search_path = env::var_os("PATH").ok_or_else(not_found)?;
    env::split_paths(&search_path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
        .ok_or_else(not_found)
}

/// Warn when not running as root; most samplers need ptrace access
fn check_privileges(quiet: bool) {
    if quiet || unsafe { libc::geteuid() } == 0 {
        return;
    }
    eprintln!("warning: not running as root, the sampler may need sudo or CAP_SYS_PTRACE");
}
