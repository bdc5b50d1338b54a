//! Applying the computed hostname to the running system.
//!
//! - the kernel hostname is set with `sethostname(2)` (Linux only);
//! - `/etc/hostname` can be rewritten so the name survives a reboot;
//! - `/etc/hosts` can map `127.0.0.1` to the name, for tools resolving their own hostname.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Kernel limit on hostname length (`HOST_NAME_MAX`).
const HOST_NAME_MAX: usize = 64;

/// Comment marking the `/etc/hosts` line owned by this tool.
const HOSTS_MARKER: &str = "# managed by ahs";

/// Destination of the computed hostname on the local system.
pub trait HostnameSink: Send + Sync {
    fn set_hostname(&self, hostname: &str) -> CoreResult<()>;

    fn persist_hostname_file(&self, hostname: &str) -> CoreResult<()>;

    fn persist_hosts_entry(&self, hostname: &str) -> CoreResult<()>;
}

/// The machine this process runs on.
#[derive(Debug, Clone)]
pub struct LocalHost {
    hostname_path: PathBuf,
    hosts_path: PathBuf,
}

impl Default for LocalHost {
    fn default() -> Self {
        Self {
            hostname_path: PathBuf::from("/etc/hostname"),
            hosts_path: PathBuf::from("/etc/hosts"),
        }
    }
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the files touched by the persist operations.
    pub fn with_paths(hostname_path: impl Into<PathBuf>, hosts_path: impl Into<PathBuf>) -> Self {
        Self {
            hostname_path: hostname_path.into(),
            hosts_path: hosts_path.into(),
        }
    }
}

impl HostnameSink for LocalHost {
    fn set_hostname(&self, hostname: &str) -> CoreResult<()> {
        validate_hostname(hostname)?;
        sys::sethostname(hostname)?;
        debug!(hostname, "kernel hostname updated");
        Ok(())
    }

    fn persist_hostname_file(&self, hostname: &str) -> CoreResult<()> {
        validate_hostname(hostname)?;
        fs::write(&self.hostname_path, format!("{hostname}\n"))?;
        debug!(path = %self.hostname_path.display(), "hostname file updated");
        Ok(())
    }

    fn persist_hosts_entry(&self, hostname: &str) -> CoreResult<()> {
        validate_hostname(hostname)?;
        let current = read_or_empty(&self.hosts_path)?;
        fs::write(&self.hosts_path, rewrite_hosts(&current, hostname))?;
        debug!(path = %self.hosts_path.display(), "hosts file updated");
        Ok(())
    }
}

/// Fails with [`CoreError::InvalidHostname`] unless `hostname` can be set as the kernel hostname.
pub fn validate_hostname(hostname: &str) -> CoreResult<()> {
    let valid = !hostname.is_empty()
        && hostname.len() <= HOST_NAME_MAX
        && !hostname.starts_with('-')
        && hostname
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidHostname(hostname.to_string()))
    }
}

fn read_or_empty(path: &Path) -> io::Result<String> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// Drops any line previously written by this tool and appends the new mapping.
fn rewrite_hosts(current: &str, hostname: &str) -> String {
    let mut out: String = current
        .lines()
        .filter(|line| !line.trim_end().ends_with(HOSTS_MARKER))
        .flat_map(|line| [line, "\n"])
        .collect();
    out.push_str(&format!("127.0.0.1\t{hostname}\t{HOSTS_MARKER}\n"));
    out
}

#[cfg(target_os = "linux")]
mod sys {
    use std::io;

    pub fn sethostname(hostname: &str) -> io::Result<()> {
        let rc = unsafe {
            libc::sethostname(hostname.as_ptr().cast::<libc::c_char>(), hostname.len())
        };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use std::io;

    pub fn sethostname(_hostname: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("setting the hostname is not supported on {}", std::env::consts::OS),
        ))
    }
}
