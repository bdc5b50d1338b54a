use crate::error::{CoreError, CoreResult};

/// Fails with [`CoreError::NotRoot`] unless the effective user is root.
///
/// Setting the hostname and rewriting `/etc` files both need it.
pub fn ensure_root() -> CoreResult<()> {
    if is_root() { Ok(()) } else { Err(CoreError::NotRoot) }
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
