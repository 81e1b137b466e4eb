use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Creates the directory (and any missing parents) if it does not exist.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Default config directory: `/etc/admingate` for root, otherwise
/// `~/.config/admingate`.
pub fn config_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/etc/admingate"));
    }
    Ok(home_dir()?.join(".config").join("admingate"))
}

/// Default data directory: `/var/lib/admingate` for root, otherwise
/// `~/.local/share/admingate`.
pub fn data_dir() -> Result<PathBuf> {
    if is_root() {
        return Ok(PathBuf::from("/var/lib/admingate"));
    }
    Ok(home_dir()?.join(".local").join("share").join("admingate"))
}

fn home_dir() -> Result<PathBuf> {
    match std::env::var_os("HOME").map(PathBuf::from) {
        Some(dir) => Ok(dir),
        None => bail!("could not determine home directory, please specify config path manually"),
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_exists() {
        let base = Path::new("_test_admingate_dirs");

        // Nested directories are created in one call
        let nested = base.join("a/b/c");
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        // Calling again on an existing directory is a no-op
        ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        fs::remove_dir_all(base).unwrap();
    }
}
