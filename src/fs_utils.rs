//! Filesystem helpers shared by the resolver and the driver.

use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};

/// Create `directory` (and parents). On unix the directory is made `rwxr-xr-x`.
pub fn ensure_directory_exists(directory: &Path) -> HarnessResult<()> {
    tracing::info!("Ensuring directory exists: {}", directory.display());
    fs::create_dir_all(directory)
        .map_err(|err| HarnessError::io(format!("creating directory {}", directory.display()), err))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(directory, fs::Permissions::from_mode(0o755))
            .map_err(|err| HarnessError::io(format!("setting permissions on {}", directory.display()), err))?;
    }

    Ok(())
}

pub fn check_file_exists(path: &Path) -> HarnessResult<()> {
    tracing::debug!("Checking if file exists: {}", path.display());
    if path.exists() {
        Ok(())
    } else {
        tracing::error!("File not found: {}", path.display());
        Err(HarnessError::not_found("file", path))
    }
}

/// Remove generated outputs when `enabled`. Directories are removed recursively; paths that no
/// longer exist are skipped.
pub fn delete_generated_outputs(enabled: bool, paths: &[PathBuf]) -> HarnessResult<()> {
    if !enabled {
        return Ok(());
    }
    tracing::info!("Deleting generated outputs: {paths:?}");
    for path in paths {
        let removed = if path.is_dir() {
            fs::remove_dir_all(path)
        } else if path.exists() {
            fs::remove_file(path)
        } else {
            continue;
        };
        removed.map_err(|err| HarnessError::io(format!("removing {}", path.display()), err))?;
    }
    Ok(())
}

/// Give `path` execute permission for everyone who can read it.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> HarnessResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata =
        fs::metadata(path).map_err(|err| HarnessError::io(format!("reading metadata of {}", path.display()), err))?;
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    let wanted = mode | ((mode & 0o444) >> 2);
    if wanted != mode {
        permissions.set_mode(wanted);
        fs::set_permissions(path, permissions)
            .map_err(|err| HarnessError::io(format!("marking {} executable", path.display()), err))?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> HarnessResult<()> {
    Ok(())
}
