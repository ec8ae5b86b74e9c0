//! Scoped license-file detachment.
//!
//! A test case can simulate an unauthorized run by moving the license file out of the way. The
//! file is moved back when the [`LicenseGuard`] drops, whether or not the test body succeeded.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{HarnessError, HarnessResult};

/// Suffix appended to a detached license file.
pub const DETACHED_SUFFIX: &str = ".detached";

/// Holds a license file renamed away; restores it on drop.
#[derive(Debug)]
pub struct LicenseGuard {
    original: PathBuf,
    detached: PathBuf,
}

impl LicenseGuard {
    pub fn detach(license: &Path) -> HarnessResult<Self> {
        if !license.is_file() {
            return Err(HarnessError::not_found("license file", license));
        }
        let detached = detached_path(license);
        tracing::info!("Detaching license {} -> {}", license.display(), detached.display());
        fs::rename(license, &detached)
            .map_err(|err| HarnessError::io(format!("detaching license {}", license.display()), err))?;
        Ok(Self {
            original: license.to_path_buf(),
            detached,
        })
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn detached(&self) -> &Path {
        &self.detached
    }
}

impl Drop for LicenseGuard {
    fn drop(&mut self) {
        tracing::info!("Restoring license {}", self.original.display());
        if let Err(err) = fs::rename(&self.detached, &self.original) {
            tracing::error!(
                "failed to restore license {} from {}: {err}",
                self.original.display(),
                self.detached.display()
            );
        }
    }
}

pub fn detached_path(license: &Path) -> PathBuf {
    let mut name: OsString = license.as_os_str().to_owned();
    name.push(DETACHED_SUFFIX);
    PathBuf::from(name)
}
