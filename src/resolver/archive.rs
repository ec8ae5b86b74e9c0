//! Package extraction for zip and tar archives.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::errors::{HarnessError, HarnessResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    Zip,
    Tar,
    /// Gzip-compressed tar (`.tar.gz`, `.tgz`, `.gz`).
    TarGz,
}

impl PackageFormat {
    /// Detect the format from the file name.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(PackageFormat::Zip)
        } else if name.ends_with(".tar") {
            Some(PackageFormat::Tar)
        } else if name.ends_with(".tgz") || name.ends_with(".gz") {
            Some(PackageFormat::TarGz)
        } else {
            None
        }
    }
}

/// Extract `package` into `extract_to`, creating the destination if needed.
#[tracing::instrument(skip_all, fields(package = %package.display()))]
pub fn extract_package(package: &Path, extract_to: &Path) -> HarnessResult<()> {
    tracing::info!("Extracting package {} to {}", package.display(), extract_to.display());

    let Some(format) = PackageFormat::detect(package) else {
        tracing::error!("Unsupported package format: {}", package.display());
        return Err(HarnessError::UnsupportedPackage(package.to_path_buf()));
    };

    fs::create_dir_all(extract_to)
        .map_err(|err| HarnessError::io(format!("creating {}", extract_to.display()), err))?;
    let file = File::open(package).map_err(|err| HarnessError::io(format!("opening {}", package.display()), err))?;
    let context = || format!("extracting {}", package.display());

    match format {
        PackageFormat::Zip => {
            let mut archive =
                zip::ZipArchive::new(file).map_err(|err| HarnessError::io(context(), io::Error::other(err)))?;
            archive
                .extract(extract_to)
                .map_err(|err| HarnessError::io(context(), io::Error::other(err)))
        }
        PackageFormat::Tar => tar::Archive::new(file)
            .unpack(extract_to)
            .map_err(|err| HarnessError::io(context(), err)),
        PackageFormat::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(extract_to)
            .map_err(|err| HarnessError::io(context(), err)),
    }
}
