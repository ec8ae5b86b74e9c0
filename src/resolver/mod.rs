//! Executable resolution
//!
//! The executable under test is either already present somewhere under the search root or ships
//! in a zip/tar package next to it. [`get_executable`] looks for the file first and falls back to
//! extracting the first matching package exactly once.

pub mod archive;

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub use archive::{PackageFormat, extract_package};

use crate::errors::{HarnessError, HarnessResult};
use crate::fs_utils::make_executable;

/// Breadth-first search for a file named `executable_name` under `main_folder`.
///
/// Shallower matches win; entries within one directory are visited in name order.
pub fn find_executable(main_folder: &Path, executable_name: &str) -> HarnessResult<PathBuf> {
    tracing::info!("Searching for executable {executable_name} in {}", main_folder.display());

    let found = walk_files(main_folder)?
        .into_iter()
        .find(|path| path.file_name().is_some_and(|name| name == executable_name));

    match found {
        Some(path) => {
            tracing::info!("Found executable: {}", path.display());
            Ok(path)
        }
        None => {
            tracing::error!("Executable {executable_name} not found in {}", main_folder.display());
            Err(HarnessError::not_found("executable", main_folder.join(executable_name)))
        }
    }
}

/// Packages under `main_folder` that may contain `executable_name`.
///
/// A candidate's file name starts with the executable's stem (the text before its first `.`)
/// and has a supported archive extension. Candidates inside a `zip` directory sort first.
pub fn find_packages(main_folder: &Path, executable_name: &str) -> HarnessResult<Vec<PathBuf>> {
    let stem = executable_name.split('.').next().unwrap_or(executable_name);

    let mut packages: Vec<PathBuf> = walk_files(main_folder)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(stem))
                && PackageFormat::detect(path).is_some()
        })
        .collect();

    packages.sort_by_key(|path| (!in_zip_dir(path), path.clone()));
    Ok(packages)
}

fn in_zip_dir(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == "zip")
}

/// Return the executable, extracting it from a package into `extract_to` if it is not present.
#[tracing::instrument(skip_all, fields(executable = executable_name))]
pub fn get_executable(main_folder: &Path, extract_to: &Path, executable_name: &str) -> HarnessResult<PathBuf> {
    tracing::info!("Retrieving executable: {executable_name}");

    match find_executable(main_folder, executable_name) {
        Ok(path) => return Ok(path),
        Err(HarnessError::NotFound { .. }) => {}
        Err(err) => return Err(err),
    }

    let packages = find_packages(main_folder, executable_name)?;
    let Some(package) = packages.first() else {
        tracing::error!("No executable or package found.");
        return Err(HarnessError::not_found(
            "executable or package",
            main_folder.join(executable_name),
        ));
    };

    tracing::info!("Extracting from package: {}", package.display());
    extract_package(package, extract_to)?;

    let executable = find_executable(extract_to, executable_name)?;
    make_executable(&executable)?;
    Ok(executable)
}

/// All regular files under `root`, breadth-first, sorted per directory. Symlinked directories are
/// not followed.
fn walk_files(root: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = pending.pop_front() {
        let entries =
            fs::read_dir(&dir).map_err(|err| HarnessError::io(format!("listing {}", dir.display()), err))?;
        let mut entries: Vec<_> = entries.flatten().collect();
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            match entry.file_type() {
                Ok(kind) if kind.is_dir() => pending.push_back(path),
                Ok(_) if path.is_file() => files.push(path),
                _ => {}
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_find_executable() {
        let tmp = tempfile::tempdir().unwrap();
        let main = tmp.path().join("main");
        fs::create_dir_all(main.join("bin")).unwrap();
        let executable = main.join("bin/test_executable");
        fs::write(&executable, "").unwrap();

        assert_eq!(find_executable(&main, "test_executable").unwrap(), executable);
    }

    #[test]
    fn test_find_executable_prefers_shallow() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/deep")).unwrap();
        fs::write(tmp.path().join("a/deep/tool"), "").unwrap();
        fs::write(tmp.path().join("tool"), "").unwrap();

        assert_eq!(find_executable(tmp.path(), "tool").unwrap(), tmp.path().join("tool"));
    }

    #[test]
    fn test_find_executable_ignores_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("tool")).unwrap();
        let err = find_executable(tmp.path(), "tool").unwrap_err();
        assert!(matches!(err, HarnessError::NotFound { .. }));
    }

    #[test]
    fn test_find_packages_orders_zip_dir_first() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("zip")).unwrap();
        fs::write(tmp.path().join("convert-1.0.tar"), "").unwrap();
        fs::write(tmp.path().join("zip/convert-1.0.zip"), "").unwrap();
        fs::write(tmp.path().join("other.zip"), "").unwrap();
        fs::write(tmp.path().join("convert.txt"), "").unwrap();

        let packages = find_packages(tmp.path(), "convert.exe").unwrap();
        assert_eq!(
            packages,
            vec![tmp.path().join("zip/convert-1.0.zip"), tmp.path().join("convert-1.0.tar")]
        );
    }

    #[test]
    fn test_get_executable_present() {
        let tmp = tempfile::tempdir().unwrap();
        let main = tmp.path().join("main");
        let extract = tmp.path().join("extracted");
        fs::create_dir_all(&main).unwrap();
        fs::create_dir_all(&extract).unwrap();
        fs::write(main.join("test_executable"), "").unwrap();

        let found = get_executable(&main, &extract, "test_executable").unwrap();
        assert_eq!(found, main.join("test_executable"));
    }

    #[test]
    fn test_get_executable_missing_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let err = get_executable(tmp.path(), tmp.path(), "tool").unwrap_err();
        assert!(matches!(err, HarnessError::NotFound { what: "executable or package", .. }));
    }
}
