//! Filesystem helpers shared by the engines, builder and exporter.
//!
//! Every artifact is written to a sibling `*.tmp` path first and renamed into
//! place once complete, so a guarded path either holds a whole file or
//! nothing at all.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CertBundleError, Result};

/// Mode for private keys and other secrets.
pub const PRIVATE_FILE_MODE: u32 = 0o600;
/// Mode for certificates, requests and serial files.
pub const PUBLIC_FILE_MODE: u32 = 0o644;
/// Mode for bundle directories.
pub const PRIVATE_DIR_MODE: u32 = 0o700;

/// Creates `dir` and any missing parents, owner-only on Unix.
///
/// An existing directory is left as it is.
pub fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(PRIVATE_DIR_MODE);
    }
    builder
        .create(dir)
        .map_err(|e| CertBundleError::io(dir, e))
}

/// The scratch path a file is written to before being committed.
pub fn staging_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        CertBundleError::InvalidInput(format!("{} has no file name", path.display()))
    })?;
    let mut staged = OsString::from(file_name);
    staged.push(".tmp");
    Ok(path.with_file_name(staged))
}

/// Moves a fully written staged file over its final path.
pub fn commit(staged: &Path, path: &Path) -> Result<()> {
    fs::rename(staged, path).map_err(|e| CertBundleError::io(path, e))?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Writes `contents` to `path` through a staged file with the given Unix mode.
pub fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let staged = staging_path(path)?;
    // a leftover from an interrupted run would keep its old mode
    match fs::remove_file(&staged) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            return Err(CertBundleError::io(&staged, e));
        }
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(&staged)
        .map_err(|e| CertBundleError::io(&staged, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| CertBundleError::io(&staged, e))?;
    drop(file);

    commit(&staged, path)
}

/// Sets the Unix mode of an existing file. A no-op elsewhere.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|e| CertBundleError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

pub fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| CertBundleError::io(path, e))
}

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| CertBundleError::io(path, e))
}
