//! Base64 companions of the distributable artifacts, for secret and
//! configuration systems that take text blobs.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::bundle::CertificateBundle;
use crate::error::{CertBundleError, Result};
use crate::fs_util::{self, PRIVATE_FILE_MODE, PUBLIC_FILE_MODE};

/// Pairs of (source artifact, export file, mode) for a bundle.
fn exports(bundle: &CertificateBundle) -> [(PathBuf, PathBuf, u32); 3] {
    [
        (bundle.leaf_key(), bundle.key_export(), PRIVATE_FILE_MODE),
        (bundle.ca_cert(), bundle.ca_cert_export(), PUBLIC_FILE_MODE),
        (bundle.leaf_cert(), bundle.leaf_cert_export(), PUBLIC_FILE_MODE),
    ]
}

/// Writes `key.txt`, `cacrt.txt` and `cert.txt` for a built bundle.
///
/// The encodings are recomputed on every call. A missing source means the
/// bundle is incomplete and is an error. An export that already holds the
/// fresh encoding is not rewritten, only given its mode again.
pub fn export(bundle: &CertificateBundle) -> Result<()> {
    for (source, target, mode) in exports(bundle) {
        let encoded = STANDARD.encode(fs_util::read(&source)?);
        if is_current(&target, &encoded)? {
            debug!("{} is up to date", target.display());
            fs_util::set_mode(&target, mode)?;
            continue;
        }
        fs_util::write_atomic(&target, encoded.as_bytes(), mode)?;
    }
    Ok(())
}

fn is_current(target: &Path, encoded: &str) -> Result<bool> {
    match std::fs::read(target) {
        Ok(existing) => Ok(existing == encoded.as_bytes()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CertBundleError::io(target, e)),
    }
}
