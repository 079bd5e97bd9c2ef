//! Presence-keyed idempotency: an artifact that already exists is never regenerated.

use std::fmt;
use std::path::Path;

use crate::error::{CertBundleError, Result};

/// What [`ensure`] did for one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Generated,
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Generated => f.write_str("generated"),
            Outcome::Skipped => f.write_str("skipped"),
        }
    }
}

/// Runs `generate` only if `path` does not exist yet.
///
/// Presence is all that is checked; a file's content is never inspected.
/// There is no locking, so two processes racing on one directory may both
/// generate.
pub fn ensure<F>(path: &Path, generate: F) -> Result<Outcome>
where
    F: FnOnce() -> Result<()>,
{
    let exists = path
        .try_exists()
        .map_err(|e| CertBundleError::io(path, e))?;
    if exists {
        return Ok(Outcome::Skipped);
    }
    generate()?;
    Ok(Outcome::Generated)
}
