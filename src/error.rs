//! The crate-wide error type.
//!
//! Engine failures are wrapped in [`CertBundleError::Step`] so the message
//! names the bundle step that failed.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::engine::Step;

/// Represents errors that can occur while provisioning a certificate bundle.
///
/// Configuration, filesystem and engine failures are all fatal: callers are
/// expected to report the error and stop, then rely on re-running to resume.
#[derive(Debug, Error)]
pub enum CertBundleError {
    /// Missing or invalid operator input.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cryptography engine operation failed.
    #[error("{step} failed")]
    Step {
        step: Step,
        #[source]
        source: Box<CertBundleError>,
    },

    /// An external command exited unsuccessfully.
    #[error("command `{command}` failed: {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// An external command did not finish in time and was killed.
    #[error("command `{command}` timed out after {}s", timeout.as_secs())]
    CommandTimedOut { command: String, timeout: Duration },

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error related to certificate operations.
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error from RSA PKCS1 operations.
    #[error("RSA PKCS1 error: {0}")]
    RsaPkcs1Error(String),
}

pub type Result<T> = std::result::Result<T, CertBundleError>;

impl CertBundleError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CertBundleError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attributes this error to a bundle step.
    pub fn during(self, step: Step) -> Self {
        CertBundleError::Step {
            step,
            source: Box::new(self),
        }
    }
}

impl From<der::Error> for CertBundleError {
    /// Converts a `der::Error` into a `CertBundleError`.
    fn from(err: der::Error) -> Self {
        CertBundleError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertBundleError {
    fn from(err: rsa::Error) -> Self {
        CertBundleError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertBundleError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertBundleError::RsaPkcs1Error(err.to_string())
    }
}

impl From<pkcs8::Error> for CertBundleError {
    fn from(err: pkcs8::Error) -> Self {
        CertBundleError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertBundleError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertBundleError::EncodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertBundleError {
    fn from(err: pem::PemError) -> Self {
        CertBundleError::DecodingError(err.to_string())
    }
}

impl From<rsa::signature::Error> for CertBundleError {
    fn from(err: rsa::signature::Error) -> Self {
        CertBundleError::CertificateError(format!("signature verification failed: {err}"))
    }
}
