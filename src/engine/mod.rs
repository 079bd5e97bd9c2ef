//! The cryptography engine seam.
//!
//! The bundle builder only ever asks for three things: a self-signed CA, a
//! key with a CSR, and a CSR signed by that CA. Engines write PEM output to
//! the paths they are given and must leave each output path either absent or
//! complete.

pub mod native;
pub mod openssl;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::path::Path;

pub use native::NativeEngine;
pub use openssl::OpensslCli;

use crate::cert::params::DistinguishedName;
use crate::error::Result;

/// One of the three ordered steps of building a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CaIssuance,
    CsrIssuance,
    LeafSigning,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::CaIssuance => f.write_str("CA issuance"),
            Step::CsrIssuance => f.write_str("CSR issuance"),
            Step::LeafSigning => f.write_str("leaf signing"),
        }
    }
}

/// Generate a key and a self-signed CA certificate.
#[derive(Debug)]
pub struct CaRequest<'a> {
    pub key_bits: usize,
    pub days: u32,
    pub subject: &'a DistinguishedName,
    pub key_out: &'a Path,
    pub cert_out: &'a Path,
}

/// Generate a key and an unencrypted certificate signing request.
#[derive(Debug)]
pub struct CsrRequest<'a> {
    pub key_bits: usize,
    pub subject: &'a DistinguishedName,
    pub key_out: &'a Path,
    pub csr_out: &'a Path,
}

/// Sign a CSR with a CA, allocating the serial from `serial`.
#[derive(Debug)]
pub struct SignRequest<'a> {
    pub days: u32,
    pub csr: &'a Path,
    pub ca_cert: &'a Path,
    pub ca_key: &'a Path,
    pub serial: &'a Path,
    pub cert_out: &'a Path,
}

pub trait CryptoEngine {
    fn self_signed_ca(&self, request: &CaRequest<'_>) -> Result<()>;

    fn key_and_csr(&self, request: &CsrRequest<'_>) -> Result<()>;

    fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()>;
}
