//! # certbundle - TLS bootstrap bundles for a service
//!
//! certbundle provisions the local TLS material a service needs before it
//! starts: for each of its two components, "apiserver" and "db", a
//! self-signed certificate authority, a certificate signing request for the
//! in-cluster DNS name `<name>.<namespace>.svc`, the leaf certificate signed
//! by that CA, and base64 copies of the distributable files.
//!
//! Generation is idempotent and keyed on the filesystem: every artifact that
//! already exists is left alone, so running the tool again after a failure
//! resumes at the first missing file and running it on a complete bundle
//! changes nothing.
//!
//! ## Output layout
//!
//! Under `<output>/<apiserver|db>/` (directories are owner-only):
//!
//! | File        | Contents                                   |
//! |-------------|--------------------------------------------|
//! | `cacrt.key` | CA private key (PKCS#8 PEM)                |
//! | `cacrt.crt` | CA certificate                             |
//! | `cacrt.srl` | CA serial counter                          |
//! | `cert.key`  | leaf private key                           |
//! | `cert.csr`  | leaf certificate signing request           |
//! | `cert.crt`  | leaf certificate signed by the CA          |
//! | `key.txt`   | base64 of `cert.key`                       |
//! | `cacrt.txt` | base64 of `cacrt.crt`                      |
//! | `cert.txt`  | base64 of `cert.crt`                       |
//!
//! ## Cryptography engines
//!
//! All key and certificate work goes through the [`engine::CryptoEngine`]
//! trait. [`engine::NativeEngine`] does it in-process with the RustCrypto
//! crates; [`engine::OpensslCli`] runs the `openssl` command line tool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certbundle::{config::Config, engine::NativeEngine, orchestrator::Orchestrator};
//!
//! # fn main() -> Result<(), certbundle::error::CertBundleError> {
//! let config = Config::builder()
//!     .name("svc1".to_string())
//!     .namespace("ns1".to_string())
//!     .build();
//!
//! let engine = NativeEngine::new();
//! for report in Orchestrator::new(&engine, &config).run()? {
//!     println!("{}: {} engine invocations", report.spec.name, report.build.invocations());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing certificates directly
//!
//! ```rust,no_run
//! use certbundle::{
//!     cert::{Certificate, CertificateWithPrivateKey, params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     csr::CertificateSigningRequest,
//!     issuer::Issuer,
//!     key::KeyPair,
//!     serial,
//! };
//!
//! # fn main() -> Result<(), certbundle::error::CertBundleError> {
//! let ca_key = KeyPair::generate_rsa(2048)?;
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::service("svc1-certificate-authority"))
//!     .subject_public_key(ca_key.public_key())
//!     .is_ca(true)
//!     .build();
//! let ca_cert = Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(365)?, &serial::random_serial())?;
//! let ca = CertificateWithPrivateKey::new(ca_cert, ca_key)?;
//!
//! let leaf_key = KeyPair::generate_rsa(2048)?;
//! let csr = CertificateSigningRequest::new(&DistinguishedName::service("svc1.ns1.svc"), &leaf_key)?;
//! csr.verify()?;
//! let leaf = ca.issue(&csr.to_cert_info()?, Validity::for_days(365)?, &serial::random_serial())?;
//! println!("{}", leaf.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`orchestrator`]: runs both bundles
//! - [`bundle`]: bundle layout and the CA → CSR → leaf builder
//! - [`guard`]: presence-keyed idempotency
//! - [`export`]: base64 exports
//! - [`engine`]: the cryptography engine trait and its implementations
//! - [`config`]: run configuration and the validated service identity
//! - [`key`], [`cert`], [`csr`], [`issuer`], [`tbs_certificate`]: X.509 building blocks
//! - [`error`]: error types

pub mod bundle;
pub mod cert;
pub mod config;
pub mod csr;
pub mod engine;
pub mod error;
pub mod export;
pub mod fs_util;
pub mod guard;
pub mod issuer;
pub mod key;
pub mod orchestrator;
pub mod pem_utils;
pub mod serial;
pub mod tbs_certificate;
