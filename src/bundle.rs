//! Bundle layout and the three-step builder.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cert::params::DistinguishedName;
use crate::config::{CertificateSettings, ServiceIdentity};
use crate::engine::{CaRequest, CryptoEngine, CsrRequest, SignRequest, Step};
use crate::error::Result;
use crate::fs_util;
use crate::guard::{self, Outcome};

pub const CA_KEY_FILE: &str = "cacrt.key";
pub const CA_CERT_FILE: &str = "cacrt.crt";
pub const CA_SERIAL_FILE: &str = "cacrt.srl";
pub const LEAF_KEY_FILE: &str = "cert.key";
pub const LEAF_CSR_FILE: &str = "cert.csr";
pub const LEAF_CERT_FILE: &str = "cert.crt";
pub const KEY_EXPORT_FILE: &str = "key.txt";
pub const CA_CERT_EXPORT_FILE: &str = "cacrt.txt";
pub const LEAF_CERT_EXPORT_FILE: &str = "cert.txt";

/// One of the bundles every run provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleSpec {
    pub name: &'static str,
    pub subdirectory: &'static str,
}

pub const APISERVER: BundleSpec = BundleSpec {
    name: "apiserver",
    subdirectory: "apiserver",
};

pub const DB: BundleSpec = BundleSpec {
    name: "db",
    subdirectory: "db",
};

/// The bundles in the order they are generated.
pub const BUNDLES: [BundleSpec; 2] = [APISERVER, DB];

/// A named set of artifacts in one directory.
#[derive(Debug, Clone)]
pub struct CertificateBundle {
    directory: PathBuf,
    service: ServiceIdentity,
}

impl CertificateBundle {
    pub fn new(directory: impl Into<PathBuf>, service: ServiceIdentity) -> Self {
        CertificateBundle {
            directory: directory.into(),
            service,
        }
    }

    /// The bundle for `spec` under the output root.
    pub fn for_spec(output: &Path, spec: BundleSpec, service: ServiceIdentity) -> Self {
        Self::new(output.join(spec.subdirectory), service)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn service_name(&self) -> &str {
        self.service.name()
    }

    pub fn namespace(&self) -> &str {
        self.service.namespace()
    }

    pub fn ca_key(&self) -> PathBuf {
        self.directory.join(CA_KEY_FILE)
    }

    pub fn ca_cert(&self) -> PathBuf {
        self.directory.join(CA_CERT_FILE)
    }

    pub fn ca_serial(&self) -> PathBuf {
        self.directory.join(CA_SERIAL_FILE)
    }

    pub fn leaf_key(&self) -> PathBuf {
        self.directory.join(LEAF_KEY_FILE)
    }

    pub fn leaf_csr(&self) -> PathBuf {
        self.directory.join(LEAF_CSR_FILE)
    }

    pub fn leaf_cert(&self) -> PathBuf {
        self.directory.join(LEAF_CERT_FILE)
    }

    pub fn key_export(&self) -> PathBuf {
        self.directory.join(KEY_EXPORT_FILE)
    }

    pub fn ca_cert_export(&self) -> PathBuf {
        self.directory.join(CA_CERT_EXPORT_FILE)
    }

    pub fn leaf_cert_export(&self) -> PathBuf {
        self.directory.join(LEAF_CERT_EXPORT_FILE)
    }

    pub fn ca_subject(&self) -> DistinguishedName {
        DistinguishedName::service(self.service.ca_common_name())
    }

    pub fn leaf_subject(&self) -> DistinguishedName {
        DistinguishedName::service(self.service.service_dns_name())
    }
}

/// What the builder did for each step of one bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub ca: Outcome,
    pub csr: Outcome,
    pub leaf: Outcome,
}

impl BuildReport {
    /// Number of engine invocations the build made.
    pub fn invocations(&self) -> usize {
        [self.ca, self.csr, self.leaf]
            .iter()
            .filter(|outcome| **outcome == Outcome::Generated)
            .count()
    }

    pub fn is_noop(&self) -> bool {
        self.invocations() == 0
    }
}

/// Produces the raw artifacts of a bundle: CA, then CSR, then signed leaf.
///
/// Each step runs only if its output is missing, so an interrupted or failed
/// build resumes where it stopped when run again. Nothing is rolled back.
pub struct BundleBuilder<'a> {
    engine: &'a dyn CryptoEngine,
    settings: CertificateSettings,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(engine: &'a dyn CryptoEngine, settings: CertificateSettings) -> Self {
        BundleBuilder { engine, settings }
    }

    pub fn build(&self, bundle: &CertificateBundle) -> Result<BuildReport> {
        fs_util::create_private_dir(bundle.directory())?;

        let ca_cert = bundle.ca_cert();
        let ca = guard::ensure(&ca_cert, || {
            self.engine
                .self_signed_ca(&CaRequest {
                    key_bits: self.settings.key_bits,
                    days: self.settings.validity_days,
                    subject: &bundle.ca_subject(),
                    key_out: &bundle.ca_key(),
                    cert_out: &ca_cert,
                })
                .map_err(|e| e.during(Step::CaIssuance))
        })?;
        log_skip(ca, "Skipping generate CA cert.", &ca_cert);

        let csr_path = bundle.leaf_csr();
        let csr = guard::ensure(&csr_path, || {
            self.engine
                .key_and_csr(&CsrRequest {
                    key_bits: self.settings.key_bits,
                    subject: &bundle.leaf_subject(),
                    key_out: &bundle.leaf_key(),
                    csr_out: &csr_path,
                })
                .map_err(|e| e.during(Step::CsrIssuance))
        })?;
        log_skip(csr, "Skipping generate csr.", &csr_path);

        let leaf_cert = bundle.leaf_cert();
        let leaf = guard::ensure(&leaf_cert, || {
            self.engine
                .sign_csr(&SignRequest {
                    days: self.settings.validity_days,
                    csr: &csr_path,
                    ca_cert: &ca_cert,
                    ca_key: &bundle.ca_key(),
                    serial: &bundle.ca_serial(),
                    cert_out: &leaf_cert,
                })
                .map_err(|e| e.during(Step::LeafSigning))
        })?;
        log_skip(leaf, "Skipping signing crt.", &leaf_cert);

        Ok(BuildReport { ca, csr, leaf })
    }
}

fn log_skip(outcome: Outcome, message: &str, path: &Path) {
    if outcome == Outcome::Skipped {
        info!("{message} File already exists: {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::engine::fake::FakeEngine;
    use crate::error::CertBundleError;

    fn bundle(dir: &Path) -> CertificateBundle {
        CertificateBundle::new(
            dir.join("apiserver"),
            ServiceIdentity::new("svc1", "ns1").unwrap(),
        )
    }

    fn snapshot(bundle: &CertificateBundle) -> Vec<Vec<u8>> {
        [
            bundle.ca_key(),
            bundle.ca_cert(),
            bundle.leaf_key(),
            bundle.leaf_csr(),
            bundle.leaf_cert(),
        ]
        .iter()
        .map(|path| fs::read(path).unwrap())
        .collect()
    }

    #[test]
    fn test_first_build_runs_steps_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        let engine = FakeEngine::new();

        let report = BundleBuilder::new(&engine, CertificateSettings::default())
            .build(&bundle)
            .unwrap();

        assert_eq!(report.invocations(), 3);
        assert_eq!(
            engine.steps(),
            vec![Step::CaIssuance, Step::CsrIssuance, Step::LeafSigning]
        );
        assert!(bundle.leaf_cert().exists());
        assert!(bundle.ca_serial().exists());
    }

    #[test]
    fn test_second_build_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        let engine = FakeEngine::new();
        let builder = BundleBuilder::new(&engine, CertificateSettings::default());

        builder.build(&bundle).unwrap();
        let before = snapshot(&bundle);

        let report = builder.build(&bundle).unwrap();
        assert!(report.is_noop());
        assert_eq!(engine.steps().len(), 3);
        assert_eq!(snapshot(&bundle), before);
    }

    #[test]
    fn test_subjects_follow_service_identity() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        let engine = FakeEngine::new();
        BundleBuilder::new(&engine, CertificateSettings::default())
            .build(&bundle)
            .unwrap();

        let ca = fs::read_to_string(bundle.ca_cert()).unwrap();
        let csr = fs::read_to_string(bundle.leaf_csr()).unwrap();
        assert!(ca.ends_with("CN=svc1-certificate-authority"));
        assert!(csr.ends_with("CN=svc1.ns1.svc"));
    }

    #[test]
    fn test_missing_leaf_is_signed_without_reissuing_ca_or_csr() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        let engine = FakeEngine::new();
        let builder = BundleBuilder::new(&engine, CertificateSettings::default());
        builder.build(&bundle).unwrap();

        fs::remove_file(bundle.leaf_cert()).unwrap();
        let report = builder.build(&bundle).unwrap();

        assert_eq!(report.ca, Outcome::Skipped);
        assert_eq!(report.csr, Outcome::Skipped);
        assert_eq!(report.leaf, Outcome::Generated);
        assert_eq!(engine.steps().last(), Some(&Step::LeafSigning));
    }

    #[test]
    fn test_failure_aborts_and_rerun_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        let engine = FakeEngine::new();
        let builder = BundleBuilder::new(&engine, CertificateSettings::default());

        engine.fail_at(Some(Step::CsrIssuance));
        let err = builder.build(&bundle).unwrap_err();
        assert!(matches!(
            err,
            CertBundleError::Step {
                step: Step::CsrIssuance,
                ..
            }
        ));
        assert!(bundle.ca_cert().exists());
        assert!(!bundle.leaf_csr().exists());
        assert!(!bundle.leaf_cert().exists());

        engine.fail_at(None);
        let report = builder.build(&bundle).unwrap();
        assert_eq!(report.ca, Outcome::Skipped);
        assert_eq!(report.csr, Outcome::Generated);
        assert_eq!(report.leaf, Outcome::Generated);
    }

    #[test]
    fn test_staged_leftover_is_not_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle(dir.path());
        fs::create_dir_all(bundle.directory()).unwrap();
        fs::write(fs_util::staging_path(&bundle.ca_cert()).unwrap(), b"").unwrap();

        let engine = FakeEngine::new();
        let report = BundleBuilder::new(&engine, CertificateSettings::default())
            .build(&bundle)
            .unwrap();
        assert_eq!(report.ca, Outcome::Generated);
    }

    #[test]
    fn test_bundle_layout() {
        let bundle = CertificateBundle::for_spec(
            Path::new("config"),
            DB,
            ServiceIdentity::new("svc1", "ns1").unwrap(),
        );
        assert_eq!(bundle.directory(), Path::new("config/db"));
        assert_eq!(bundle.ca_cert(), Path::new("config/db/cacrt.crt"));
        assert_eq!(bundle.leaf_cert_export(), Path::new("config/db/cert.txt"));
        assert_eq!(bundle.service_name(), "svc1");
        assert_eq!(bundle.namespace(), "ns1");
    }
}
