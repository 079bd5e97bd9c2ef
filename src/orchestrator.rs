use tracing::info;

use crate::bundle::{BUNDLES, BuildReport, BundleBuilder, BundleSpec, CertificateBundle};
use crate::config::Config;
use crate::engine::CryptoEngine;
use crate::error::Result;
use crate::export;

/// Result of provisioning one bundle.
#[derive(Debug, Clone)]
pub struct BundleReport {
    pub spec: BundleSpec,
    pub bundle: CertificateBundle,
    pub build: BuildReport,
}

/// Builds and exports every bundle of a run, one after the other.
pub struct Orchestrator<'a> {
    engine: &'a dyn CryptoEngine,
    config: &'a Config,
}

impl<'a> Orchestrator<'a> {
    pub fn new(engine: &'a dyn CryptoEngine, config: &'a Config) -> Self {
        Orchestrator { engine, config }
    }

    /// Validates the configuration, then builds and exports "apiserver" and
    /// "db" in that order. Stops at the first error.
    pub fn run(&self) -> Result<Vec<BundleReport>> {
        let service = self.config.validate()?;
        let builder = BundleBuilder::new(self.engine, self.config.settings);

        BUNDLES
            .iter()
            .map(|spec| {
                let bundle =
                    CertificateBundle::for_spec(&self.config.output, *spec, service.clone());
                info!(
                    "building {} bundle in {}",
                    spec.name,
                    bundle.directory().display()
                );
                let build = builder.build(&bundle)?;
                export::export(&bundle)?;
                info!(
                    "{} bundle ready: CA {}, CSR {}, leaf {}",
                    spec.name, build.ca, build.csr, build.leaf
                );
                Ok(BundleReport {
                    spec: *spec,
                    bundle,
                    build,
                })
            })
            .collect()
    }
}
