//! Recording engine for unit tests: writes placeholder artifacts and logs
//! every invocation, optionally failing at a chosen step.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use super::{CaRequest, CryptoEngine, CsrRequest, SignRequest, Step};
use crate::error::{CertBundleError, Result};
use crate::fs_util::{self, PRIVATE_FILE_MODE, PUBLIC_FILE_MODE};

#[derive(Debug, Default)]
pub struct FakeEngine {
    calls: RefCell<Vec<(Step, PathBuf)>>,
    fail_at: Cell<Option<Step>>,
    counter: Cell<u32>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(&self, step: Option<Step>) {
        self.fail_at.set(step);
    }

    /// Steps invoked so far, with the directory each one wrote into.
    pub fn calls(&self) -> Vec<(Step, PathBuf)> {
        self.calls.borrow().clone()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.calls.borrow().iter().map(|(step, _)| *step).collect()
    }

    fn record(&self, step: Step, output: &Path) -> Result<u32> {
        let dir = output.parent().map(Path::to_path_buf).unwrap_or_default();
        self.calls.borrow_mut().push((step, dir));
        if self.fail_at.get() == Some(step) {
            return Err(CertBundleError::CertificateError(format!("injected failure at {step}")));
        }
        let n = self.counter.get() + 1;
        self.counter.set(n);
        Ok(n)
    }
}

fn require(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CertBundleError::InvalidInput(format!(
            "{} must exist first",
            path.display()
        )));
    }
    Ok(())
}

impl CryptoEngine for FakeEngine {
    fn self_signed_ca(&self, request: &CaRequest<'_>) -> Result<()> {
        let n = self.record(Step::CaIssuance, request.cert_out)?;
        fs_util::write_atomic(request.key_out, format!("ca-key-{n}").as_bytes(), PRIVATE_FILE_MODE)?;
        fs_util::write_atomic(
            request.cert_out,
            format!("ca-cert-{n} CN={}", request.subject.common_name).as_bytes(),
            PUBLIC_FILE_MODE,
        )
    }

    fn key_and_csr(&self, request: &CsrRequest<'_>) -> Result<()> {
        let n = self.record(Step::CsrIssuance, request.csr_out)?;
        fs_util::write_atomic(request.key_out, format!("leaf-key-{n}").as_bytes(), PRIVATE_FILE_MODE)?;
        fs_util::write_atomic(
            request.csr_out,
            format!("csr-{n} CN={}", request.subject.common_name).as_bytes(),
            PUBLIC_FILE_MODE,
        )
    }

    fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()> {
        let n = self.record(Step::LeafSigning, request.cert_out)?;
        require(request.csr)?;
        require(request.ca_cert)?;
        require(request.ca_key)?;
        fs_util::write_atomic(request.serial, b"01\n", PUBLIC_FILE_MODE)?;
        fs_util::write_atomic(request.cert_out, format!("leaf-cert-{n}").as_bytes(), PUBLIC_FILE_MODE)
    }
}
