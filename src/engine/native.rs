use tracing::info;

use super::{CaRequest, CryptoEngine, CsrRequest, SignRequest};
use crate::cert::extensions::{ExtendedKeyUsageOption, SubjectAltName};
use crate::cert::params::{CertificationRequestInfo, ExtensionParam, Validity};
use crate::cert::{Certificate, CertificateWithPrivateKey};
use crate::csr::CertificateSigningRequest;
use crate::error::Result;
use crate::fs_util::{self, PRIVATE_FILE_MODE, PUBLIC_FILE_MODE};
use crate::issuer::Issuer;
use crate::key::KeyPair;
use crate::serial;

/// In-process engine built on the RustCrypto crates.
///
/// Keys are written as unencrypted PKCS#8, certificates and requests as PEM,
/// all signatures are sha256WithRSAEncryption. Within a step the key is
/// committed before the certificate or request that the builder keys on.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        NativeEngine
    }
}

impl CryptoEngine for NativeEngine {
    fn self_signed_ca(&self, request: &CaRequest<'_>) -> Result<()> {
        info!(
            "native: rsa:{} self-signed CA subject={} days={} keyout={} out={}",
            request.key_bits,
            request.subject.to_openssl_subject(),
            request.days,
            request.key_out.display(),
            request.cert_out.display()
        );

        let key = KeyPair::generate_rsa(request.key_bits)?;
        let cert_info = CertificationRequestInfo::builder()
            .subject(request.subject.clone())
            .subject_public_key(key.public_key())
            .is_ca(true)
            .build();
        let cert = Certificate::new_self_signed(
            &cert_info,
            &key,
            Validity::for_days(request.days)?,
            &serial::random_serial(),
        )?;

        fs_util::write_atomic(
            request.key_out,
            key.to_pkcs8_pem()?.as_bytes(),
            PRIVATE_FILE_MODE,
        )?;
        fs_util::write_atomic(request.cert_out, cert.to_pem()?.as_bytes(), PUBLIC_FILE_MODE)
    }

    fn key_and_csr(&self, request: &CsrRequest<'_>) -> Result<()> {
        info!(
            "native: rsa:{} CSR subject={} keyout={} out={}",
            request.key_bits,
            request.subject.to_openssl_subject(),
            request.key_out.display(),
            request.csr_out.display()
        );

        let key = KeyPair::generate_rsa(request.key_bits)?;
        let csr = CertificateSigningRequest::new(request.subject, &key)?;

        fs_util::write_atomic(
            request.key_out,
            key.to_pkcs8_pem()?.as_bytes(),
            PRIVATE_FILE_MODE,
        )?;
        fs_util::write_atomic(request.csr_out, csr.to_pem()?.as_bytes(), PUBLIC_FILE_MODE)
    }

    fn sign_csr(&self, request: &SignRequest<'_>) -> Result<()> {
        info!(
            "native: sign in={} CA={} CAkey={} days={} serial={} out={}",
            request.csr.display(),
            request.ca_cert.display(),
            request.ca_key.display(),
            request.days,
            request.serial.display(),
            request.cert_out.display()
        );

        let csr = CertificateSigningRequest::from_pem(&fs_util::read_to_string(request.csr)?)?;
        csr.verify()?;

        let ca = CertificateWithPrivateKey::new(
            Certificate::from_pem(&fs_util::read_to_string(request.ca_cert)?)?,
            KeyPair::from_pem(&fs_util::read_to_string(request.ca_key)?)?,
        )?;

        let mut cert_info = csr.to_cert_info()?;
        cert_info.usages = vec![
            ExtendedKeyUsageOption::ServerAuth,
            ExtendedKeyUsageOption::ClientAuth,
        ];
        // the service DNS name goes in the SAN as well as the CN
        let san = SubjectAltName {
            names: vec![cert_info.subject.common_name.clone()],
        };
        cert_info.extensions = vec![ExtensionParam::from_extension(san, false)?];

        let validity = Validity::for_days(request.days)?;
        let serial_number = serial::next_serial(request.serial)?;
        let cert = ca.issue(&cert_info, validity, &serial_number)?;

        fs_util::write_atomic(request.cert_out, cert.to_pem()?.as_bytes(), PUBLIC_FILE_MODE)
    }
}
