pub mod extensions;
pub mod params;

use der::{DecodePem, Encode, EncodePem};
use extensions::{SubjectAltName, ToX509Extension};
use params::{CertificationRequestInfo, DistinguishedName, Validity};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;

use crate::error::{CertBundleError, Result};
use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};

/// Represents an X.509 certificate.
///
/// This struct provides methods to encode the certificate into DER or PEM formats.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CertBundleError::EncodingError(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CertBundleError::EncodingError(e.to_string()))
    }

    /// Parses a PEM `CERTIFICATE` document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertificateInner::from_pem(pem)?;
        Ok(Certificate { inner })
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Returns the DNS names of the subject alternative name extension, if any.
    pub fn dns_names(&self) -> Result<Vec<String>> {
        let extensions = self.inner.tbs_certificate.extensions.as_deref().unwrap_or_default();
        match extensions.iter().find(|ext| ext.extn_id == SubjectAltName::OID) {
            Some(ext) => Ok(SubjectAltName::from_der(ext.extn_value.as_bytes())?.names),
            None => Ok(Vec::new()),
        }
    }

    /// Checks that this certificate was signed by the holder of `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        issuer_key.verify(&tbs, self.inner.signature.raw_bytes())
    }

    /// Creates a new self-signed certificate.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    /// * `validity` - The validity window of the certificate.
    /// * `serial_number` - Big-endian, positive serial number.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &KeyPair,
        validity: Validity,
        serial_number: &[u8],
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.as_x509_name()?,
            key,
            serial_number,
        };

        self_issuer.issue(cert_info, validity, serial_number)
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
    serial_number: &'a [u8],
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }

    fn serial_number(&self) -> Vec<u8> {
        self.serial_number.to_vec()
    }
}

/// A CA certificate together with its private key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl CertificateWithPrivateKey {
    /// Pairs a certificate with a key, rejecting a key that does not belong to it.
    pub fn new(cert: Certificate, key: KeyPair) -> Result<Self> {
        if cert.public_key()? != key.public_key() {
            return Err(CertBundleError::CertificateError(
                "private key does not match certificate".to_string(),
            ));
        }
        Ok(CertificateWithPrivateKey { cert, key })
    }
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate, byte for byte
        self.cert.inner.tbs_certificate.subject.clone()
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn serial_number(&self) -> Vec<u8> {
        self.cert
            .inner
            .tbs_certificate
            .serial_number
            .as_bytes()
            .to_vec()
    }

    fn authority_cert_issuer(&self) -> Name {
        self.cert.inner.tbs_certificate.issuer.clone()
    }
}
