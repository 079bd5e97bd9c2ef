//! PKCS#10 certificate signing requests.

use der::asn1::BitString;
use der::{Decode, Encode};
use x509_cert::request::{CertReq, CertReqInfo, Version};

use crate::cert::params::{CertificationRequestInfo, DistinguishedName};
use crate::error::{CertBundleError, Result};
use crate::key::{KeyPair, PublicKey};
use crate::pem_utils::{der_to_pem, pem_to_der};

const PEM_LABEL: &str = "CERTIFICATE REQUEST";

/// A signed certificate signing request.
#[derive(Debug, Clone)]
pub struct CertificateSigningRequest {
    pub inner: CertReq,
}

impl CertificateSigningRequest {
    /// Builds a request for `subject` and signs it with `key`, proving possession.
    pub fn new(subject: &DistinguishedName, key: &KeyPair) -> Result<Self> {
        let info = CertReqInfo {
            version: Version::V1,
            subject: subject.as_x509_name()?,
            public_key: key.as_spki()?,
            attributes: Default::default(),
        };
        let signature = key.sign_data(&info.to_der()?)?;

        Ok(CertificateSigningRequest {
            inner: CertReq {
                info,
                algorithm: key.signature_algorithm(),
                signature: BitString::from_bytes(&signature)?,
            },
        })
    }

    pub fn to_pem(&self) -> Result<String> {
        let der = self
            .inner
            .to_der()
            .map_err(|e| CertBundleError::EncodingError(e.to_string()))?;
        Ok(der_to_pem(&der, PEM_LABEL))
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        let der = pem_to_der(pem, PEM_LABEL)?;
        Ok(CertificateSigningRequest {
            inner: CertReq::from_der(&der)?,
        })
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.info.public_key)
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.info.subject)
    }

    /// Checks the self-signature over the request info.
    pub fn verify(&self) -> Result<()> {
        if self.inner.algorithm.oid != const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION {
            return Err(CertBundleError::InvalidInput(format!(
                "unsupported CSR signature algorithm {}",
                self.inner.algorithm.oid
            )));
        }
        let info = self.inner.info.to_der()?;
        self.public_key()?
            .verify(&info, self.inner.signature.raw_bytes())
    }

    /// The subject and key of this request as issuance parameters.
    pub fn to_cert_info(&self) -> Result<CertificationRequestInfo> {
        Ok(CertificationRequestInfo::builder()
            .subject(self.subject()?)
            .subject_public_key(self.public_key()?)
            .build())
    }
}
