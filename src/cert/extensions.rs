//! Typed views of the certificate extensions bundles use.
//!
//! Each type encodes to the DER `extnValue` of its extension through
//! [`ToX509Extension`]; the x509-cert types do the encoding.

use const_oid::AssociatedOid;
use const_oid::db::rfc5912::{ID_KP_CLIENT_AUTH, ID_KP_SERVER_AUTH};
use der::asn1::{Ia5String, OctetString};
use der::oid::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::ext::pkix;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;

use crate::error::CertBundleError;

pub use der::flagset::FlagSet;
pub use x509_cert::ext::pkix::KeyUsages;

/// An extension that can be written into a certificate.
///
/// ```
/// use certbundle::cert::extensions::{SubjectAltName, ToX509Extension};
/// let san = SubjectAltName { names: vec!["svc1.ns1.svc".to_string()] };
/// let der = san.to_x509_extension_value().unwrap();
/// assert_eq!(SubjectAltName::from_der(&der).unwrap().names, san.names);
/// ```
pub trait ToX509Extension {
    const OID: ObjectIdentifier;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError>;
}

fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, CertBundleError> {
    Ok(value.to_der()?)
}

fn octets(bytes: &[u8]) -> Result<OctetString, CertBundleError> {
    Ok(OctetString::new(bytes)?)
}

/// DNS names of the subject alternative name extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl SubjectAltName {
    /// Reads the DNS names out of an encoded extension value.
    ///
    /// Entries of other kinds (IP addresses, URIs, ...) are skipped.
    pub fn from_der(extension: &[u8]) -> Result<Self, CertBundleError> {
        let san = pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .into_iter()
            .filter_map(|name| match name {
                GeneralName::DnsName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect();
        Ok(SubjectAltName { names })
    }
}

impl ToX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        let mut general_names = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let dns = Ia5String::new(name).map_err(|_| {
                CertBundleError::InvalidInput(format!("{name:?} is not a valid DNS name"))
            })?;
            general_names.push(GeneralName::DnsName(dns));
        }
        encode(&pkix::SubjectAltName(general_names))
    }
}

/// Whether the subject may act as a CA, and how deep a chain below it may go.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        encode(&pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <pkix::KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        encode(&pkix::KeyUsage(self.0))
    }
}

/// TLS purposes a leaf certificate can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::ServerAuth => ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => ID_KP_CLIENT_AUTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        encode(&pkix::ExtendedKeyUsage(
            self.usage.iter().copied().map(ObjectIdentifier::from).collect(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        encode(&pkix::SubjectKeyIdentifier(octets(&self.0)?))
    }
}

/// Identifies the key, and optionally the certificate, that signed a certificate.
///
/// `authority_cert_issuer` and `authority_cert_serial_number` name the
/// issuer's own certificate: its issuer DN and its serial number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<Name>,
    pub authority_cert_serial_number: Option<Vec<u8>>,
}

impl ToX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertBundleError> {
        let key_identifier = self.key_identifier.as_deref().map(octets).transpose()?;
        let serial_number = self
            .authority_cert_serial_number
            .as_deref()
            .map(SerialNumber::new)
            .transpose()?;
        encode(&pkix::AuthorityKeyIdentifier {
            key_identifier,
            authority_cert_issuer: self
                .authority_cert_issuer
                .clone()
                .map(|name| vec![GeneralName::DirectoryName(name)]),
            authority_cert_serial_number: serial_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::params::DistinguishedName;

    #[test]
    fn test_ca_basic_constraints_der() {
        let ca = BasicConstraints {
            is_ca: true,
            max_path_length: None,
        };
        assert_eq!(ca.to_x509_extension_value().unwrap(), [0x30, 0x03, 0x01, 0x01, 0xff]);

        // cA defaults to false and is left out
        let leaf = BasicConstraints::default().to_x509_extension_value().unwrap();
        assert_eq!(leaf, [0x30, 0x00]);
    }

    #[test]
    fn test_server_auth_eku_der() {
        let eku = ExtendedKeyUsage {
            usage: vec![ExtendedKeyUsageOption::ServerAuth],
        };
        assert_eq!(
            eku.to_x509_extension_value().unwrap(),
            [0x30, 0x0a, 0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01]
        );
    }

    #[test]
    fn test_san_reads_dns_names_only() {
        let san = pkix::SubjectAltName(vec![
            GeneralName::DnsName(Ia5String::new("svc1.ns1.svc").unwrap()),
            GeneralName::IpAddress(OctetString::new([127u8, 0, 0, 1]).unwrap()),
        ]);
        let der = san.to_der().unwrap();
        assert_eq!(
            SubjectAltName::from_der(&der).unwrap().names,
            vec!["svc1.ns1.svc".to_string()]
        );
    }

    #[test]
    fn test_san_rejects_non_ascii_name() {
        let san = SubjectAltName {
            names: vec!["sv\u{e9}.ns1.svc".to_string()],
        };
        assert!(san.to_x509_extension_value().is_err());
    }

    #[test]
    fn test_key_usage_flags() {
        let usage = KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign);
        let der = usage.to_x509_extension_value().unwrap();
        let decoded = pkix::KeyUsage::from_der(&der).unwrap();
        assert!(decoded.0.contains(KeyUsages::KeyCertSign));
        assert!(decoded.0.contains(KeyUsages::CRLSign));
        assert!(!decoded.0.contains(KeyUsages::DigitalSignature));
    }

    #[test]
    fn test_subject_key_identifier_der() {
        let ski = SubjectKeyIdentifier(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            ski.to_x509_extension_value().unwrap(),
            [0x04, 0x04, 0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn test_authority_key_identifier_fields() {
        let issuer = DistinguishedName::service("svc1-certificate-authority")
            .as_x509_name()
            .unwrap();
        let aki = AuthorityKeyIdentifier {
            key_identifier: Some(vec![1, 2, 3, 4, 5]),
            authority_cert_issuer: Some(issuer.clone()),
            authority_cert_serial_number: Some(vec![0x42]),
        };
        let der = aki.to_x509_extension_value().unwrap();
        let decoded = pkix::AuthorityKeyIdentifier::from_der(&der).unwrap();
        assert_eq!(decoded.key_identifier.unwrap().as_bytes(), [1, 2, 3, 4, 5]);
        assert_eq!(
            decoded.authority_cert_issuer,
            Some(vec![GeneralName::DirectoryName(issuer)])
        );
        assert_eq!(
            decoded.authority_cert_serial_number.unwrap().as_bytes(),
            [0x42]
        );

        let key_only = AuthorityKeyIdentifier {
            key_identifier: Some(vec![9; 20]),
            ..Default::default()
        };
        let decoded =
            pkix::AuthorityKeyIdentifier::from_der(&key_only.to_x509_extension_value().unwrap())
                .unwrap();
        assert!(decoded.authority_cert_issuer.is_none());
        assert!(decoded.authority_cert_serial_number.is_none());
    }
}
