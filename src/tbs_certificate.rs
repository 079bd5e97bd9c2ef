use der::DateTime;
use der::asn1::{GeneralizedTime, OctetString, UtcTime};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::{Time, Validity};

use crate::cert::params::ExtensionParam;
use crate::error::CertBundleError;
use crate::key::PublicKey;

/// The signed portion of a certificate, in a form that is easy to build and inspect.
///
/// Always encoded as a v3 certificate with the extensions present, even when
/// the list is empty.
pub struct TbsCertificate {
    /// Certificate serial number, big-endian
    pub serial_number: Vec<u8>,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// Issuer name, kept as encoded by the issuing certificate
    pub issuer: Name,
    pub not_before: time::OffsetDateTime,
    pub not_after: time::OffsetDateTime,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, CertBundleError> {
        let extensions = self
            .extensions
            .iter()
            .map(|ext| -> Result<_, der::Error> {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let validity = Validity {
            not_before: x509_time(self.not_before)?,
            not_after: x509_time(self.not_after)?,
        };

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(self.serial_number.as_slice())?,
            signature: self.signature_algorithm.clone(),
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.as_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }
}

/// RFC 5280 4.1.2.5: UTCTime through 2049, GeneralizedTime from 2050.
fn x509_time(at: time::OffsetDateTime) -> Result<Time, der::Error> {
    let at = DateTime::from_system_time(at.into())?;
    if at.year() < 2050 {
        Ok(Time::UtcTime(UtcTime::from_date_time(at)?))
    } else {
        Ok(Time::GeneralTime(GeneralizedTime::from_date_time(at)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_switches_to_generalized_time_in_2050() {
        // 2049-12-31T23:59:59Z and one second later
        let before = time::OffsetDateTime::from_unix_timestamp(2_524_607_999).unwrap();
        let after = time::OffsetDateTime::from_unix_timestamp(2_524_608_000).unwrap();
        assert!(matches!(x509_time(before).unwrap(), Time::UtcTime(_)));
        assert!(matches!(x509_time(after).unwrap(), Time::GeneralTime(_)));
    }
}
