use bon::Builder;
use const_oid::ObjectIdentifier;
use der::Tagged;
use der::asn1::{Ia5StringRef, PrintableStringRef};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::name::{Name, RdnSequence};

use super::extensions::ToX509Extension;
pub use crate::cert::extensions::ExtendedKeyUsage;
pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::CertBundleError;
use crate::key::PublicKey;

const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_STATE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_ORGANIZATION_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `extensions` - Additional X.509 extensions.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name of a certificate subject or issuer.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// The placeholder `C=un, ST=st, L=l, O=o, OU=ou` subject used for every
    /// bundle certificate, with the given common name.
    pub fn service(common_name: impl Into<String>) -> Self {
        DistinguishedName::builder()
            .common_name(common_name.into())
            .country("un".to_string())
            .state("st".to_string())
            .locality("l".to_string())
            .organization("o".to_string())
            .organization_unit("ou".to_string())
            .build()
    }

    /// Attributes in encoding order, most significant first. Absent ones are skipped.
    fn attributes(&self) -> Vec<(&'static str, &str)> {
        [
            ("C", self.country.as_deref()),
            ("ST", self.state.as_deref()),
            ("L", self.locality.as_deref()),
            ("O", self.organization.as_deref()),
            ("OU", self.organization_unit.as_deref()),
            ("CN", Some(self.common_name.as_str())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }

    /// Converts the distinguished name to an X.509-compatible format.
    pub fn as_x509_name(&self) -> Result<Name, CertBundleError> {
        use core::str::FromStr;
        // RFC 4514 lists the most specific RDN first.
        let rfc4514_name = self
            .attributes()
            .iter()
            .rev()
            .map(|(key, value)| format!("{key}={}", escape_rfc4514(value)))
            .collect::<Vec<_>>()
            .join(",");
        RdnSequence::from_str(&rfc4514_name).map_err(|e| {
            CertBundleError::InvalidInput(format!("invalid distinguished name {rfc4514_name}: {e}"))
        })
    }

    /// Renders the name in the slash-separated form accepted by `openssl -subj`.
    pub fn to_openssl_subject(&self) -> String {
        self.attributes()
            .iter()
            .map(|(key, value)| format!("/{key}={}", value.replace('/', "\\/")))
            .collect()
    }

    /// Creates a `DistinguishedName` from an X.509-compatible format.
    ///
    /// Attributes other than CN, C, ST, L, O and OU are ignored.
    pub fn from_x509_name(x509dn: &Name) -> Result<Self, CertBundleError> {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let slot = match attr.oid {
                    OID_COMMON_NAME => {
                        dn.common_name = decode_directory_string(&attr.value)?;
                        continue;
                    }
                    OID_COUNTRY => &mut dn.country,
                    OID_STATE => &mut dn.state,
                    OID_LOCALITY => &mut dn.locality,
                    OID_ORGANIZATION => &mut dn.organization,
                    OID_ORGANIZATION_UNIT => &mut dn.organization_unit,
                    _ => continue,
                };
                *slot = Some(decode_directory_string(&attr.value)?);
            }
        }

        Ok(dn)
    }
}

fn escape_rfc4514(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn decode_directory_string(value: &der::Any) -> Result<String, CertBundleError> {
    if let Ok(s) = value.decode_as::<String>() {
        return Ok(s);
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef<'_>>() {
        return Ok(s.as_str().to_string());
    }
    if let Ok(s) = value.decode_as::<Ia5StringRef<'_>>() {
        return Ok(s.as_str().to_string());
    }
    Err(CertBundleError::DecodingError(format!(
        "unsupported string type {} in distinguished name",
        value.tag()
    )))
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

/// Last year an X.509 GeneralizedTime can express.
pub const MAX_VALIDITY_YEAR: i32 = 9999;

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// Fails if the period would end after [`MAX_VALIDITY_YEAR`].
    pub fn for_days(days: u32) -> Result<Self, CertBundleError> {
        let now = OffsetDateTime::now_utc();
        let out_of_range = || {
            CertBundleError::InvalidInput(format!(
                "a validity of {days} days ends after year {MAX_VALIDITY_YEAR}"
            ))
        };
        let not_after = now
            .checked_add(Duration::days(days.into()))
            .filter(|end| end.year() <= MAX_VALIDITY_YEAR)
            .ok_or_else(out_of_range)?;
        Ok(Self {
            not_before: now,
            not_after,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CertBundleError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }
}
