use std::path::PathBuf;

use bon::Builder;

use crate::cert::params::{MAX_VALIDITY_YEAR, Validity};
use crate::error::{CertBundleError, Result};

/// Output root used when the operator does not pass `--output`.
pub const DEFAULT_OUTPUT_DIR: &str = "config";
pub const DEFAULT_KEY_BITS: usize = 2048;
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

/// Key size and lifetime of every generated certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CertificateSettings {
    pub key_bits: usize,
    pub validity_days: u32,
}

impl Default for CertificateSettings {
    fn default() -> Self {
        CertificateSettings {
            key_bits: DEFAULT_KEY_BITS,
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

/// Everything one run needs, as supplied by the operator.
///
/// Nothing is checked at construction; [`Config::validate`] is the gate the
/// orchestrator passes before touching the filesystem.
#[derive(Clone, Debug, Builder)]
pub struct Config {
    /// Logical service name
    pub name: String,
    /// Namespace the service runs in
    pub namespace: String,
    #[builder(default = PathBuf::from(DEFAULT_OUTPUT_DIR))]
    pub output: PathBuf,
    #[builder(default)]
    pub settings: CertificateSettings,
}

impl Config {
    pub fn validate(&self) -> Result<ServiceIdentity> {
        if self.settings.key_bits == 0 {
            return Err(CertBundleError::Config("key size must be positive".to_string()));
        }
        if self.settings.validity_days == 0 {
            return Err(CertBundleError::Config(
                "validity must be at least one day".to_string(),
            ));
        }
        Validity::for_days(self.settings.validity_days).map_err(|_| {
            CertBundleError::Config(format!(
                "validity of {} days runs past year {MAX_VALIDITY_YEAR}",
                self.settings.validity_days
            ))
        })?;
        ServiceIdentity::new(&self.name, &self.namespace)
    }
}

/// A validated service name and namespace, from which both bundles derive
/// their certificate names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceIdentity {
    name: String,
    namespace: String,
}

impl ServiceIdentity {
    pub fn new(name: &str, namespace: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(CertBundleError::Config("must specify --name".to_string()));
        }
        if namespace.is_empty() {
            return Err(CertBundleError::Config("must specify --namespace".to_string()));
        }
        Ok(ServiceIdentity {
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Common name of the per-bundle certificate authority.
    pub fn ca_common_name(&self) -> String {
        format!("{}-certificate-authority", self.name)
    }

    /// In-cluster DNS name of the service, `<name>.<namespace>.svc`.
    pub fn service_dns_name(&self) -> String {
        format!("{}.{}.svc", self.name, self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::builder()
            .name("svc1".to_string())
            .namespace("ns1".to_string())
            .build();
        assert_eq!(config.output, PathBuf::from("config"));
        assert_eq!(config.settings.key_bits, 2048);
        assert_eq!(config.settings.validity_days, 365);
    }

    #[test]
    fn test_derived_names() {
        let identity = ServiceIdentity::new("svc1", "ns1").unwrap();
        assert_eq!(identity.ca_common_name(), "svc1-certificate-authority");
        assert_eq!(identity.service_dns_name(), "svc1.ns1.svc");
    }

    #[test]
    fn test_empty_name_or_namespace_is_rejected() {
        let err = ServiceIdentity::new("", "ns1").unwrap_err();
        assert!(matches!(err, CertBundleError::Config(ref m) if m.contains("--name")));

        let err = ServiceIdentity::new("svc1", "").unwrap_err();
        assert!(matches!(err, CertBundleError::Config(ref m) if m.contains("--namespace")));
    }

    #[test]
    fn test_whitespace_name_is_used_verbatim() {
        let identity = ServiceIdentity::new(" ", "ns1").unwrap();
        assert_eq!(identity.service_dns_name(), " .ns1.svc");
    }

    #[test]
    fn test_zero_settings_are_rejected() {
        let config = Config::builder()
            .name("svc1".to_string())
            .namespace("ns1".to_string())
            .settings(CertificateSettings {
                key_bits: 2048,
                validity_days: 0,
            })
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validity_past_year_9999_is_a_config_error() {
        let config = Config::builder()
            .name("svc1".to_string())
            .namespace("ns1".to_string())
            .settings(CertificateSettings {
                key_bits: 2048,
                validity_days: 4_000_000,
            })
            .build();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CertBundleError::Config(ref m) if m.contains("9999")));
    }
}
