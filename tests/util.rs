#![allow(dead_code)]

use std::path::Path;

use certbundle::config::{CertificateSettings, Config};

/// Small keys keep the suite fast; production runs use the 2048-bit default.
pub const TEST_SETTINGS: CertificateSettings = CertificateSettings {
    key_bits: 1024,
    validity_days: 365,
};

pub fn config(output: &Path) -> Config {
    Config::builder()
        .name("svc1".to_string())
        .namespace("ns1".to_string())
        .output(output.to_path_buf())
        .settings(TEST_SETTINGS)
        .build()
}

pub fn read(path: impl AsRef<Path>) -> Vec<u8> {
    std::fs::read(path.as_ref())
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.as_ref().display()))
}

pub fn read_string(path: impl AsRef<Path>) -> String {
    String::from_utf8(read(path)).unwrap()
}
