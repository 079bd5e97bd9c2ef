//! Serial numbers and the CA serial file (`cacrt.srl`).
//!
//! The file holds one uppercase hex serial and a newline, the same format
//! `openssl x509 -CAcreateserial` reads and writes, so either engine can sign
//! with a CA the other one created.

use std::path::Path;

use crate::error::{CertBundleError, Result};
use crate::fs_util;

/// A fresh random positive 128-bit serial.
pub fn random_serial() -> Vec<u8> {
    let mut serial: [u8; 16] = rand::random();
    // clear the sign bit, keep the full width
    serial[0] = (serial[0] & 0x7f) | 0x40;
    serial.to_vec()
}

/// Allocates the serial for the next certificate signed by this CA.
///
/// A missing file starts a random sequence; an existing one is incremented.
/// The allocated serial is written back before it is returned.
pub fn next_serial(path: &Path) -> Result<Vec<u8>> {
    let exists = path
        .try_exists()
        .map_err(|e| CertBundleError::io(path, e))?;
    let serial = if exists {
        let mut current = parse_hex(fs_util::read_to_string(path)?.trim())?;
        increment(&mut current);
        if current[0] & 0x80 != 0 {
            // keep the DER INTEGER positive
            current.insert(0, 0);
        }
        current
    } else {
        random_serial()
    };
    fs_util::write_atomic(
        path,
        format!("{}\n", to_hex(&serial)).as_bytes(),
        fs_util::PUBLIC_FILE_MODE,
    )?;
    Ok(serial)
}

fn increment(serial: &mut Vec<u8>) {
    for byte in serial.iter_mut().rev() {
        let (next, carry) = byte.overflowing_add(1);
        *byte = next;
        if !carry {
            return;
        }
    }
    serial.insert(0, 1);
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let invalid = || CertBundleError::DecodingError(format!("invalid serial number {text:?}"));
    if text.is_empty() || !text.is_ascii() {
        return Err(invalid());
    }
    let padded = if text.len() % 2 == 1 {
        format!("0{text}")
    } else {
        text.to_string()
    };
    (0..padded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&padded[i..i + 2], 16).map_err(|_| invalid()))
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
