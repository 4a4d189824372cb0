//! Certificate builder utilities.
//!
//! Small building blocks shared by the root CA and leaf certificate
//! templates: names, serial numbers, validity windows and encodings.

use crate::error::{CaError, Result};
use rand::rngs::OsRng;
use rand::RngCore;
use rcgen::{CertificateParams, DistinguishedName, DnType, SerialNumber};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// Serial numbers are 128 bits of randomness.
pub const SERIAL_NUMBER_BYTES: usize = 16;

/// Build a subject name from a common name and an optional organization.
///
/// An empty organization leaves the O attribute out entirely.
///
/// # Example
///
/// ```
/// use rootca::cert::builder::build_distinguished_name;
///
/// let dn = build_distinguished_name("My Corp Root CA", "My Corp");
/// assert_eq!(dn.iter().count(), 2);
/// ```
pub fn build_distinguished_name(common_name: &str, organization: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name.trim());

    let organization = organization.trim();
    if !organization.is_empty() {
        dn.push(DnType::OrganizationName, organization);
    }

    dn
}

/// Parse a subject string (e.g., "CN=example.com,O=Example Org") into a DistinguishedName.
///
/// # Example
///
/// ```
/// use rootca::cert::builder::parse_subject;
///
/// let dn = parse_subject("CN=example.com,O=Example Org").unwrap();
/// assert_eq!(dn.iter().count(), 2);
/// ```
pub fn parse_subject(subject: &str) -> Result<DistinguishedName> {
    let mut dn = DistinguishedName::new();

    for part in subject.split(',') {
        let part = part.trim();
        if let Some((key, value)) = part.split_once('=') {
            let key = key.trim();
            let value = value.trim();

            let dn_type = match key.to_uppercase().as_str() {
                "CN" => DnType::CommonName,
                "C" => DnType::CountryName,
                "O" => DnType::OrganizationName,
                "OU" => DnType::OrganizationalUnitName,
                "ST" => DnType::StateOrProvinceName,
                "L" => DnType::LocalityName,
                _ => return Err(CaError::ParseError(format!("Unknown DN type: {}", key))),
            };
            if value.is_empty() {
                return Err(CaError::ParseError(format!("Empty value for {}", key)));
            }

            dn.push(dn_type, value);
        } else {
            return Err(CaError::ParseError(format!(
                "Invalid subject format: {}",
                part
            )));
        }
    }

    if dn.iter().next().is_none() {
        return Err(CaError::ParseError("Subject cannot be empty".to_string()));
    }

    Ok(dn)
}

/// Generate a random, positive, non-zero 128-bit serial number.
///
/// Returns the rcgen serial together with its hex form for display.
pub fn generate_serial_number() -> (SerialNumber, String) {
    let bytes = random_serial_bytes();
    (SerialNumber::from(bytes.to_vec()), hex::encode(bytes))
}

fn random_serial_bytes() -> [u8; SERIAL_NUMBER_BYTES] {
    let mut bytes = [0u8; SERIAL_NUMBER_BYTES];
    OsRng.fill_bytes(&mut bytes);
    // Positive, minimally encoded: high bit clear, first byte non-zero.
    bytes[0] = (bytes[0] & 0x7F).max(1);
    bytes
}

/// Validity window starting now (UTC, whole seconds) and lasting `days`.
pub fn validity_window(days: u32) -> Result<(OffsetDateTime, OffsetDateTime)> {
    let not_before = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp())
        .map_err(|e| CaError::CertificateError(format!("Invalid current time: {}", e)))?;
    let not_after = not_before
        .checked_add(Duration::days(i64::from(days)))
        .ok_or_else(|| {
            CaError::ConfigError(format!("Validity of {} days is out of range", days))
        })?;

    Ok((not_before, not_after))
}

/// Set the validity period for a certificate.
pub fn set_validity(params: &mut CertificateParams, days: u32) -> Result<()> {
    let (not_before, not_after) = validity_window(days)?;
    params.not_before = not_before;
    params.not_after = not_after;
    Ok(())
}

/// Encode DER certificate bytes as a `CERTIFICATE` PEM block with LF line endings.
pub fn cert_to_pem(der: &[u8]) -> String {
    let config = pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF);
    pem::encode_config(&pem::Pem::new("CERTIFICATE", der.to_vec()), config)
}

/// SHA-256 fingerprint in the usual `AB:CD:...` form.
pub fn sha256_fingerprint(der: &[u8]) -> String {
    let digest = Sha256::digest(der);
    digest
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}
