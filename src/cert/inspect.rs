//! Parse certificates back from DER/PEM and read the fields the CA cares about.

use crate::cert::loader::load_certificate_from_pem;
use crate::error::{CaError, Result};
use const_oid::AssociatedOid;
use der::Decode;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsage};
use x509_cert::ext::Extension;
use x509_cert::Certificate;

/// The interesting parts of a certificate, in printable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    /// RFC 4514 string, e.g. `CN=My Root CA,O=My Org`.
    pub subject: String,
    pub issuer: String,
    pub serial_hex: String,
    /// Unix seconds.
    pub not_before: u64,
    /// Unix seconds.
    pub not_after: u64,
    pub is_ca: bool,
    pub path_len: Option<u8>,
    pub key_cert_sign: bool,
    pub crl_sign: bool,
    /// Issuer and subject are the same name.
    pub self_issued: bool,
}

/// Decode a DER certificate.
pub fn parse_certificate_der(der: &[u8]) -> Result<Certificate> {
    Certificate::from_der(der)
        .map_err(|e| CaError::CertificateError(format!("Failed to decode certificate: {}", e)))
}

/// Decode the first certificate of a PEM document.
pub fn parse_certificate_pem(pem_str: &str) -> Result<Certificate> {
    let der = load_certificate_from_pem(pem_str)?;
    parse_certificate_der(&der)
}

fn find_extension<'a>(
    cert: &'a Certificate,
    oid: &const_oid::ObjectIdentifier,
) -> Option<&'a Extension> {
    cert.tbs_certificate
        .extensions
        .as_ref()
        .and_then(|extensions| extensions.iter().find(|ext| &ext.extn_id == oid))
}

/// The basic constraints extension, if present.
pub fn basic_constraints(cert: &Certificate) -> Result<Option<BasicConstraints>> {
    find_extension(cert, &BasicConstraints::OID)
        .map(|ext| {
            BasicConstraints::from_der(ext.extn_value.as_bytes()).map_err(|e| {
                CaError::CertificateError(format!("Invalid basic constraints: {}", e))
            })
        })
        .transpose()
}

/// The key usage extension, if present.
pub fn key_usage(cert: &Certificate) -> Result<Option<KeyUsage>> {
    find_extension(cert, &KeyUsage::OID)
        .map(|ext| {
            KeyUsage::from_der(ext.extn_value.as_bytes())
                .map_err(|e| CaError::CertificateError(format!("Invalid key usage: {}", e)))
        })
        .transpose()
}

/// Not-before and not-after as Unix seconds.
pub fn validity_bounds(cert: &Certificate) -> (u64, u64) {
    let validity = &cert.tbs_certificate.validity;
    (
        validity.not_before.to_unix_duration().as_secs(),
        validity.not_after.to_unix_duration().as_secs(),
    )
}

pub fn summarize(cert: &Certificate) -> Result<CertificateSummary> {
    let tbs = &cert.tbs_certificate;
    let constraints = basic_constraints(cert)?;
    let usage = key_usage(cert)?;
    let (not_before, not_after) = validity_bounds(cert);

    Ok(CertificateSummary {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        serial_hex: hex::encode(tbs.serial_number.as_bytes()),
        not_before,
        not_after,
        is_ca: constraints.as_ref().map(|bc| bc.ca).unwrap_or(false),
        path_len: constraints.and_then(|bc| bc.path_len_constraint),
        key_cert_sign: usage.as_ref().map(|ku| ku.key_cert_sign()).unwrap_or(false),
        crl_sign: usage.as_ref().map(|ku| ku.crl_sign()).unwrap_or(false),
        self_issued: tbs.issuer == tbs.subject,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_garbage_der() {
        let result = parse_certificate_der(&[0x30, 0x03, 0x02, 0x01, 0x00]);
        assert!(matches!(result, Err(CaError::CertificateError(_))));
    }

    #[test]
    fn test_parse_pem_without_certificate() {
        let result = parse_certificate_pem("-----BEGIN NOTHING-----\n-----END NOTHING-----\n");
        assert!(result.is_err());
    }
}
