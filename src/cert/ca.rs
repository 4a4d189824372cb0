//! Root CA certificate operations.
//!
//! This module builds the root CA template and self-signs it.

use crate::cert::builder::{
    build_distinguished_name, cert_to_pem, generate_serial_number, set_validity,
    sha256_fingerprint,
};
use crate::cert::inspect::parse_certificate_der;
use crate::config::CaConfig;
use crate::crypto::keypair::RsaKeypair;
use crate::error::{CaError, Result};
use rcgen::{BasicConstraints, Certificate, CertificateParams, IsCa, KeyIdMethod};
use tracing::{debug, info};

/// Maximum number of intermediate CAs allowed below the root.
pub const ROOT_MAX_PATH_LEN: u8 = 1;

/// A freshly self-signed root CA certificate.
#[derive(Debug, Clone)]
pub struct RootCa {
    der: Vec<u8>,
    pem: String,
    serial_hex: String,
}

impl RootCa {
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }

    /// Serial number as lowercase hex.
    pub fn serial_hex(&self) -> &str {
        &self.serial_hex
    }

    pub fn fingerprint(&self) -> String {
        sha256_fingerprint(&self.der)
    }
}

/// Build the root CA certificate template.
///
/// Subject and issuer are the same name. The key may sign certificates and
/// CRLs, and basic constraints allow one level of intermediates below it.
/// Returns the parameters and the serial number in hex.
pub fn root_ca_params(
    config: &CaConfig,
    keypair: &RsaKeypair,
) -> Result<(CertificateParams, String)> {
    let (serial, serial_hex) = generate_serial_number();

    let mut params = CertificateParams::default();
    params.alg = &rcgen::PKCS_RSA_SHA256;
    params.serial_number = Some(serial);
    params.distinguished_name = build_distinguished_name(&config.common_name, &config.organization);
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(ROOT_MAX_PATH_LEN));
    params.key_usages = vec![
        rcgen::KeyUsagePurpose::KeyCertSign,
        rcgen::KeyUsagePurpose::CrlSign,
    ];
    params.extended_key_usages = Vec::new();
    params.subject_alt_names = Vec::new();
    params.key_identifier_method = KeyIdMethod::Sha256;

    set_validity(&mut params, config.validity_days)?;

    params.key_pair = Some(keypair.to_rcgen()?);

    Ok((params, serial_hex))
}

/// Create and self-sign the root CA certificate.
///
/// The configuration is validated first. The signed certificate is decoded
/// again before it is returned.
///
/// # Example
///
/// ```no_run
/// use rootca::cert::ca::create_root_ca;
/// use rootca::config::CaConfig;
/// use rootca::crypto::keypair::generate_rsa_keypair;
///
/// # fn example() -> rootca::error::Result<()> {
/// let config = CaConfig {
///     common_name: "My Root CA".to_string(),
///     key_bits: 2048,
///     ..CaConfig::default()
/// };
/// let keypair = generate_rsa_keypair(config.key_bits)?;
/// let root = create_root_ca(&config, &keypair)?;
/// assert!(root.pem().contains("BEGIN CERTIFICATE"));
/// # Ok(())
/// # }
/// ```
pub fn create_root_ca(config: &CaConfig, keypair: &RsaKeypair) -> Result<RootCa> {
    config.validate()?;
    if keypair.bits() != config.key_bits {
        return Err(CaError::InvalidKeyError(format!(
            "Key has {} bits but the configuration asks for {}",
            keypair.bits(),
            config.key_bits
        )));
    }

    debug!("creating certificate template");
    let (params, serial_hex) = root_ca_params(config, keypair)?;

    info!(common_name = %config.common_name, "signing root CA certificate");
    let cert = Certificate::from_params(params)
        .map_err(|e| CaError::CertificateError(format!("Failed to create Root CA: {}", e)))?;
    let der = cert
        .serialize_der()
        .map_err(|e| CaError::CertificateError(format!("Failed to create certificate: {}", e)))?;

    parse_certificate_der(&der).map_err(|e| {
        CaError::CertificateError(format!("Failed to parse generated certificate: {}", e))
    })?;

    Ok(RootCa {
        pem: cert_to_pem(&der),
        der,
        serial_hex,
    })
}
