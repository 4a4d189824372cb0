//! Certificate loading from PEM files.
//!
//! Certificates on disk are PEM; everything else in the crate works on DER.

use crate::error::{CaError, Result};
use rustls_pemfile::Item;
use std::io::Cursor;

/// Extract the DER bytes of the first PEM item, which must be a certificate.
///
/// # Example
///
/// ```rust,no_run
/// use rootca::cert::loader::load_certificate_from_pem;
///
/// # fn example() -> rootca::error::Result<()> {
/// let pem = std::fs::read_to_string("ca.crt")?;
/// let der = load_certificate_from_pem(&pem)?;
/// # Ok(())
/// # }
/// ```
pub fn load_certificate_from_pem(pem_str: &str) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    match rustls_pemfile::read_one(&mut cursor)
        .map_err(|e| CaError::PemError(format!("Failed to read PEM: {}", e)))?
    {
        Some(Item::X509Certificate(cert_der)) => Ok(cert_der.to_vec()),
        Some(_) => Err(CaError::PemError(
            "PEM file does not contain a certificate".to_string(),
        )),
        None => Err(CaError::PemError("Empty PEM file".to_string())),
    }
}

/// Load every certificate in a PEM document (e.g. a chain file).
///
/// Non-certificate items such as keys are skipped.
pub fn load_certificates_from_pem(pem_str: &str) -> Result<Vec<Vec<u8>>> {
    let mut cursor = Cursor::new(pem_str.as_bytes());
    let mut certificates = Vec::new();

    loop {
        match rustls_pemfile::read_one(&mut cursor)
            .map_err(|e| CaError::PemError(format!("Failed to read PEM: {}", e)))?
        {
            Some(Item::X509Certificate(cert_der)) => {
                certificates.push(cert_der.to_vec());
            }
            Some(_) => continue,
            None => break,
        }
    }

    if certificates.is_empty() {
        return Err(CaError::PemError(
            "No certificates found in PEM file".to_string(),
        ));
    }

    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::ca::create_root_ca;
    use crate::config::CaConfig;
    use crate::crypto::keypair::{generate_rsa_keypair, RsaKeypair};

    fn root_pem(keypair: &RsaKeypair, common_name: &str) -> String {
        let config = CaConfig {
            common_name: common_name.to_string(),
            key_bits: 2048,
            validity_days: 30,
            ..CaConfig::default()
        };
        create_root_ca(&config, keypair).unwrap().pem().to_string()
    }

    #[test]
    fn test_load_certificate_from_pem() {
        let keypair = generate_rsa_keypair(2048).unwrap();
        let pem = root_pem(&keypair, "Test");

        let der = load_certificate_from_pem(&pem).unwrap();
        assert!(!der.is_empty());
        assert_eq!(crate::cert::builder::cert_to_pem(&der), pem);
    }

    #[test]
    fn test_load_certificate_from_invalid_pem() {
        let result = load_certificate_from_pem("not a valid pem");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_certificate_rejects_key() {
        let keypair = generate_rsa_keypair(2048).unwrap();
        let key_pem = keypair.to_pkcs8_pem().unwrap();

        let result = load_certificate_from_pem(&key_pem);
        assert!(matches!(result, Err(CaError::PemError(_))));
    }

    #[test]
    fn test_load_certificates_from_pem_multiple() {
        let keypair = generate_rsa_keypair(2048).unwrap();
        let pem1 = root_pem(&keypair, "Test1");
        let pem2 = root_pem(&keypair, "Test2");
        let key_pem = keypair.to_pkcs8_pem().unwrap();

        let combined_pem = format!("{}\n{}{}", pem1, key_pem.as_str(), pem2);
        let certs = load_certificates_from_pem(&combined_pem).unwrap();

        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn test_load_certificates_from_empty_pem() {
        let result = load_certificates_from_pem("");
        assert!(result.is_err());
    }
}
