//! Leaf certificate issuance.
//!
//! Leaves are signed directly by the root loaded from its PEM files.

use crate::cert::builder::{
    build_distinguished_name, cert_to_pem, generate_serial_number, parse_subject, set_validity,
    sha256_fingerprint,
};
use crate::cert::inspect::{parse_certificate_der, summarize, CertificateSummary};
use crate::cert::loader::load_certificate_from_pem;
use crate::cert::verify::certificate_public_key;
use crate::config::LeafConfig;
use crate::crypto::keypair::{load_rsa_keypair_from_pem, RsaKeypair};
use crate::error::{CaError, Result};
use rcgen::{Certificate, CertificateParams, IsCa, SanType};
use time::OffsetDateTime;
use tracing::{info, warn};

/// A CA certificate and its key, ready to sign leaves.
pub struct Issuer {
    cert: Certificate,
    pem: String,
    summary: CertificateSummary,
}

impl Issuer {
    /// The issuer certificate as PEM.
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn summary(&self) -> &CertificateSummary {
        &self.summary
    }
}

/// A signed leaf certificate.
#[derive(Debug, Clone)]
pub struct IssuedLeaf {
    der: Vec<u8>,
    pem: String,
    serial_hex: String,
    subject: String,
}

impl IssuedLeaf {
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn serial_hex(&self) -> &str {
        &self.serial_hex
    }

    /// Subject as encoded in the signed certificate.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn fingerprint(&self) -> String {
        sha256_fingerprint(&self.der)
    }
}

/// Load the CA certificate and key that will sign leaves.
///
/// The certificate must be a CA allowed to sign certificates, and the key
/// must belong to it.
pub fn load_issuer(ca_cert_pem: &str, ca_key_pem: &str) -> Result<Issuer> {
    let ca_der = load_certificate_from_pem(ca_cert_pem)?;
    let ca = parse_certificate_der(&ca_der)?;
    let summary = summarize(&ca)?;

    if !summary.is_ca || !summary.key_cert_sign {
        return Err(CaError::CertificateError(format!(
            "'{}' is not a CA that may sign certificates",
            summary.subject
        )));
    }

    let keypair = load_rsa_keypair_from_pem(ca_key_pem)?;
    if certificate_public_key(&ca)? != keypair.public_key() {
        return Err(CaError::InvalidKeyError(
            "CA private key does not match the CA certificate".to_string(),
        ));
    }

    let params = CertificateParams::from_ca_cert_der(&ca_der, keypair.to_rcgen()?)
        .map_err(|e| CaError::CertificateError(format!("Failed to load CA certificate: {}", e)))?;
    let cert = Certificate::from_params(params)
        .map_err(|e| CaError::CertificateError(format!("Failed to load CA certificate: {}", e)))?;

    Ok(Issuer {
        cert,
        pem: cert_to_pem(&ca_der),
        summary,
    })
}

/// Build the leaf certificate template.
///
/// The validity never extends past `issuer_not_after` (Unix seconds).
pub fn leaf_params(
    config: &LeafConfig,
    keypair: &RsaKeypair,
    issuer_not_after: u64,
) -> Result<(CertificateParams, String)> {
    let (serial, serial_hex) = generate_serial_number();

    let mut params = CertificateParams::default();
    params.alg = &rcgen::PKCS_RSA_SHA256;
    params.serial_number = Some(serial);
    params.distinguished_name = match &config.subject {
        Some(subject) => parse_subject(subject)?,
        None => build_distinguished_name(&config.common_name, &config.organization),
    };
    params.is_ca = IsCa::ExplicitNoCa;
    params.key_usages = vec![
        rcgen::KeyUsagePurpose::DigitalSignature,
        rcgen::KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![
        rcgen::ExtendedKeyUsagePurpose::ServerAuth,
        rcgen::ExtendedKeyUsagePurpose::ClientAuth,
    ];

    let mut subject_alt_names: Vec<SanType> = config
        .effective_dns_names()
        .into_iter()
        .map(SanType::DnsName)
        .collect();
    subject_alt_names.extend(config.ip_addresses.iter().copied().map(SanType::IpAddress));
    params.subject_alt_names = subject_alt_names;
    params.use_authority_key_identifier_extension = true;

    set_validity(&mut params, config.validity_days)?;

    let limit = i64::try_from(issuer_not_after)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .ok_or_else(|| CaError::CertificateError("Issuer expiry is out of range".to_string()))?;
    if params.not_before >= limit {
        return Err(CaError::CertificateError(
            "The CA certificate has expired".to_string(),
        ));
    }
    if params.not_after > limit {
        warn!(
            requested_days = config.validity_days,
            "leaf validity clamped to the CA's expiry"
        );
        params.not_after = limit;
    }

    params.key_pair = Some(keypair.to_rcgen()?);

    Ok((params, serial_hex))
}

/// Issue a leaf certificate for `keypair`, signed by `issuer`.
///
/// # Example
///
/// ```rust,no_run
/// use rootca::cert::leaf::{issue_leaf, load_issuer};
/// use rootca::config::LeafConfig;
/// use rootca::crypto::keypair::generate_rsa_keypair;
///
/// # fn example() -> rootca::error::Result<()> {
/// let issuer = load_issuer(
///     &std::fs::read_to_string("ca.crt")?,
///     &std::fs::read_to_string("ca.key")?,
/// )?;
/// let config = LeafConfig {
///     common_name: "localhost".to_string(),
///     ..LeafConfig::default()
/// };
/// let keypair = generate_rsa_keypair(config.key_bits)?;
/// let leaf = issue_leaf(&issuer, &config, &keypair)?;
/// assert!(leaf.pem().contains("BEGIN CERTIFICATE"));
/// # Ok(())
/// # }
/// ```
pub fn issue_leaf(issuer: &Issuer, config: &LeafConfig, keypair: &RsaKeypair) -> Result<IssuedLeaf> {
    config.validate()?;

    let (params, serial_hex) = leaf_params(config, keypair, issuer.summary.not_after)?;

    info!(common_name = %config.common_name, issuer = %issuer.summary.subject, "signing leaf certificate");
    let cert = Certificate::from_params(params).map_err(|e| {
        CaError::CertificateError(format!("Failed to create leaf certificate: {}", e))
    })?;
    let der = cert
        .serialize_der_with_signer(&issuer.cert)
        .map_err(|e| CaError::CertificateError(format!("Failed to sign leaf certificate: {}", e)))?;

    let parsed = parse_certificate_der(&der).map_err(|e| {
        CaError::CertificateError(format!("Failed to parse generated certificate: {}", e))
    })?;

    Ok(IssuedLeaf {
        pem: cert_to_pem(&der),
        der,
        serial_hex,
        subject: parsed.tbs_certificate.subject.to_string(),
    })
}

/// Concatenate a leaf and its root into a chain file, leaf first.
pub fn build_chain_pem(leaf_pem: &str, ca_pem: &str) -> String {
    let mut chain = String::with_capacity(leaf_pem.len() + ca_pem.len() + 1);
    chain.push_str(leaf_pem);
    if !leaf_pem.ends_with('\n') {
        chain.push('\n');
    }
    chain.push_str(ca_pem);
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::ca::create_root_ca;
    use crate::cert::inspect::parse_certificate_pem;
    use crate::cert::verify::verify_chain;
    use crate::config::CaConfig;
    use crate::crypto::keypair::generate_rsa_keypair;

    fn test_issuer(validity_days: u32) -> Issuer {
        let config = CaConfig {
            common_name: "Leaf Test Root".to_string(),
            organization: "Leaf Test Org".to_string(),
            key_bits: 2048,
            validity_days,
            ..CaConfig::default()
        };
        let keypair = generate_rsa_keypair(2048).unwrap();
        let root = create_root_ca(&config, &keypair).unwrap();
        load_issuer(root.pem(), &keypair.to_pkcs8_pem().unwrap()).unwrap()
    }

    fn leaf_config(common_name: &str) -> LeafConfig {
        LeafConfig {
            common_name: common_name.to_string(),
            ..LeafConfig::default()
        }
    }

    #[test]
    fn test_issue_leaf_chains_to_root() {
        let issuer = test_issuer(365);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let leaf = issue_leaf(&issuer, &leaf_config("example.com"), &keypair).unwrap();

        let root_der = load_certificate_from_pem(issuer.pem()).unwrap();
        let summary = verify_chain(leaf.der(), &root_der).unwrap();

        assert!(!summary.is_ca);
        assert_eq!(summary.subject, "CN=example.com");
        assert_eq!(summary.issuer, issuer.summary().subject);
        assert_eq!(summary.serial_hex, leaf.serial_hex());
    }

    #[test]
    fn test_issue_leaf_with_full_subject() {
        let issuer = test_issuer(365);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let config = LeafConfig {
            subject: Some("CN=api.example.com,O=Example,C=US".to_string()),
            ..leaf_config("api.example.com")
        };

        let leaf = issue_leaf(&issuer, &config, &keypair).unwrap();
        let summary = summarize(&parse_certificate_pem(leaf.pem()).unwrap()).unwrap();

        assert!(summary.subject.contains("C=US"));
        assert!(summary.subject.contains("O=Example"));
        assert_eq!(leaf.subject(), summary.subject);
    }

    #[test]
    fn test_issued_subject_reflects_full_subject() {
        let issuer = test_issuer(365);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let config = LeafConfig {
            subject: Some("O=NoCn".to_string()),
            ..leaf_config("h.local")
        };

        let leaf = issue_leaf(&issuer, &config, &keypair).unwrap();
        assert_eq!(leaf.subject(), "O=NoCn");
    }

    #[test]
    fn test_leaf_authority_key_identifier_matches_root() {
        use const_oid::AssociatedOid;
        use der::Decode;
        use x509_cert::ext::pkix::{AuthorityKeyIdentifier, SubjectKeyIdentifier};

        let issuer = test_issuer(365);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let leaf = issue_leaf(&issuer, &leaf_config("example.com"), &keypair).unwrap();

        let root = parse_certificate_pem(issuer.pem()).unwrap();
        let root_ski = root
            .tbs_certificate
            .extensions
            .as_ref()
            .and_then(|exts| exts.iter().find(|e| e.extn_id == SubjectKeyIdentifier::OID))
            .map(|e| SubjectKeyIdentifier::from_der(e.extn_value.as_bytes()).unwrap())
            .expect("root has a subject key identifier");

        let cert = parse_certificate_der(leaf.der()).unwrap();
        let aki = cert
            .tbs_certificate
            .extensions
            .as_ref()
            .and_then(|exts| exts.iter().find(|e| e.extn_id == AuthorityKeyIdentifier::OID))
            .map(|e| AuthorityKeyIdentifier::from_der(e.extn_value.as_bytes()).unwrap())
            .expect("leaf has an authority key identifier");

        assert_eq!(aki.key_identifier, Some(root_ski.0));
    }

    #[test]
    fn test_leaf_validity_clamped_to_issuer() {
        let issuer = test_issuer(30);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let leaf = issue_leaf(&issuer, &leaf_config("example.com"), &keypair).unwrap();

        let summary = summarize(&parse_certificate_pem(leaf.pem()).unwrap()).unwrap();
        assert_eq!(summary.not_after, issuer.summary().not_after);
    }

    #[test]
    fn test_leaf_params_san_and_usage() {
        let keypair = generate_rsa_keypair(2048).unwrap();
        let config = LeafConfig {
            dns_names: vec!["a.example.com".to_string(), "b.example.com".to_string()],
            ip_addresses: vec!["127.0.0.1".parse().unwrap()],
            ..leaf_config("example.com")
        };

        let (params, _) = leaf_params(&config, &keypair, u32::MAX as u64).unwrap();

        assert_eq!(params.subject_alt_names.len(), 3);
        assert!(params
            .subject_alt_names
            .contains(&SanType::DnsName("a.example.com".to_string())));
        assert!(matches!(params.is_ca, IsCa::ExplicitNoCa));
        assert_eq!(params.extended_key_usages.len(), 2);
    }

    #[test]
    fn test_leaf_params_rejects_expired_issuer() {
        let keypair = generate_rsa_keypair(2048).unwrap();
        let result = leaf_params(&leaf_config("example.com"), &keypair, 1);
        assert!(matches!(result, Err(CaError::CertificateError(_))));
    }

    #[test]
    fn test_load_issuer_rejects_wrong_key() {
        let config = CaConfig {
            common_name: "Mismatch Root".to_string(),
            key_bits: 2048,
            ..CaConfig::default()
        };
        let keypair = generate_rsa_keypair(2048).unwrap();
        let other = generate_rsa_keypair(2048).unwrap();
        let root = create_root_ca(&config, &keypair).unwrap();

        let result = load_issuer(root.pem(), &other.to_pkcs8_pem().unwrap());
        assert!(matches!(result, Err(CaError::InvalidKeyError(_))));
    }

    #[test]
    fn test_load_issuer_rejects_leaf_as_ca() {
        let issuer = test_issuer(365);
        let keypair = generate_rsa_keypair(2048).unwrap();
        let leaf = issue_leaf(&issuer, &leaf_config("example.com"), &keypair).unwrap();

        let result = load_issuer(leaf.pem(), &keypair.to_pkcs8_pem().unwrap());
        assert!(matches!(result, Err(CaError::CertificateError(_))));
    }

    #[test]
    fn test_build_chain_pem() {
        let chain = build_chain_pem("LEAF", "ROOT\n");
        assert_eq!(chain, "LEAF\nROOT\n");
    }
}
