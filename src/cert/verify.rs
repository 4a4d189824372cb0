//! Chain verification.
//!
//! Checks that a root is a well-formed self-signed CA and that a leaf was
//! signed by it. Only sha256WithRSAEncryption signatures are understood.

use crate::cert::inspect::{parse_certificate_der, summarize, CertificateSummary};
use crate::error::{CaError, Result};
use const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION;
use der::Encode;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use x509_cert::Certificate;

/// Extract the RSA public key of a certificate.
pub fn certificate_public_key(cert: &Certificate) -> Result<RsaPublicKey> {
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| CaError::CertificateError(format!("Failed to encode public key: {}", e)))?;

    RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| CaError::InvalidKeyError(format!("Certificate key is not RSA: {}", e)))
}

/// Check the certificate's signature against `issuer_key`.
pub fn verify_signature(cert: &Certificate, issuer_key: &RsaPublicKey) -> Result<()> {
    if cert.signature_algorithm.oid != SHA_256_WITH_RSA_ENCRYPTION {
        return Err(CaError::VerificationError(format!(
            "Unsupported signature algorithm {}",
            cert.signature_algorithm.oid
        )));
    }

    let tbs_der = cert
        .tbs_certificate
        .to_der()
        .map_err(|e| CaError::CertificateError(format!("Failed to encode TBS: {}", e)))?;
    let signature_bytes = cert.signature.as_bytes().ok_or_else(|| {
        CaError::VerificationError("Signature has unused bits".to_string())
    })?;
    let signature = Signature::try_from(signature_bytes)
        .map_err(|e| CaError::VerificationError(format!("Malformed signature: {}", e)))?;

    VerifyingKey::<Sha256>::new(issuer_key.clone())
        .verify(&tbs_der, &signature)
        .map_err(|_| CaError::VerificationError("Signature does not verify".to_string()))
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn check_validity(summary: &CertificateSummary, now: u64) -> Result<()> {
    if now < summary.not_before {
        return Err(CaError::VerificationError(format!(
            "Certificate '{}' is not yet valid",
            summary.subject
        )));
    }
    if now > summary.not_after {
        return Err(CaError::VerificationError(format!(
            "Certificate '{}' has expired",
            summary.subject
        )));
    }
    Ok(())
}

fn check_ca(summary: &CertificateSummary) -> Result<()> {
    if !summary.is_ca {
        return Err(CaError::VerificationError(format!(
            "'{}' is not marked as a CA",
            summary.subject
        )));
    }
    if !summary.key_cert_sign {
        return Err(CaError::VerificationError(format!(
            "'{}' is not allowed to sign certificates",
            summary.subject
        )));
    }
    Ok(())
}

/// Verify a self-signed root CA certificate.
pub fn verify_self_signed(ca_der: &[u8]) -> Result<CertificateSummary> {
    let ca = parse_certificate_der(ca_der)?;
    let summary = summarize(&ca)?;

    if !summary.self_issued {
        return Err(CaError::VerificationError(format!(
            "Issuer '{}' differs from subject '{}'",
            summary.issuer, summary.subject
        )));
    }
    check_ca(&summary)?;

    verify_signature(&ca, &certificate_public_key(&ca)?)?;
    check_validity(&summary, now_unix())?;

    debug!(subject = %summary.subject, "root CA verified");
    Ok(summary)
}

/// Verify `leaf_der` against the root `ca_der`.
///
/// Returns the leaf's summary on success.
pub fn verify_chain(leaf_der: &[u8], ca_der: &[u8]) -> Result<CertificateSummary> {
    let ca_summary = verify_self_signed(ca_der)?;
    let ca = parse_certificate_der(ca_der)?;
    let leaf = parse_certificate_der(leaf_der)?;
    let leaf_summary = summarize(&leaf)?;

    if leaf.tbs_certificate.issuer != ca.tbs_certificate.subject {
        return Err(CaError::VerificationError(format!(
            "Leaf issuer '{}' does not match CA subject '{}'",
            leaf_summary.issuer, ca_summary.subject
        )));
    }

    verify_signature(&leaf, &certificate_public_key(&ca)?)?;
    check_validity(&leaf_summary, now_unix())?;

    if leaf_summary.not_after > ca_summary.not_after {
        return Err(CaError::VerificationError(
            "Leaf outlives the CA that issued it".to_string(),
        ));
    }

    debug!(subject = %leaf_summary.subject, "chain verified");
    Ok(leaf_summary)
}
