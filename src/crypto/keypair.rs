//! RSA key operations.
//!
//! This module generates RSA keypairs, serializes them as PKCS#8 and hands
//! them to the certificate signer.

use crate::error::{CaError, Result};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::der::zeroize::Zeroizing;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use rustls_pemfile::Item;
use std::io::Cursor;
use tracing::debug;

/// An RSA private key together with its public half.
#[derive(Debug, Clone)]
pub struct RsaKeypair {
    secret: RsaPrivateKey,
}

impl RsaKeypair {
    /// Wrap an existing private key.
    pub fn from_secret(secret: RsaPrivateKey) -> Self {
        Self { secret }
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.secret.size() * 8
    }

    pub fn public_key(&self) -> RsaPublicKey {
        self.secret.to_public_key()
    }

    pub fn secret(&self) -> &RsaPrivateKey {
        &self.secret
    }

    /// Encode the private key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let document = self.secret.to_pkcs8_der().map_err(|e| {
            CaError::CryptoError(format!("Failed to marshal private key to PKCS#8: {}", e))
        })?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    /// Encode the private key as a PKCS#8 `PRIVATE KEY` PEM block.
    pub fn to_pkcs8_pem(&self) -> Result<Zeroizing<String>> {
        self.secret.to_pkcs8_pem(LineEnding::LF).map_err(|e| {
            CaError::PemError(format!("Failed to encode private key to PEM: {}", e))
        })
    }

    /// Convert to an rcgen KeyPair usable as a certificate signer.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rootca::crypto::keypair::generate_rsa_keypair;
    ///
    /// let keypair = generate_rsa_keypair(2048).unwrap();
    /// let rcgen_keypair = keypair.to_rcgen().unwrap();
    /// ```
    pub fn to_rcgen(&self) -> Result<rcgen::KeyPair> {
        let der = self.to_pkcs8_der()?;
        rcgen::KeyPair::try_from(der.as_slice())
            .map_err(|e| CaError::CryptoError(format!("Failed to convert keypair: {}", e)))
    }
}

/// Generate a new RSA keypair from the operating system's CSPRNG.
///
/// # Example
///
/// ```no_run
/// use rootca::crypto::keypair::generate_rsa_keypair;
///
/// let keypair = generate_rsa_keypair(2048).unwrap();
/// assert_eq!(keypair.bits(), 2048);
/// ```
pub fn generate_rsa_keypair(bits: usize) -> Result<RsaKeypair> {
    debug!(bits, "generating RSA private key");
    let secret = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CaError::CryptoError(format!("Failed to generate RSA key: {}", e)))?;
    Ok(RsaKeypair::from_secret(secret))
}

/// Load an RSA keypair from PEM.
///
/// Both PKCS#8 (`PRIVATE KEY`) and PKCS#1 (`RSA PRIVATE KEY`) blocks are
/// accepted; the first key in the input is used.
pub fn load_rsa_keypair_from_pem(pem_str: &str) -> Result<RsaKeypair> {
    let mut cursor = Cursor::new(pem_str.as_bytes());

    loop {
        let item = rustls_pemfile::read_one(&mut cursor)
            .map_err(|e| CaError::PemError(format!("Failed to read PEM: {}", e)))?;

        let secret = match item {
            Some(Item::Pkcs8Key(key)) => RsaPrivateKey::from_pkcs8_der(key.secret_pkcs8_der())
                .map_err(|e| CaError::InvalidKeyError(format!("Not an RSA PKCS#8 key: {}", e)))?,
            Some(Item::Pkcs1Key(key)) => RsaPrivateKey::from_pkcs1_der(key.secret_pkcs1_der())
                .map_err(|e| CaError::InvalidKeyError(format!("Invalid PKCS#1 key: {}", e)))?,
            Some(Item::Sec1Key(_)) => {
                return Err(CaError::InvalidKeyError(
                    "EC keys are not supported, expected an RSA key".to_string(),
                ))
            }
            Some(_) => continue,
            None => {
                return Err(CaError::PemError(
                    "PEM input does not contain a private key".to_string(),
                ))
            }
        };

        return Ok(RsaKeypair::from_secret(secret));
    }
}
