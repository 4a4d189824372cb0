//! Key material.
//!
//! Only RSA is supported. Keys come from the operating system's CSPRNG and
//! are serialized as PKCS#8.
//!
//! # Example
//!
//! ```rust,no_run
//! use rootca::crypto::keypair::{generate_rsa_keypair, load_rsa_keypair_from_pem};
//!
//! # fn example() -> rootca::error::Result<()> {
//! let keypair = generate_rsa_keypair(2048)?;
//! let pem = keypair.to_pkcs8_pem()?;
//!
//! let loaded = load_rsa_keypair_from_pem(&pem)?;
//! assert_eq!(keypair.public_key(), loaded.public_key());
//! # Ok(())
//! # }
//! ```

pub mod keypair;
