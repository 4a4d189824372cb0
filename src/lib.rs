//! rootca: a minimal RSA root certificate authority.
//!
//! This library generates a self-signed X.509 root CA and writes it to disk
//! as PEM. It can also:
//!
//! - Issue leaf certificates signed by that root
//! - Verify a root, or a leaf against its root
//! - Load CA parameters from a TOML file
//!
//! # Architecture
//!
//! Operations are plain functions composed from smaller, testable pieces.
//! All of them return [`Result`]; nothing in the library panics on bad input.
//!
//! # Example
//!
//! ```rust,no_run
//! use rootca::cert::ca::create_root_ca;
//! use rootca::config::CaConfig;
//! use rootca::crypto::keypair::generate_rsa_keypair;
//! use rootca::error::Result;
//!
//! fn example() -> Result<()> {
//!     let config = CaConfig {
//!         common_name: "My Dev Root CA".to_string(),
//!         ..CaConfig::default()
//!     };
//!     let keypair = generate_rsa_keypair(config.key_bits)?;
//!     let root = create_root_ca(&config, &keypair)?;
//!     println!("SHA-256 fingerprint: {}", root.fingerprint());
//!     Ok(())
//! }
//! ```

pub mod cert;
pub mod config;
pub mod crypto;
pub mod error;
pub mod prompt;
pub mod storage;

// Re-export commonly used types
pub use error::{CaError, Result};
