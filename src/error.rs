//! Error types for the rootca library.
//!
//! This module defines all error types used throughout the library.
//! All errors implement `std::error::Error` and are designed to provide
//! clear, actionable error messages.

use thiserror::Error;

/// The main error type for rootca operations.
///
/// This enum covers everything that can go wrong while generating keys,
/// building and signing certificates, verifying them and writing them to disk.
#[derive(Error, Debug)]
pub enum CaError {
    /// Cryptographic operation failed
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// Invalid key format, size or content
    #[error("Invalid key: {0}")]
    InvalidKeyError(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Certificate generation error
    #[error("Certificate error: {0}")]
    CertificateError(String),

    /// Certificate or chain failed verification
    #[error("Verification failed: {0}")]
    VerificationError(String),

    /// Invalid input data
    #[error("Parse error: {0}")]
    ParseError(String),

    /// PEM encoding/decoding error
    #[error("PEM error: {0}")]
    PemError(String),

    /// Output file already exists
    #[error("Already exists: {0}")]
    AlreadyExistsError(String),

    /// Storage I/O error
    #[error("Storage I/O error: {0}")]
    StorageError(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// A specialized Result type for rootca operations.
pub type Result<T> = std::result::Result<T, CaError>;
