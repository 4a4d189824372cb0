//! Configuration for root CA generation and leaf issuance.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags.

use crate::error::{CaError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default root CA validity: 10 years.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365 * 10;
pub const DEFAULT_KEY_BITS: usize = 4096;
pub const DEFAULT_CERT_FILE_NAME: &str = "ca.crt";
pub const DEFAULT_KEY_FILE_NAME: &str = "ca.key";
pub const DEFAULT_OUTPUT_DIR: &str = ".";

pub const DEFAULT_LEAF_VALIDITY_DAYS: u32 = 365;
pub const DEFAULT_LEAF_KEY_BITS: usize = 2048;
pub const DEFAULT_LEAF_FILE_STEM: &str = "leaf";

/// RSA modulus sizes the certificate signer accepts.
pub const SUPPORTED_KEY_BITS: [usize; 3] = [2048, 3072, 4096];

/// Parameters for the root certificate authority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaConfig {
    /// Common Name (CN) of the CA, e.g. "My Corp Root CA".
    pub common_name: String,

    /// Organization (O). Empty means the attribute is left out.
    pub organization: String,

    pub validity_days: u32,

    /// RSA modulus size in bits.
    pub key_bits: usize,

    pub output_dir: PathBuf,
    pub cert_file_name: String,
    pub key_file_name: String,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            common_name: String::new(),
            organization: String::new(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            key_bits: DEFAULT_KEY_BITS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            cert_file_name: DEFAULT_CERT_FILE_NAME.to_string(),
            key_file_name: DEFAULT_KEY_FILE_NAME.to_string(),
        }
    }
}

impl CaConfig {
    /// Load a configuration from a TOML file. Missing keys take their defaults.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use rootca::config::CaConfig;
    /// use std::path::Path;
    ///
    /// # fn example() -> rootca::error::Result<()> {
    /// let config = CaConfig::from_file(Path::new("ca.toml"))?;
    /// println!("CN = {}", config.common_name);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: CaConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Check that the configuration can produce a usable CA.
    ///
    /// The key size must be one of [`SUPPORTED_KEY_BITS`]; other sizes would
    /// only fail later, after the key has been generated.
    pub fn validate(&self) -> Result<()> {
        validate_common_name(&self.common_name)?;
        validate_validity_days(self.validity_days)?;
        validate_key_bits(self.key_bits)?;

        if self.cert_file_name.trim().is_empty() || self.key_file_name.trim().is_empty() {
            return Err(CaError::ConfigError(
                "Output file names cannot be empty".to_string(),
            ));
        }
        if self.cert_file_name == self.key_file_name {
            return Err(CaError::ConfigError(format!(
                "Certificate and key would both be written to '{}'",
                self.cert_file_name
            )));
        }

        Ok(())
    }

    /// Path of the certificate PEM file.
    pub fn cert_path(&self) -> PathBuf {
        self.output_dir.join(&self.cert_file_name)
    }

    /// Path of the private key PEM file.
    pub fn key_path(&self) -> PathBuf {
        self.output_dir.join(&self.key_file_name)
    }
}

/// Parameters for a leaf certificate signed by the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafConfig {
    pub common_name: String,
    pub organization: String,

    /// Full subject such as "CN=api.example.com,O=Example,C=US". Overrides
    /// the common name and organization in the certificate's subject.
    pub subject: Option<String>,

    /// DNS subject alternative names. When empty, the common name is used.
    pub dns_names: Vec<String>,

    pub ip_addresses: Vec<std::net::IpAddr>,
    pub validity_days: u32,
    pub key_bits: usize,
    pub output_dir: PathBuf,

    /// Output files are `<stem>.crt`, `<stem>.key` and `<stem>-chain.pem`.
    pub file_stem: String,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self {
            common_name: String::new(),
            organization: String::new(),
            subject: None,
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            validity_days: DEFAULT_LEAF_VALIDITY_DAYS,
            key_bits: DEFAULT_LEAF_KEY_BITS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            file_stem: DEFAULT_LEAF_FILE_STEM.to_string(),
        }
    }
}

impl LeafConfig {
    pub fn validate(&self) -> Result<()> {
        validate_common_name(&self.common_name)?;
        validate_validity_days(self.validity_days)?;
        validate_key_bits(self.key_bits)?;

        if self.file_stem.trim().is_empty() {
            return Err(CaError::ConfigError(
                "Output file name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// DNS names to put in the SAN extension.
    pub fn effective_dns_names(&self) -> Vec<String> {
        if self.dns_names.is_empty() && self.ip_addresses.is_empty() {
            vec![self.common_name.clone()]
        } else {
            self.dns_names.clone()
        }
    }

    pub fn cert_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.crt", self.file_stem))
    }

    pub fn key_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.key", self.file_stem))
    }

    pub fn chain_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}-chain.pem", self.file_stem))
    }
}

fn validate_common_name(common_name: &str) -> Result<()> {
    if common_name.trim().is_empty() {
        return Err(CaError::ConfigError(
            "Common Name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_validity_days(days: u32) -> Result<()> {
    if days == 0 {
        return Err(CaError::ConfigError(format!(
            "Validity days must be positive. Got {}",
            days
        )));
    }
    Ok(())
}

fn validate_key_bits(bits: usize) -> Result<()> {
    if !SUPPORTED_KEY_BITS.contains(&bits) {
        return Err(CaError::InvalidKeyError(format!(
            "RSA key size must be 2048, 3072 or 4096 bits, got {}",
            bits
        )));
    }
    if bits == 2048 {
        debug!(bits, "2048-bit keys are the minimum; prefer 4096 for a long-lived root");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> CaConfig {
        CaConfig {
            common_name: "Test Root CA".to_string(),
            ..CaConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = CaConfig::default();
        assert_eq!(config.validity_days, 3650);
        assert_eq!(config.key_bits, 4096);
        assert_eq!(config.cert_path(), PathBuf::from("./ca.crt"));
        assert_eq!(config.key_path(), PathBuf::from("./ca.key"));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_common_name() {
        let config = CaConfig {
            common_name: "   ".to_string(),
            ..CaConfig::default()
        };
        assert!(matches!(config.validate(), Err(CaError::ConfigError(_))));
    }

    #[test]
    fn test_validate_zero_days() {
        let config = CaConfig {
            validity_days: 0,
            ..valid_config()
        };
        assert!(matches!(config.validate(), Err(CaError::ConfigError(_))));
    }

    #[test]
    fn test_validate_key_bits_range() {
        for bits in [1024, 2049, 2056, 2304, 2560, 3000, 3584, 4095, 8192] {
            let config = CaConfig {
                key_bits: bits,
                ..valid_config()
            };
            assert!(matches!(config.validate(), Err(CaError::InvalidKeyError(_))));
        }

        for bits in SUPPORTED_KEY_BITS {
            let config = CaConfig {
                key_bits: bits,
                ..valid_config()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_same_file_names() {
        let config = CaConfig {
            key_file_name: "ca.crt".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CaConfig::from_toml_str(
            r#"
            common_name = "File CA"
            organization = "File Org"
            validity_days = 730
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(config.common_name, "File CA");
        assert_eq!(config.organization, "File Org");
        assert_eq!(config.validity_days, 730);
        assert_eq!(config.key_bits, DEFAULT_KEY_BITS);
        assert_eq!(config.cert_path(), PathBuf::from("out/ca.crt"));
    }

    #[test]
    fn test_from_toml_invalid() {
        let result = CaConfig::from_toml_str("validity_days = \"ten\"");
        assert!(matches!(result, Err(CaError::TomlError(_))));
    }

    #[test]
    fn test_leaf_defaults_and_paths() {
        let leaf = LeafConfig {
            common_name: "example.com".to_string(),
            ..LeafConfig::default()
        };
        assert!(leaf.validate().is_ok());
        assert_eq!(leaf.validity_days, 365);
        assert_eq!(leaf.key_bits, 2048);
        assert_eq!(leaf.cert_path(), PathBuf::from("./leaf.crt"));
        assert_eq!(leaf.key_path(), PathBuf::from("./leaf.key"));
        assert_eq!(leaf.chain_path(), PathBuf::from("./leaf-chain.pem"));
    }

    #[test]
    fn test_leaf_dns_names_fall_back_to_common_name() {
        let mut leaf = LeafConfig {
            common_name: "example.com".to_string(),
            ..LeafConfig::default()
        };
        assert_eq!(leaf.effective_dns_names(), vec!["example.com".to_string()]);

        leaf.dns_names = vec!["www.example.com".to_string()];
        assert_eq!(leaf.effective_dns_names(), vec!["www.example.com".to_string()]);

        leaf.dns_names.clear();
        leaf.ip_addresses = vec!["127.0.0.1".parse().unwrap()];
        assert!(leaf.effective_dns_names().is_empty());
    }
}
