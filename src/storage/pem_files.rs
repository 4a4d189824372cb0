//! Flat-file output for certificates and keys.
//!
//! Certificates are world-readable; private keys are created owner-only.

use crate::error::{CaError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Permissions for certificate files.
pub const CERT_FILE_MODE: u32 = 0o644;
/// Permissions for private key files.
pub const KEY_FILE_MODE: u32 = 0o600;
/// Permissions for created output directories.
pub const DIR_MODE: u32 = 0o755;

/// Create the output directory (and parents) if needed.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }

    debug!(dir = %dir.display(), "creating output directory");
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(dir)
        .map_err(|e| with_context(e, format!("Error creating output directory {:?}", dir)))
}

fn with_context(error: std::io::Error, context: String) -> CaError {
    CaError::StorageError(std::io::Error::new(
        error.kind(),
        format!("{}: {}", context, error),
    ))
}

/// Fail if any of `paths` exists, unless `force` is set.
pub fn check_not_exists(paths: &[PathBuf], force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    match paths.iter().find(|path| path.exists()) {
        Some(path) => Err(CaError::AlreadyExistsError(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))),
        None => Ok(()),
    }
}

fn write_with_mode(path: &Path, contents: &[u8], mode: u32) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options.open(path)?;

    // `mode` only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Write a certificate PEM file with mode 0644.
pub fn write_certificate(path: &Path, pem: &str) -> Result<()> {
    debug!(path = %path.display(), "writing certificate");
    write_with_mode(path, pem.as_bytes(), CERT_FILE_MODE).map_err(|e| {
        with_context(e, format!("Failed to write certificate PEM file {:?}", path))
    })
}

/// Write a private key PEM file with mode 0600.
pub fn write_private_key(path: &Path, pem: &str) -> Result<()> {
    debug!(path = %path.display(), "writing private key");
    write_with_mode(path, pem.as_bytes(), KEY_FILE_MODE).map_err(|e| {
        with_context(e, format!("Failed to write private key PEM file {:?}", path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_output_dir_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Existing directories are fine.
        ensure_output_dir(&nested).unwrap();
    }

    #[test]
    fn test_check_not_exists() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("ca.crt");
        let missing = temp_dir.path().join("ca.key");
        fs::write(&existing, "x").unwrap();

        assert!(check_not_exists(&[missing.clone()], false).is_ok());
        assert!(matches!(
            check_not_exists(&[missing.clone(), existing.clone()], false),
            Err(CaError::AlreadyExistsError(_))
        ));
        assert!(check_not_exists(&[missing, existing], true).is_ok());
    }

    #[test]
    fn test_write_and_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ca.crt");

        write_certificate(&path, "first contents").unwrap();
        write_certificate(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_modes() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let cert_path = temp_dir.path().join("ca.crt");
        let key_path = temp_dir.path().join("ca.key");

        write_certificate(&cert_path, "cert").unwrap();
        write_private_key(&key_path, "key").unwrap();

        let cert_mode = fs::metadata(&cert_path).unwrap().permissions().mode() & 0o777;
        let key_mode = fs::metadata(&key_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(cert_mode, 0o644);
        assert_eq!(key_mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_key_mode_tightened_on_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let key_path = temp_dir.path().join("ca.key");
        fs::write(&key_path, "old").unwrap();
        fs::set_permissions(&key_path, fs::Permissions::from_mode(0o644)).unwrap();

        write_private_key(&key_path, "new").unwrap();

        let mode = fs::metadata(&key_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
