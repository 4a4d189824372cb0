//! Interactive prompts for values missing from the command line.

use crate::config::CaConfig;
use crate::error::{CaError, Result};
use std::io::{BufRead, Write};

/// Print `text`, read one line and return it trimmed.
///
/// An empty answer (or end of input) yields `default`.
pub fn prompt_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    text: &str,
    default: &str,
) -> Result<String> {
    write!(writer, "{}", text)?;
    writer.flush()?;

    let mut input = String::new();
    reader.read_line(&mut input)?;

    let input = input.trim();
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.to_string())
    }
}

/// Ask for the common name and organization when they are missing.
///
/// The common name is required. The organization is optional (Enter skips)
/// and is only asked for when `prompt_organization` is set.
pub fn fill_missing<R: BufRead, W: Write>(
    config: &mut CaConfig,
    prompt_organization: bool,
    reader: &mut R,
    writer: &mut W,
) -> Result<()> {
    if config.common_name.trim().is_empty() {
        config.common_name = prompt_line(
            reader,
            writer,
            "Enter Common Name (CN) for the CA (e.g., 'My Dev Root CA'): ",
            "",
        )?;
        if config.common_name.is_empty() {
            return Err(CaError::ConfigError(
                "Common Name cannot be empty".to_string(),
            ));
        }
    }

    if prompt_organization && config.organization.is_empty() {
        config.organization = prompt_line(
            reader,
            writer,
            "Enter Organization (O) (optional, press Enter to skip): ",
            "",
        )?;
    }

    Ok(())
}
