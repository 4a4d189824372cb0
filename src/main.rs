//! rootca CLI application.
//!
//! This binary generates a self-signed root CA, issues leaf certificates
//! signed by it, and verifies the results.

mod logging;

use clap::{Parser, Subcommand};
use rootca::cert::ca::create_root_ca;
use rootca::cert::inspect::CertificateSummary;
use rootca::cert::leaf::{build_chain_pem, issue_leaf, load_issuer};
use rootca::cert::loader::{load_certificate_from_pem, load_certificates_from_pem};
use rootca::cert::verify::{verify_chain, verify_self_signed};
use rootca::config::{CaConfig, LeafConfig};
use rootca::crypto::keypair::generate_rsa_keypair;
use rootca::error::{CaError, Result};
use rootca::prompt::fill_missing;
use rootca::storage::pem_files::{
    check_not_exists, ensure_output_dir, write_certificate, write_private_key,
};
use std::fs;
use std::io::{self, IsTerminal};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use time::OffsetDateTime;

#[derive(Parser)]
#[command(name = "rootca")]
#[command(about = "Minimal RSA root certificate authority", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a self-signed root CA certificate and private key
    ///
    /// Missing common name and organization are prompted for interactively.
    #[command(after_help = "Example:\n  rootca create --cn \"My Test CA\" --org \"Test Org\" --days 730 --bits 4096 --out ./my_ca")]
    Create {
        /// Common Name (CN) for the CA (e.g., 'My Corp Root CA')
        #[arg(long)]
        cn: Option<String>,

        /// Organization (O) for the CA (e.g., 'My Corp')
        #[arg(long)]
        org: Option<String>,

        /// Validity period in days [default: 3650]
        #[arg(long)]
        days: Option<u32>,

        /// RSA key size in bits: 2048, 3072 or 4096 [default: 4096]
        #[arg(long)]
        bits: Option<usize>,

        /// Directory to save the certificate and key files [default: .]
        #[arg(long)]
        out: Option<PathBuf>,

        /// Filename for the CA certificate PEM file [default: ca.crt]
        #[arg(long)]
        cert_name: Option<String>,

        /// Filename for the CA private key PEM file [default: ca.key]
        #[arg(long)]
        key_name: Option<String>,

        /// TOML file with defaults for the options above
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,
    },

    /// Issue a leaf certificate signed by the root CA
    Issue {
        /// Root CA certificate file
        #[arg(long, default_value = "ca.crt")]
        ca_cert: PathBuf,

        /// Root CA private key file
        #[arg(long, default_value = "ca.key")]
        ca_key: PathBuf,

        /// Common Name (CN) of the leaf, e.g. a host name
        #[arg(long)]
        cn: String,

        /// Organization (O) of the leaf
        #[arg(long)]
        org: Option<String>,

        /// Full subject (e.g., "CN=api.example.com,O=Example,C=US"), overrides --org
        #[arg(long)]
        subject: Option<String>,

        /// DNS subject alternative name (repeatable; defaults to the CN)
        #[arg(long = "dns")]
        dns: Vec<String>,

        /// IP subject alternative name (repeatable)
        #[arg(long = "ip")]
        ip: Vec<IpAddr>,

        /// Validity in days
        #[arg(long, default_value = "365")]
        days: u32,

        /// RSA key size in bits: 2048, 3072 or 4096
        #[arg(long, default_value = "2048")]
        bits: usize,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Output file stem: <name>.crt, <name>.key, <name>-chain.pem
        #[arg(long, default_value = "leaf")]
        name: String,

        /// Also write a chain file (leaf followed by the root)
        #[arg(long)]
        chain: bool,

        /// Overwrite existing output files
        #[arg(long)]
        force: bool,
    },

    /// Verify the root CA, or a certificate (chain) against it
    Verify {
        /// Root CA certificate file
        #[arg(long, default_value = "ca.crt")]
        ca_cert: PathBuf,

        /// Certificate to verify; the first certificate in the file is used
        #[arg(long)]
        cert: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Commands::Create {
            cn,
            org,
            days,
            bits,
            out,
            cert_name,
            key_name,
            config,
            force,
        } => {
            let mut ca_config = match config {
                Some(path) => CaConfig::from_file(&path)?,
                None => CaConfig::default(),
            };
            if let Some(cn) = cn {
                ca_config.common_name = cn;
            }
            // `--org ""` means no organization, without prompting.
            let prompt_organization = org.is_none() && io::stdin().is_terminal();
            if let Some(org) = org {
                ca_config.organization = org;
            }
            if let Some(days) = days {
                ca_config.validity_days = days;
            }
            if let Some(bits) = bits {
                ca_config.key_bits = bits;
            }
            if let Some(out) = out {
                ca_config.output_dir = out;
            }
            if let Some(cert_name) = cert_name {
                ca_config.cert_file_name = cert_name;
            }
            if let Some(key_name) = key_name {
                ca_config.key_file_name = key_name;
            }

            handle_create_command(ca_config, prompt_organization, force)
        }

        Commands::Issue {
            ca_cert,
            ca_key,
            cn,
            org,
            subject,
            dns,
            ip,
            days,
            bits,
            out,
            name,
            chain,
            force,
        } => {
            let leaf_config = LeafConfig {
                common_name: cn,
                organization: org.unwrap_or_default(),
                subject,
                dns_names: dns,
                ip_addresses: ip,
                validity_days: days,
                key_bits: bits,
                output_dir: out,
                file_stem: name,
            };
            handle_issue_command(&ca_cert, &ca_key, leaf_config, chain, force)
        }

        Commands::Verify { ca_cert, cert } => handle_verify_command(&ca_cert, cert.as_deref()),
    }
}

fn handle_create_command(
    mut config: CaConfig,
    prompt_organization: bool,
    force: bool,
) -> Result<()> {
    println!("Minimal Root Certificate Authority Generator");
    println!("{}", "-".repeat(44));

    {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        let mut stdout = io::stdout();
        fill_missing(&mut config, prompt_organization, &mut reader, &mut stdout)?;
    }
    config.validate()?;

    let cert_path = config.cert_path();
    let key_path = config.key_path();
    check_not_exists(&[cert_path.clone(), key_path.clone()], force)?;
    ensure_output_dir(&config.output_dir)?;

    println!("\nGenerating Root CA...");
    println!("  Common Name: {}", config.common_name);
    if !config.organization.is_empty() {
        println!("  Organization: {}", config.organization);
    }
    println!("  Validity: {} days", config.validity_days);
    println!("  Key Size: {} bits", config.key_bits);
    println!("  Output Cert: {}", cert_path.display());
    println!("  Output Key: {}", key_path.display());

    let keypair = generate_rsa_keypair(config.key_bits)?;
    let root = create_root_ca(&config, &keypair)?;

    write_certificate(&cert_path, root.pem())?;
    write_private_key(&key_path, &keypair.to_pkcs8_pem()?)?;

    println!("\n✓ Created Root CA certificate: {}", cert_path.display());
    println!("  Serial: {}", root.serial_hex());
    println!("  SHA-256 Fingerprint: {}", root.fingerprint());
    println!(
        "✓ Saved CA private key: {} (Keep this file secure!)",
        key_path.display()
    );

    Ok(())
}

fn handle_issue_command(
    ca_cert: &Path,
    ca_key: &Path,
    config: LeafConfig,
    chain: bool,
    force: bool,
) -> Result<()> {
    config.validate()?;

    let mut outputs = vec![config.cert_path(), config.key_path()];
    if chain {
        outputs.push(config.chain_path());
    }
    check_not_exists(&outputs, force)?;

    let issuer = load_issuer(&fs::read_to_string(ca_cert)?, &fs::read_to_string(ca_key)?)?;

    ensure_output_dir(&config.output_dir)?;
    let keypair = generate_rsa_keypair(config.key_bits)?;
    let leaf = issue_leaf(&issuer, &config, &keypair)?;

    write_certificate(&config.cert_path(), leaf.pem())?;
    write_private_key(&config.key_path(), &keypair.to_pkcs8_pem()?)?;

    println!("✓ Created certificate: {}", config.cert_path().display());
    println!("  Subject: {}", leaf.subject());
    println!("  Signed by: {} ({})", issuer.summary().subject, ca_cert.display());
    println!("  Valid for: {} days", config.validity_days);
    println!("  Serial: {}", leaf.serial_hex());
    println!("  SHA-256 Fingerprint: {}", leaf.fingerprint());
    println!("✓ Saved private key: {}", config.key_path().display());

    if chain {
        let chain_pem = build_chain_pem(leaf.pem(), issuer.pem());
        write_certificate(&config.chain_path(), &chain_pem)?;
        println!("✓ Saved chain: {}", config.chain_path().display());
    }

    Ok(())
}

fn handle_verify_command(ca_cert: &Path, cert: Option<&Path>) -> Result<()> {
    let ca_der = load_certificate_from_pem(&fs::read_to_string(ca_cert)?)?;

    match cert {
        None => {
            let summary = verify_self_signed(&ca_der)?;
            println!("✓ {}: OK (self-signed root CA)", ca_cert.display());
            print_summary(&summary);
        }
        Some(cert_path) => {
            let certs = load_certificates_from_pem(&fs::read_to_string(cert_path)?)?;
            let leaf_der = certs.first().ok_or_else(|| {
                CaError::PemError(format!("No certificate in {}", cert_path.display()))
            })?;
            let summary = verify_chain(leaf_der, &ca_der)?;
            println!("✓ {}: OK (signed by {})", cert_path.display(), ca_cert.display());
            print_summary(&summary);
        }
    }

    Ok(())
}

fn print_summary(summary: &CertificateSummary) {
    println!("  Subject: {}", summary.subject);
    println!("  Issuer: {}", summary.issuer);
    println!("  Serial: {}", summary.serial_hex);
    println!("  Not Before: {}", format_unix(summary.not_before));
    println!("  Not After: {}", format_unix(summary.not_after));
    match (summary.is_ca, summary.path_len) {
        (true, Some(path_len)) => println!("  CA: yes (max path length {})", path_len),
        (true, None) => println!("  CA: yes"),
        (false, _) => println!("  CA: no"),
    }
}

fn format_unix(secs: u64) -> String {
    let time: OffsetDateTime = (UNIX_EPOCH + Duration::from_secs(secs)).into();
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
        time.year(),
        u8::from(time.month()),
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}
