use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keyexport::crypto::hybrid::EciesP256Encrypter;
use keyexport::keystore::{FileKeystore, KeystoreKey};
use keyexport::pipeline::{EncryptionMode, ExportPipeline, ExportRequest};

#[derive(Parser)]
#[command(name = "keyexport")]
#[command(about = "Exports a private key from a keystore, encrypted for secure transfer")]
#[command(version)]
struct Cli {
    /// Keystore directory holding the key to export
    #[arg(long)]
    keystore: PathBuf,

    /// Alias of the key to export
    #[arg(long)]
    alias: String,

    /// Output path; must not exist yet
    #[arg(long)]
    output: PathBuf,

    /// Use CKM_RSA_AES_KEY_WRAP instead of hybrid EC encryption
    #[arg(long)]
    rsa_aes_encryption: bool,

    /// RSA wrapping public key file (SPKI, PEM or DER); required with
    /// --rsa-aes-encryption
    #[arg(long)]
    encryption_key_path: Option<PathBuf>,

    /// Hex-encoded recipient public key for hybrid EC encryption
    #[arg(long)]
    encryption_key: Option<String>,

    /// Keystore directory holding the signing key
    #[arg(long)]
    signing_keystore: Option<PathBuf>,

    /// Alias of the signing key
    #[arg(long, requires = "signing_keystore")]
    signing_key_alias: Option<String>,

    /// Keystore password
    #[arg(long)]
    keystore_pass: Option<String>,

    /// Key password, defaulting to the keystore password
    #[arg(long)]
    key_pass: Option<String>,

    /// Include the certificate in the output even when not signing
    #[arg(long)]
    include_cert: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mode = if cli.rsa_aes_encryption {
        let path = cli
            .encryption_key_path
            .context("--encryption-key-path is required with --rsa-aes-encryption")?;
        let wrapping_key = std::fs::read(&path)
            .with_context(|| format!("reading wrapping key {}", path.display()))?;
        EncryptionMode::RsaAesKeyWrap { wrapping_key }
    } else {
        let recipient_key_hex = cli
            .encryption_key
            .context("--encryption-key is required unless --rsa-aes-encryption is set")?;
        EncryptionMode::HybridEc { recipient_key_hex }
    };

    let signing_key = match (cli.signing_keystore, cli.signing_key_alias) {
        (Some(path), Some(alias)) => Some(KeystoreKey::new(path, alias)),
        (None, None) => None,
        _ => bail!("--signing-keystore and --signing-key-alias must be used together"),
    };

    let request = ExportRequest {
        key_to_export: KeystoreKey::with_passwords(
            cli.keystore,
            cli.alias,
            cli.keystore_pass,
            cli.key_pass,
        ),
        mode,
        signing_key,
        include_certificate: cli.include_cert,
        output: cli.output,
    };

    ExportPipeline::new(&FileKeystore, &EciesP256Encrypter)
        .run(&request)
        .context("Unable to export or encrypt the private key")?;
    Ok(())
}
