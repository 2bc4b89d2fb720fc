//! Ascension security operator tool
//!
//! Offline key management and license issuance, plus local license
//! management against the same storage the plugin uses.
//!
//! Usage:
//!   ascension keygen --out signing.key
//!   ascension issue --key signing.key --subject Valkyrie --expires +30d
//!   ascension apply <license>
//!   ascension watch

use anyhow::{bail, Context, Result};
use ascension_cli::{load_issuer, to_pretty_json, write_secret_key, IssueRequest};
use ascension_core::{SecurityConfig, SecurityCore, SecurityMonitors};
use ascension_license::{DeviceFingerprint, LicenseIssuer};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "ascension")]
#[command(about = "Ascension license and pairing tool")]
struct Args {
    /// Path to security.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new signing key pair
    Keygen {
        /// Write the secret key here instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Sign a license offline
    Issue {
        /// Signing key file written by `keygen`
        #[arg(short, long)]
        key: PathBuf,

        /// Bound identity (character name)
        #[arg(short, long)]
        subject: Option<String>,

        /// RFC 3339, YYYY-MM-DD, or +30d / +12h / +45m
        #[arg(short, long)]
        expires: String,

        /// Enabled feature; repeat or comma-separate. Defaults to all.
        #[arg(short, long = "feature")]
        features: Vec<String>,

        /// Grace period after expiry, in seconds
        #[arg(short, long, default_value = "0")]
        grace: u64,

        /// Device fingerprint to bind to
        #[arg(short, long)]
        device: Option<String>,

        /// Issuer name to embed
        #[arg(long)]
        issuer: Option<String>,
    },

    /// Print this device's fingerprint
    Fingerprint,

    /// Verify and store a license (reads stdin when omitted)
    Apply { license: Option<String> },

    /// Show the stored license status
    Status,

    /// Re-verify the stored license
    Reload,

    /// Remove the stored license
    Clear,

    /// Run the monitors and show the rolling pairing code
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Keygen { out } => keygen(out),
        Command::Issue {
            key,
            subject,
            expires,
            features,
            grace,
            device,
            issuer,
        } => {
            let request = IssueRequest {
                subject,
                expires,
                features,
                grace_secs: grace,
                device,
                issuer,
            };
            issue(&key, &request)
        }
        Command::Fingerprint => {
            let device = DeviceFingerprint::generate();
            if device.is_unknown() {
                bail!("device fingerprint unavailable on this machine");
            }
            println!("{device}");
            Ok(())
        }
        Command::Apply { license } => {
            let core = build_core(args.config)?;
            let wire = match license {
                Some(text) => text,
                None => read_stdin()?,
            };
            let response = core.apply_license(&wire);
            println!("{}", to_pretty_json(&response)?);
            if !response.ok {
                bail!("license rejected");
            }
            Ok(())
        }
        Command::Status => {
            let core = build_core(args.config)?;
            core.startup();
            println!("{}", to_pretty_json(&core.license_status())?);
            Ok(())
        }
        Command::Reload => {
            let core = build_core(args.config)?;
            println!("{}", to_pretty_json(&core.reload_license())?);
            Ok(())
        }
        Command::Clear => {
            let core = build_core(args.config)?;
            println!("{}", to_pretty_json(&core.clear_license())?);
            Ok(())
        }
        Command::Watch => watch(args.config).await,
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<SecurityConfig> {
    match path.or_else(SecurityConfig::default_path) {
        Some(path) => SecurityConfig::load_from(&path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => {
            debug!("No config directory on this platform, using defaults");
            Ok(SecurityConfig::default())
        }
    }
}

fn build_core(config: Option<PathBuf>) -> Result<SecurityCore> {
    let config = load_config(config)?;
    SecurityCore::from_config(config).context("failed to initialize security core")
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read license from stdin")?;
    Ok(text)
}

fn keygen(out: Option<PathBuf>) -> Result<()> {
    let issuer = LicenseIssuer::generate().context("failed to generate signing key")?;
    let public_key = issuer.public_key();
    print!("{}", public_key.to_public_pem()?);
    match out {
        Some(path) => {
            write_secret_key(&path, &issuer)?;
            info!(
                path = %path.display(),
                fingerprint = %public_key.fingerprint(),
                "Signing key written"
            );
        }
        None => print!("{}", issuer.to_pem()?.as_str()),
    }
    Ok(())
}

fn issue(key: &Path, request: &IssueRequest) -> Result<()> {
    let issuer = load_issuer(key)?;
    let claims = request.claims(Utc::now())?;
    let wire = issuer.issue(&claims).context("failed to sign license")?;
    info!(expires_at = %claims.expires_at, features = claims.features.len(), "License signed");
    println!("{wire}");
    Ok(())
}

async fn watch(config: Option<PathBuf>) -> Result<()> {
    let core = Arc::new(build_core(config)?);
    let state = core.startup();
    println!("License: {state}");

    let monitors = SecurityMonitors::spawn(Arc::clone(&core));
    let mut states = monitors.subscribe();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut shown_code = String::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {
                let pairing = core.pairing_info();
                if pairing.code != shown_code {
                    println!("Pairing code: {} (until {})", pairing.code, pairing.expires_at);
                    println!("{}", pairing.uri);
                    shown_code = pairing.code;
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!("License: {state}");
            }
        }
    }

    monitors.shutdown();
    Ok(())
}
