//! otp-rs: email verification service
//!
//! # Usage
//!
//! ```bash
//! # Run the HTTP API
//! otp-rs serve --config otp.toml
//!
//! # Issue one code through the configured backend
//! otp-rs send user@example.com --config otp.toml
//! ```

use clap::{Parser, Subcommand};
use otp_rs::api::{ApiServer, AppState};
use otp_rs::config::{Config, LoggingConfig};
use otp_rs::notify;
use otp_rs::otp::{OtpManager, OtpSettings};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "otp-rs")]
#[command(about = "One-time passcode email verification", long_about = None)]
struct Cli {
    /// Path to a TOML config file (development defaults if omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Override server.listen_addr
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Issue a code for an address and print it
    Send {
        /// Destination email address
        email: String,
    },
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("otp_rs={},tower_http=info", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::development(),
    };
    config.validate()?;

    init_logging(&config.logging);
    info!("Starting otp-rs v{}", env!("CARGO_PKG_VERSION"));
    match &cli.config {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No config file specified, using development defaults"),
    }

    let settings = OtpSettings::from(config.otp);
    let notifier = notify::from_config(&config)?;

    match cli.command {
        Commands::Serve { listen } => {
            let addr = listen.unwrap_or_else(|| config.server.listen_addr.clone());
            info!("  Delivery backend: {:?}", config.delivery.backend);
            info!(
                "  Code TTL: {} minutes, {} attempts",
                config.otp.ttl_minutes, config.otp.max_attempts
            );

            let server = ApiServer::new(AppState::new(settings, notifier), addr);
            server.run().await?;
        }
        Commands::Send { email } => {
            notify::validate_email(&email)?;

            let mut manager = OtpManager::new(settings, notifier);
            let issued = manager.issue_detailed(&email).await?;

            println!("Code:      {}", issued.code);
            println!("Expires:   {}", issued.expires_at.to_rfc3339());
            if issued.delivered {
                println!("✓ Delivered to {}", email);
            } else {
                println!("✗ Delivery failed; give the code to the user out-of-band");
            }
        }
    }

    Ok(())
}
