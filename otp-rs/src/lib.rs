//! otp-rs: one-time passcode email verification
//!
//! Issues short-lived 6-digit codes, delivers them through a pluggable
//! notifier and verifies them with an attempt budget.
//!
//! # Features
//!
//! - **OTP Manager**: at most one live code, lazy expiry, attempt-limited,
//!   single-use
//! - **Delivery**: log, Resend HTTP API or a plain SMTP relay; delivery
//!   failures never invalidate an issued code
//! - **HTTP API**: send / verify / clear / status per session
//!
//! # Example
//!
//! ```no_run
//! use otp_rs::notify::LogNotifier;
//! use otp_rs::otp::{OtpManager, OtpSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = OtpManager::new(OtpSettings::default(), Arc::new(LogNotifier::new()));
//!
//! let code = manager.issue("user@example.com").await?;
//! assert!(manager.verify(&code));
//! assert!(!manager.verify(&code));
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`otp`]: Code generation and the verification state machine
//! - [`notify`]: Delivery backends
//! - [`api`]: HTTP endpoints

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod otp;

// Re-export commonly used types
pub use config::Config;
pub use error::{OtpError, Result};
pub use notify::Notifier;
pub use otp::{OtpManager, OtpSettings, VerifyOutcome};
