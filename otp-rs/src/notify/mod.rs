//! Code delivery
//!
//! A [`Notifier`] gets a destination and a freshly issued code and tries to
//! deliver it. Failures are reported as errors; the manager logs them and
//! keeps the code valid.

pub mod email;
pub mod log;
pub mod resend;
pub mod smtp;
pub mod template;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{Config, DeliveryBackend};
use crate::error::{OtpError, Result};

pub use email::validate_email;
pub use log::LogNotifier;
pub use resend::ResendNotifier;
pub use smtp::SmtpNotifier;
pub use template::VerificationEmail;

/// Delivers a code to a destination (email address, phone, console...)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, destination: &str, code: &str) -> Result<()>;
}

/// Build the notifier selected by `delivery.backend`
pub fn from_config(config: &Config) -> Result<Arc<dyn Notifier>> {
    let email = VerificationEmail::new(&config.email.app_name, config.otp.ttl_minutes);

    let notifier: Arc<dyn Notifier> = match config.delivery.backend {
        DeliveryBackend::Log => Arc::new(LogNotifier::new()),
        DeliveryBackend::Resend => {
            let resend = config.delivery.resend.as_ref().ok_or_else(|| {
                OtpError::Config("missing [delivery.resend] section".to_string())
            })?;
            let api_key = std::env::var(&resend.api_key_env).map_err(|_| {
                OtpError::Config(format!("{} not configured", resend.api_key_env))
            })?;
            Arc::new(
                ResendNotifier::new(api_key, resend.from.clone(), email)
                    .with_api_url(resend.api_url.clone()),
            )
        }
        DeliveryBackend::Smtp => {
            let smtp = config.delivery.smtp.as_ref().ok_or_else(|| {
                OtpError::Config("missing [delivery.smtp] section".to_string())
            })?;
            Arc::new(SmtpNotifier::new(
                smtp.server_addr.clone(),
                smtp.from.clone(),
                email,
            ))
        }
    };

    Ok(notifier)
}
