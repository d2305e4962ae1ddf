//! Log-only delivery for development and operator fallback

use async_trait::async_trait;
use tracing::info;

use super::Notifier;
use crate::error::Result;

/// Writes the code to the log instead of sending it anywhere
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, destination: &str, code: &str) -> Result<()> {
        info!(destination, code, "Verification code (log delivery)");
        Ok(())
    }
}
