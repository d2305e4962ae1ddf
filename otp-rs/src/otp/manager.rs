//! OTP Manager - issuance and verification state machine

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::generator::{CodeSource, RandomCodes};
use super::types::*;
use crate::config::{OtpConfig, MAX_TTL_MINUTES};
use crate::error::{OtpError, Result};
use crate::notify::Notifier;

/// Lifetime and attempt budget applied to every issued code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSettings {
    pub ttl: Duration,
    pub max_attempts: u32,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            max_attempts: 3,
        }
    }
}

impl From<OtpConfig> for OtpSettings {
    /// Out-of-range TTLs are clamped; [`Config::validate`](crate::Config::validate)
    /// rejects them first
    fn from(config: OtpConfig) -> Self {
        Self {
            ttl: Duration::minutes(config.ttl_minutes.clamp(1, MAX_TTL_MINUTES)),
            max_attempts: config.max_attempts,
        }
    }
}

/// Result of [`OtpManager::issue_detailed`]
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Whether the notifier reported success
    pub delivered: bool,
}

/// Holds at most one live code and enforces its expiry and attempt budget.
///
/// Expiry and exhaustion are evaluated lazily, only when a candidate is
/// checked. The manager is meant to have a single owner; wrap it in a mutex
/// to share it.
pub struct OtpManager {
    settings: OtpSettings,
    current: Option<OtpRecord>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    codes: Box<dyn CodeSource>,
}

impl OtpManager {
    /// Create a manager using the wall clock and a randomly seeded generator
    pub fn new(settings: OtpSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            settings,
            current: None,
            notifier,
            clock: Arc::new(SystemClock),
            codes: Box::new(RandomCodes::from_entropy()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_code_source(mut self, codes: impl CodeSource + 'static) -> Self {
        self.codes = Box::new(codes);
        self
    }

    pub fn settings(&self) -> OtpSettings {
        self.settings
    }

    /// Issue a new code for `destination` and return it.
    ///
    /// Any previous code is discarded. A failed delivery is logged and
    /// does not invalidate the new code.
    pub async fn issue(&mut self, destination: &str) -> Result<String> {
        self.issue_detailed(destination).await.map(|issued| issued.code)
    }

    /// Same as [`issue`](Self::issue), also reporting the delivery result
    pub async fn issue_detailed(&mut self, destination: &str) -> Result<IssuedCode> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(OtpError::InvalidDestination(
                "destination is empty".to_string(),
            ));
        }

        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.settings.ttl).ok_or_else(|| {
            OtpError::Config(format!("code TTL {} is out of range", self.settings.ttl))
        })?;

        let record = OtpRecord {
            id: Uuid::new_v4(),
            code: self.codes.next_code(),
            destination: destination.to_string(),
            issued_at: now,
            expires_at,
            attempts: 0,
        };
        let id = record.id;
        let code = record.code.clone();

        // State is replaced before delivery so the code is valid even if it fails
        if let Some(previous) = self.current.replace(record) {
            info!(
                event = %OtpEventType::Superseded,
                otp_id = %previous.id,
                "Previous code superseded"
            );
        }

        info!(
            event = %OtpEventType::Issued,
            otp_id = %id,
            destination,
            expires_at = %expires_at.to_rfc3339(),
            "Issued verification code"
        );

        let delivered = match self.notifier.deliver(destination, &code).await {
            Ok(()) => {
                info!(
                    event = %OtpEventType::Delivered,
                    otp_id = %id,
                    destination,
                    "Code delivered"
                );
                true
            }
            Err(e) => {
                warn!(
                    event = %OtpEventType::DeliveryFailed,
                    otp_id = %id,
                    destination,
                    error = %e,
                    "Code delivery failed; code remains valid"
                );
                debug!(otp_id = %id, code = %code, "Code available for out-of-band delivery");
                false
            }
        };

        Ok(IssuedCode {
            code,
            expires_at,
            delivered,
        })
    }

    /// Verify a candidate code. Returns true at most once per issued code.
    pub fn verify(&mut self, candidate: &str) -> bool {
        self.check(candidate).is_verified()
    }

    /// Verify a candidate and report why it failed
    pub fn check(&mut self, candidate: &str) -> VerifyOutcome {
        let now = self.clock.now();
        let max_attempts = self.settings.max_attempts;

        let Some(record) = self.current.as_mut() else {
            debug!("Verification attempted with no active code");
            return VerifyOutcome::NoActiveCode;
        };

        if !is_valid_format(candidate) {
            debug!(otp_id = %record.id, "Malformed candidate rejected");
            return VerifyOutcome::Malformed;
        }

        if record.is_expired_at(now) {
            info!(event = %OtpEventType::Expired, otp_id = %record.id, "Code expired");
            self.current = None;
            return VerifyOutcome::Expired;
        }

        if record.attempts >= max_attempts {
            info!(
                event = %OtpEventType::Exhausted,
                otp_id = %record.id,
                attempts = record.attempts,
                "Attempt budget exhausted"
            );
            self.current = None;
            return VerifyOutcome::AttemptsExhausted;
        }

        record.attempts += 1;

        if candidate == record.code {
            info!(
                event = %OtpEventType::Verified,
                otp_id = %record.id,
                destination = %record.destination,
                "Code verified"
            );
            self.current = None;
            return VerifyOutcome::Verified;
        }

        warn!(
            event = %OtpEventType::VerifyFailed,
            otp_id = %record.id,
            attempts = record.attempts,
            max_attempts,
            "Wrong code submitted"
        );
        VerifyOutcome::Mismatch
    }

    /// Drop the active code, if any
    pub fn clear(&mut self) {
        if let Some(record) = self.current.take() {
            info!(event = %OtpEventType::Cleared, otp_id = %record.id, "Code cleared");
        }
    }

    /// True while a record exists, even if it has expired but not been checked
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.current
            .as_ref()
            .map(|r| self.settings.max_attempts.saturating_sub(r.attempts))
            .unwrap_or(0)
    }

    pub fn status(&self) -> Option<OtpStatus> {
        self.current.as_ref().map(|r| OtpStatus {
            destination: r.destination.clone(),
            issued_at: r.issued_at,
            expires_at: r.expires_at,
            attempts_remaining: self.settings.max_attempts.saturating_sub(r.attempts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use crate::otp::clock::ManualClock;
    use crate::otp::generator::FixedCodes;

    fn manager_with(notifier: MockNotifier, clock: ManualClock) -> OtpManager {
        OtpManager::new(OtpSettings::default(), Arc::new(notifier))
            .with_clock(Arc::new(clock))
            .with_code_source(FixedCodes::new(["482913", "105577"]))
    }

    fn accepting_notifier() -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().returning(|_, _| Ok(()));
        notifier
    }

    #[tokio::test]
    async fn test_issue_delivers_exactly_once() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_deliver()
            .withf(|destination, code| {
                destination.to_string() == "user@example.com" && code.to_string() == "482913"
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut manager = manager_with(notifier, ManualClock::default());
        let issued = manager.issue_detailed("user@example.com").await.unwrap();

        assert_eq!(issued.code, "482913");
        assert!(issued.delivered);
        assert!(manager.is_active());
        assert_eq!(manager.attempts_remaining(), 3);
    }

    #[tokio::test]
    async fn test_issue_rejects_empty_destination() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().times(0);

        let mut manager = manager_with(notifier, ManualClock::default());
        let result = manager.issue("   ").await;

        assert!(matches!(result, Err(OtpError::InvalidDestination(_))));
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_code_valid() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_deliver()
            .times(1)
            .returning(|_, _| Err(OtpError::Delivery("mailbox unavailable".to_string())));

        let mut manager = manager_with(notifier, ManualClock::default());
        let issued = manager.issue_detailed("user@example.com").await.unwrap();

        assert!(!issued.delivered);
        assert!(is_valid_format(&issued.code));
        assert!(manager.verify(&issued.code));
    }

    #[tokio::test]
    async fn test_expiry_sets_expires_at_from_ttl() {
        let clock = ManualClock::default();
        let start = clock.now();
        let mut manager = manager_with(accepting_notifier(), clock);

        let issued = manager.issue_detailed("user@example.com").await.unwrap();
        assert_eq!(issued.expires_at, start + Duration::minutes(10));

        let status = manager.status().unwrap();
        assert_eq!(status.issued_at, start);
        assert_eq!(status.destination, "user@example.com");
    }

    #[tokio::test]
    async fn test_check_reports_reasons() {
        let clock = ManualClock::default();
        let mut manager = manager_with(accepting_notifier(), clock.clone());

        assert_eq!(manager.check("482913"), VerifyOutcome::NoActiveCode);

        manager.issue("user@example.com").await.unwrap();
        assert_eq!(manager.check("48291"), VerifyOutcome::Malformed);
        assert_eq!(manager.check("000000"), VerifyOutcome::Mismatch);
        assert_eq!(manager.attempts_remaining(), 2);

        clock.advance(Duration::minutes(11));
        assert_eq!(manager.check("482913"), VerifyOutcome::Expired);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_expired_takes_precedence_over_exhausted() {
        let clock = ManualClock::default();
        let mut manager = manager_with(accepting_notifier(), clock.clone());

        manager.issue("user@example.com").await.unwrap();
        for _ in 0..3 {
            assert_eq!(manager.check("000000"), VerifyOutcome::Mismatch);
        }

        clock.advance(Duration::minutes(10) + Duration::seconds(1));
        assert_eq!(manager.check("482913"), VerifyOutcome::Expired);
    }

    #[tokio::test]
    async fn test_exhausted_outcome() {
        let mut manager = manager_with(accepting_notifier(), ManualClock::default());

        manager.issue("user@example.com").await.unwrap();
        for _ in 0..3 {
            manager.check("000000");
        }

        assert_eq!(manager.attempts_remaining(), 0);
        assert!(manager.is_active());
        assert_eq!(manager.check("482913"), VerifyOutcome::AttemptsExhausted);
        assert!(!manager.is_active());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let mut manager = manager_with(accepting_notifier(), ManualClock::default());

        manager.issue("user@example.com").await.unwrap();
        manager.clear();
        manager.clear();

        assert!(!manager.is_active());
        assert_eq!(manager.attempts_remaining(), 0);
        assert!(manager.status().is_none());
        assert!(!manager.verify("482913"));
    }

    #[test]
    fn test_settings_from_config() {
        let settings = OtpSettings::from(OtpConfig {
            ttl_minutes: 5,
            max_attempts: 4,
        });
        assert_eq!(settings.ttl, Duration::minutes(5));
        assert_eq!(settings.max_attempts, 4);
    }

    #[test]
    fn test_settings_from_config_clamps_ttl() {
        let settings = OtpSettings::from(OtpConfig {
            ttl_minutes: i64::MAX,
            max_attempts: 3,
        });
        assert_eq!(settings.ttl, Duration::minutes(MAX_TTL_MINUTES));
    }

    #[tokio::test]
    async fn test_issue_rejects_overflowing_ttl() {
        let mut notifier = MockNotifier::new();
        notifier.expect_deliver().times(0);

        let settings = OtpSettings {
            ttl: Duration::days(100_000_000),
            max_attempts: 3,
        };
        let mut manager = OtpManager::new(settings, Arc::new(notifier))
            .with_clock(Arc::new(ManualClock::default()))
            .with_code_source(FixedCodes::new(["482913"]));

        let result = manager.issue("user@example.com").await;
        assert!(matches!(result, Err(OtpError::Config(_))));
        assert!(!manager.is_active());
    }
}
