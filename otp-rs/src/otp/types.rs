//! OTP types and data structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Number of decimal digits in an issued code
pub const CODE_LENGTH: usize = 6;

/// The single live code held by an [`OtpManager`](super::OtpManager)
#[derive(Clone)]
pub struct OtpRecord {
    /// Correlation ID for log lines
    pub id: Uuid,
    /// The 6-digit code
    pub(crate) code: String,
    /// Address the code was issued for (audit only)
    pub destination: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Verification attempts made against this record
    pub attempts: u32,
}

impl std::fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpRecord")
            .field("id", &self.id)
            .field("code", &"******")
            .field("destination", &self.destination)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl OtpRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Read-only view of the active record; never carries the code
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OtpStatus {
    pub destination: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts_remaining: u32,
}

/// Why a verification succeeded or failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; the record was consumed
    Verified,
    /// Nothing has been issued, or the last record was already destroyed
    NoActiveCode,
    /// Candidate is not exactly six ASCII digits; no attempt was counted
    Malformed,
    /// TTL elapsed; the record was destroyed
    Expired,
    /// Attempt budget was already spent; the record was destroyed
    AttemptsExhausted,
    /// Wrong code; one attempt was counted
    Mismatch,
}

impl VerifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyOutcome::Verified)
    }
}

/// Lifecycle events, emitted as the `event` field of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpEventType {
    Issued,
    Superseded,
    Delivered,
    DeliveryFailed,
    Verified,
    VerifyFailed,
    Expired,
    Exhausted,
    Cleared,
}

impl std::fmt::Display for OtpEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpEventType::Issued => write!(f, "issued"),
            OtpEventType::Superseded => write!(f, "superseded"),
            OtpEventType::Delivered => write!(f, "delivered"),
            OtpEventType::DeliveryFailed => write!(f, "delivery_failed"),
            OtpEventType::Verified => write!(f, "verified"),
            OtpEventType::VerifyFailed => write!(f, "verify_failed"),
            OtpEventType::Expired => write!(f, "expired"),
            OtpEventType::Exhausted => write!(f, "exhausted"),
            OtpEventType::Cleared => write!(f, "cleared"),
        }
    }
}

/// True iff `candidate` is exactly [`CODE_LENGTH`] ASCII digits
pub fn is_valid_format(candidate: &str) -> bool {
    candidate.len() == CODE_LENGTH && candidate.bytes().all(|b| b.is_ascii_digit())
}
