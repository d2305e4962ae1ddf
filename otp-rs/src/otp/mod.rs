//! One-time passcode lifecycle
//!
//! Issues 6-digit codes, hands them to a [`Notifier`](crate::notify::Notifier)
//! and verifies candidates against expiry and an attempt budget.

pub mod clock;
pub mod generator;
pub mod manager;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use generator::{CodeSource, FixedCodes, RandomCodes};
pub use manager::{IssuedCode, OtpManager, OtpSettings};
pub use types::*;
