//! REST API module for otp-rs
//!
//! Exposes issue / verify / clear / status over HTTP, one OTP manager per
//! session (identified by the `x-session-id` header).

pub mod handlers;
pub mod server;
pub mod state;

pub use server::{router, ApiServer};
pub use state::AppState;
