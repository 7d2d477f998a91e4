//! Telegram client wrapper module.
//!
//! Provides high-level abstractions for interacting with Telegram:
//! authentication, user resolution, messages and call signaling.

mod client;
mod dh;
mod error;
mod rate_limiter;

pub use client::{
    AccountInfo, CallHandle, PwdToken as PasswordToken, ResolvedUser, TelegramCaller,
    Token as LoginToken, CALL_LIBRARY_VERSIONS, CALL_PROTOCOL_LAYER,
};
pub use dh::{DhParams, DH_BYTES, DH_GENERATOR};
pub use error::TelegramError;
pub use rate_limiter::RateLimiter;
