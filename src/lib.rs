//! Telegram Caller Library
//!
//! Places short Telegram voice calls for notification purposes.
//!
//! This crate provides the core functionality for:
//! - Loading and saving API credentials
//! - Connecting to Telegram via `MTProto` and signing in
//! - Ringing users for a fixed duration, optionally after a message
//! - Handling commands typed at the interactive prompt

pub mod calls;
pub mod commands;
pub mod config;
pub mod repl;
pub mod telegram;
