//! Configuration module for the caller.
//!
//! Handles the plaintext credentials file, Telegram API configuration
//! and the default call timing.

mod credentials;
mod settings;

pub use credentials::{Credentials, CredentialsError};
pub use settings::{
    parse_seconds, CallerSettings, ConfigError, CredentialSource, TelegramConfig,
    DEFAULT_CREDENTIALS_PATH, MAX_SECONDS,
};
