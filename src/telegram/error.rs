//! Errors surfaced by the Telegram client wrapper.

use grammers_client::InvocationError;
use grammers_client::client::PasswordToken;
use thiserror::Error;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Not authorized. Please sign in first.")]
    NotAuthorized,

    #[error("Invalid phone number")]
    InvalidPhone,

    #[error("Invalid login code")]
    InvalidCode,

    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Password required for 2FA")]
    PasswordRequired(PasswordToken),

    #[error("Invalid password")]
    InvalidPassword(PasswordToken),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Calls are restricted by the user's privacy settings")]
    PrivacyRestricted,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Rpc(rpc) => {
                let display = rpc.to_string();
                Self::from_rpc(&rpc.name, rpc.value, display)
            }
            other => Self::from_message(other.to_string()),
        }
    }
}

impl TelegramError {
    /// Classifies an RPC error by its name and numeric value.
    ///
    /// `display` is kept as the message for errors that fall through to
    /// [`TelegramError::Invocation`].
    #[must_use]
    pub fn from_rpc(name: &str, value: Option<u32>, display: String) -> Self {
        let upper = name.to_ascii_uppercase();

        if upper.starts_with("FLOOD_WAIT") || upper.starts_with("FLOOD_PREMIUM_WAIT") {
            let seconds = value
                .or_else(|| extract_flood_wait_seconds(&upper))
                .unwrap_or_default();
            return Self::FloodWait(seconds);
        }

        match upper.as_str() {
            "USERNAME_NOT_OCCUPIED" | "USERNAME_INVALID" | "USER_ID_INVALID"
            | "PEER_ID_INVALID" | "INPUT_USER_DEACTIVATED" => Self::NotFound(upper),
            "PHONE_NUMBER_INVALID" | "PHONE_NUMBER_BANNED" => Self::InvalidPhone,
            "PHONE_CODE_INVALID" | "PHONE_CODE_EMPTY" | "PHONE_CODE_EXPIRED" => Self::InvalidCode,
            _ if upper.contains("PRIVACY") => Self::PrivacyRestricted,
            _ => Self::Invocation(display),
        }
    }

    /// Classifies an error known only by its text.
    #[must_use]
    pub fn from_message(message: String) -> Self {
        let upper = message.to_ascii_uppercase();

        if (upper.contains("FLOOD_WAIT") || upper.contains("FLOOD WAIT"))
            && let Some(seconds) = extract_flood_wait_seconds(&message)
        {
            return Self::FloodWait(seconds);
        }
        if upper.contains("PHONE_NUMBER_INVALID") {
            return Self::InvalidPhone;
        }
        if upper.contains("PHONE_CODE_INVALID") {
            return Self::InvalidCode;
        }
        if upper.contains("PRIVACY") {
            return Self::PrivacyRestricted;
        }

        Self::Invocation(message)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["FLOOD_WAIT_", "FLOOD_PREMIUM_WAIT_", "flood wait ", "(value: "];
    let lower = err_msg.to_lowercase();

    for pattern in patterns {
        if let Some(idx) = lower.find(&pattern.to_lowercase()) {
            let start = idx + pattern.len();
            let num_str: String = err_msg[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}
