//! Application settings and Telegram configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{Credentials, CredentialsError};

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("caller_session.db")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self {
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from saved credentials.
    #[must_use]
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self::new(credentials.api_id, credentials.api_hash)
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID` and `TG_API_HASH` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            session_path,
        })
    }

    /// Picks the API credentials to connect with.
    ///
    /// `from_env` wins when it holds a configuration. Otherwise the
    /// credentials file at `credentials_path` is used, and when it is missing
    /// or unreadable `prompt` is asked and its answer saved there.
    /// `session_path` applies to file and prompted credentials; the
    /// environment carries its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails or its answer cannot be saved.
    pub fn resolve(
        from_env: Result<Self, ConfigError>,
        credentials_path: &Path,
        session_path: Option<&Path>,
        prompt: impl FnOnce() -> Result<Credentials, CredentialsError>,
    ) -> Result<(Self, CredentialSource), CredentialsError> {
        match from_env {
            Ok(config) => {
                debug!("Using API credentials from the environment");
                return Ok((config, CredentialSource::Environment));
            }
            Err(e) => debug!("No credentials in the environment: {}", e),
        }

        let with_session = |config: Self| match session_path {
            Some(path) => config.with_session_path(path),
            None => config,
        };

        match Credentials::load(credentials_path) {
            Ok(Some(credentials)) => {
                debug!("Using API credentials from {}", credentials_path.display());
                return Ok((
                    with_session(Self::from_credentials(credentials)),
                    CredentialSource::File,
                ));
            }
            Ok(None) => {}
            Err(e) => warn!(
                "Ignoring unreadable credentials file {}: {}",
                credentials_path.display(),
                e
            ),
        }

        let credentials = prompt()?;
        credentials.save(credentials_path)?;
        info!("Saved API credentials to {}", credentials_path.display());

        Ok((
            with_session(Self::from_credentials(credentials)),
            CredentialSource::Prompt,
        ))
    }

    /// Overrides the session path.
    #[must_use]
    pub fn with_session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = path.into();
        self
    }
}

/// Where [`TelegramConfig::resolve`] found the API credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File,
    /// Asked for interactively and saved to the credentials file.
    Prompt,
}

/// Caller-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerSettings {
    /// Path to the plaintext credentials file.
    pub credentials_path: PathBuf,

    /// Default ring duration in seconds.
    #[serde(default = "default_ring_duration")]
    pub ring_duration_secs: f64,

    /// Pause between two consecutive calls in seconds.
    #[serde(default = "default_call_delay")]
    pub call_delay_secs: f64,

    /// Pause between the pre-call message and the call in milliseconds.
    #[serde(default = "default_message_delay")]
    pub message_delay_ms: u64,
}

fn default_ring_duration() -> f64 {
    5.0
}

fn default_call_delay() -> f64 {
    1.0
}

fn default_message_delay() -> u64 {
    300
}

impl Default for CallerSettings {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            ring_duration_secs: default_ring_duration(),
            call_delay_secs: default_call_delay(),
            message_delay_ms: default_message_delay(),
        }
    }
}

/// Default location of the credentials file.
pub const DEFAULT_CREDENTIALS_PATH: &str = "caller_config.txt";

impl CallerSettings {
    /// Creates caller settings from environment variables with defaults.
    ///
    /// Unparsable or negative values fall back to the defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            credentials_path: std::env::var("CALLER_CONFIG_PATH")
                .map_or_else(|_| PathBuf::from(DEFAULT_CREDENTIALS_PATH), PathBuf::from),
            ring_duration_secs: env_secs("CALLER_RING_DURATION")
                .unwrap_or_else(default_ring_duration),
            call_delay_secs: env_secs("CALLER_CALL_DELAY").unwrap_or_else(default_call_delay),
            message_delay_ms: std::env::var("CALLER_MESSAGE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_message_delay),
        }
    }
}

fn env_secs(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|s| parse_seconds(&s))
}

/// Longest accepted ring duration or delay, in seconds (one day).
pub const MAX_SECONDS: f64 = 86_400.0;

/// Parses a number of seconds between 0 and [`MAX_SECONDS`].
#[must_use]
pub fn parse_seconds(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| (0.0..=MAX_SECONDS).contains(secs))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be an integer)")]
    InvalidApiId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CallerSettings::default();
        assert!((settings.ring_duration_secs - 5.0).abs() < f64::EPSILON);
        assert!((settings.call_delay_secs - 1.0).abs() < f64::EPSILON);
        assert_eq!(settings.message_delay_ms, 300);
        assert_eq!(settings.credentials_path, PathBuf::from("caller_config.txt"));
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path, PathBuf::from("caller_session.db"));
    }

    #[test]
    fn test_telegram_config_with_session_path() {
        let config = TelegramConfig::new(1, "h".to_owned()).with_session_path("other.db");
        assert_eq!(config.session_path, PathBuf::from("other.db"));
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("10"), Some(10.0));
        assert_eq!(parse_seconds(" 2.5 "), Some(2.5));
        assert_eq!(parse_seconds("0"), Some(0.0));
        assert_eq!(parse_seconds("-1"), None);
        assert_eq!(parse_seconds("inf"), None);
        assert_eq!(parse_seconds("NaN"), None);
        assert_eq!(parse_seconds("ten"), None);
        assert_eq!(parse_seconds("86400"), Some(MAX_SECONDS));
        assert_eq!(parse_seconds("86400.5"), None);
        assert_eq!(parse_seconds("1e20"), None);
    }

    fn prompt_never() -> Result<Credentials, CredentialsError> {
        panic!("prompt should not be asked");
    }

    #[test]
    fn test_resolve_prefers_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");
        Credentials::new(1, "file".to_owned()).save(&path).unwrap();

        let (config, source) = TelegramConfig::resolve(
            Ok(TelegramConfig::new(2, "env".to_owned())),
            &path,
            Some(Path::new("ignored.db")),
            prompt_never,
        )
        .unwrap();

        assert_eq!(source, CredentialSource::Environment);
        assert_eq!(config.api_id, 2);
        assert_eq!(config.api_hash, "env");
        assert_eq!(config.session_path, PathBuf::from("caller_session.db"));
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");
        Credentials::new(1, "file".to_owned()).save(&path).unwrap();

        let (config, source) = TelegramConfig::resolve(
            Err(ConfigError::MissingEnvVar("TG_API_ID")),
            &path,
            Some(Path::new("other.db")),
            prompt_never,
        )
        .unwrap();

        assert_eq!(source, CredentialSource::File);
        assert_eq!(config.api_id, 1);
        assert_eq!(config.api_hash, "file");
        assert_eq!(config.session_path, PathBuf::from("other.db"));
    }

    #[test]
    fn test_resolve_prompts_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");

        let (config, source) = TelegramConfig::resolve(
            Err(ConfigError::MissingEnvVar("TG_API_ID")),
            &path,
            None,
            || Ok(Credentials::new(3, "typed".to_owned())),
        )
        .unwrap();

        assert_eq!(source, CredentialSource::Prompt);
        assert_eq!(config.api_id, 3);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "3\ntyped\n");
    }

    #[test]
    fn test_resolve_replaces_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");
        std::fs::write(&path, "not-a-number\nhash\n").unwrap();

        let (config, source) = TelegramConfig::resolve(
            Err(ConfigError::InvalidApiId),
            &path,
            None,
            || Ok(Credentials::new(4, "fixed".to_owned())),
        )
        .unwrap();

        assert_eq!(source, CredentialSource::Prompt);
        assert_eq!(config.api_hash, "fixed");
        assert_eq!(
            Credentials::load(&path).unwrap(),
            Some(Credentials::new(4, "fixed".to_owned()))
        );
    }

    #[test]
    fn test_resolve_prompt_failure_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");

        let result = TelegramConfig::resolve(
            Err(ConfigError::MissingEnvVar("TG_API_HASH")),
            &path,
            None,
            || Err(CredentialsError::Prompt("input closed".to_owned())),
        );

        assert!(matches!(result, Err(CredentialsError::Prompt(_))));
        assert!(!path.exists());
    }
}
