//! Plaintext API credentials file.
//!
//! The file holds two lines: the API ID and the API hash.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("Credentials file is missing the {0} line")]
    MissingLine(&'static str),

    #[error("API ID must be an integer, got '{0}'")]
    InvalidApiId(String),

    #[error("API hash is empty")]
    EmptyApiHash,

    #[error("Failed to access credentials file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read credentials from the prompt: {0}")]
    Prompt(String),
}

/// Telegram API credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_id: i32,
    pub api_hash: String,
}

impl Credentials {
    /// Creates a new set of credentials.
    #[must_use]
    pub const fn new(api_id: i32, api_hash: String) -> Self {
        Self { api_id, api_hash }
    }

    /// Parses the two-line file format.
    pub fn parse(content: &str) -> Result<Self, CredentialsError> {
        let mut lines = content.lines().map(str::trim);

        let id_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(CredentialsError::MissingLine("API ID"))?;
        let api_id = id_line
            .parse()
            .map_err(|_| CredentialsError::InvalidApiId(id_line.to_owned()))?;

        let api_hash = lines
            .next()
            .ok_or(CredentialsError::MissingLine("API hash"))?;
        if api_hash.is_empty() {
            return Err(CredentialsError::EmptyApiHash);
        }

        Ok(Self::new(api_id, api_hash.to_owned()))
    }

    /// Loads credentials from a file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>, CredentialsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Saves credentials to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CredentialsError> {
        std::fs::write(path, format!("{}\n{}\n", self.api_id, self.api_hash))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("caller_config.txt");

        let creds = Credentials::new(1_234_567, "0123456789abcdef0123456789abcdef".to_owned());
        creds.save(&path).unwrap();

        let loaded = Credentials::load(&path).unwrap();
        assert_eq!(loaded, Some(creds));
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.txt");

        Credentials::new(42, "hash".to_owned()).save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "42\nhash\n");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Credentials::load(dir.path().join("nope.txt")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let creds = Credentials::parse("  777 \r\n abc \n\n").unwrap();
        assert_eq!(creds, Credentials::new(777, "abc".to_owned()));
    }

    #[test]
    fn test_parse_invalid_id() {
        assert!(matches!(
            Credentials::parse("abc\nhash\n"),
            Err(CredentialsError::InvalidApiId(id)) if id == "abc"
        ));
    }

    #[test]
    fn test_parse_missing_hash() {
        assert!(matches!(
            Credentials::parse("123\n"),
            Err(CredentialsError::MissingLine("API hash"))
        ));
        assert!(matches!(
            Credentials::parse(""),
            Err(CredentialsError::MissingLine("API ID"))
        ));
        assert!(matches!(
            Credentials::parse("123\n   \n"),
            Err(CredentialsError::EmptyApiHash)
        ));
    }
}
