//! Command handling module.
//!
//! Parses lines typed at the call prompt and applies slash commands to the
//! session settings.

mod handler;
mod types;

pub use handler::{help_text, CommandHandler, SessionSettings, HISTORY_LIMIT};
pub use types::{CommandResult, ReplCommand, ReplInput};
