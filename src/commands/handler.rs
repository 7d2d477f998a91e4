//! Command handler implementation.

use std::collections::VecDeque;

use tracing::debug;

use super::types::{CommandResult, ReplCommand};
use crate::calls::{truncate, CallResult};
use crate::config::{parse_seconds, MAX_SECONDS};
use crate::telegram::AccountInfo;

/// How many call results `/history` keeps.
pub const HISTORY_LIMIT: usize = 50;

/// Settings that live for one interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// How long each call rings, in seconds.
    pub ring_duration_secs: f64,

    /// Message sent before each call.
    pub pre_message: Option<String>,
}

/// Handles prompt commands and holds the session state.
#[derive(Debug)]
pub struct CommandHandler {
    settings: SessionSettings,

    /// The signed-in account.
    account: AccountInfo,

    /// Most recent results last.
    history: VecDeque<CallResult>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(account: AccountInfo, settings: SessionSettings) -> Self {
        Self {
            settings,
            account,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Current session settings.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Recent call results, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &CallResult> {
        self.history.iter()
    }

    /// Remembers finished calls for `/history`.
    pub fn record(&mut self, results: impl IntoIterator<Item = CallResult>) {
        for result in results {
            if self.history.len() == HISTORY_LIMIT {
                self.history.pop_front();
            }
            self.history.push_back(result);
        }
    }

    /// Executes a parsed command.
    pub fn execute(&mut self, command: ReplCommand) -> CommandResult {
        debug!("Handling command: {}", command);

        match command {
            ReplCommand::Time(arg) => self.handle_time(arg.as_deref()),
            ReplCommand::Message(arg) => self.handle_message(arg),
            ReplCommand::Me => self.handle_me(),
            ReplCommand::Status => self.handle_status(),
            ReplCommand::History => self.handle_history(),
            ReplCommand::Help => CommandResult::success(help_text()),
            ReplCommand::Quit => CommandResult::quit("👋 Goodbye!"),
            ReplCommand::Unknown(cmd) => CommandResult::error(format!(
                "❓ Unknown command: {cmd}\n   Type /help for the list of commands"
            )),
        }
    }

    fn handle_time(&mut self, arg: Option<&str>) -> CommandResult {
        let Some(arg) = arg else {
            return CommandResult::success(format!(
                "⏱️  Current ring duration: {} s",
                self.settings.ring_duration_secs
            ));
        };

        match parse_seconds(arg) {
            Some(secs) => {
                self.settings.ring_duration_secs = secs;
                CommandResult::success(format!("⏱️  Ring duration: {secs} s"))
            }
            None => CommandResult::error(format!(
                "❌ Give the duration as a number of seconds, from 0 to {MAX_SECONDS}"
            )),
        }
    }

    fn handle_message(&mut self, arg: Option<String>) -> CommandResult {
        match arg {
            Some(arg) if arg.eq_ignore_ascii_case("off") => {
                self.settings.pre_message = None;
                CommandResult::success("💬 Pre-call message: disabled")
            }
            Some(text) => {
                let reply = format!("💬 Pre-call message: \"{text}\"");
                self.settings.pre_message = Some(text);
                CommandResult::success(reply)
            }
            None => match &self.settings.pre_message {
                Some(text) => CommandResult::success(format!("💬 Current message: \"{text}\"")),
                None => CommandResult::success("💬 No message set"),
            },
        }
    }

    fn handle_me(&self) -> CommandResult {
        CommandResult::success(format!(
            "👤 Account: {}\n   Name: {}\n   ID: {}",
            self.account.handle(),
            self.account.full_name(),
            self.account.id
        ))
    }

    fn handle_status(&self) -> CommandResult {
        let message = self
            .settings
            .pre_message
            .as_deref()
            .map_or_else(|| "(none)".to_owned(), |m| truncate(m, 40));

        CommandResult::success(format!(
            "📊 Current settings:\n   ⏱️  Duration: {} s\n   💬 Message: {message}\n   👤 Account: {}",
            self.settings.ring_duration_secs,
            self.account.handle()
        ))
    }

    fn handle_history(&self) -> CommandResult {
        if self.history.is_empty() {
            return CommandResult::success("📜 No calls yet");
        }

        let mut lines = vec![format!("📜 Last {} call(s):", self.history.len())];
        for result in &self.history {
            lines.push(format!(
                "   {} {}",
                result.finished_at.format("%H:%M:%S"),
                result.summary_line()
            ));
        }
        CommandResult::success(lines.join("\n"))
    }
}

/// Renders the command table.
#[must_use]
pub fn help_text() -> String {
    let entries = ReplCommand::all_commands();
    let width = entries
        .iter()
        .map(|(usage, _)| usage.chars().count())
        .max()
        .unwrap_or_default();

    let mut lines = vec!["📋 Commands".to_owned()];
    for (usage, description) in entries {
        if usage.is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("  {usage:<width$}  {description}"));
        }
    }
    lines.join("\n")
}
