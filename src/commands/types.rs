//! Prompt input and command definitions.

use std::fmt;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    /// A slash command.
    Command(ReplCommand),

    /// Usernames or IDs to call, in order.
    Targets(Vec<String>),
}

impl ReplInput {
    /// Parses a prompt line.
    ///
    /// Returns `None` for blank input. Targets are separated by whitespace
    /// and/or commas.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.starts_with('/') {
            return Some(Self::Command(ReplCommand::parse(line)));
        }

        let targets: Vec<String> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect();

        if targets.is_empty() {
            None
        } else {
            Some(Self::Targets(targets))
        }
    }
}

/// Available prompt commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show or set the ring duration.
    Time(Option<String>),

    /// Show, set or disable the pre-call message.
    Message(Option<String>),

    /// Show the signed-in account.
    Me,

    /// Show current settings.
    Status,

    /// Show recent call results.
    History,

    /// Show help information.
    Help,

    /// Leave the prompt.
    Quit,

    /// Anything else starting with `/`.
    Unknown(String),
}

impl ReplCommand {
    /// Parses a slash command. The command word is case-insensitive.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        let (cmd, args) = match text.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd.to_lowercase(), Some(args.trim())),
            None => (text.to_lowercase(), None),
        };
        let arg = args.filter(|a| !a.is_empty()).map(str::to_owned);

        match cmd.as_str() {
            "/time" | "/t" => Self::Time(arg),
            "/msg" | "/message" | "/m" => Self::Message(arg),
            "/me" => Self::Me,
            "/status" | "/s" => Self::Status,
            "/history" | "/log" => Self::History,
            "/help" | "/h" | "/?" => Self::Help,
            "/quit" | "/exit" | "/q" => Self::Quit,
            _ => Self::Unknown(cmd),
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Time(_) => "time",
            Self::Message(_) => "msg",
            Self::Me => "me",
            Self::Status => "status",
            Self::History => "history",
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns all help entries: usage and description.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("@username", "Call a user"),
            ("@user1 @user2", "Call several users (space or comma separated)"),
            ("123456789", "Call by user ID"),
            ("", ""),
            ("/time 10", "Set the ring duration (seconds)"),
            ("/msg Hello!", "Set a message sent before each call"),
            ("/msg off", "Disable the message"),
            ("/me", "Show the current account"),
            ("/status", "Show current settings"),
            ("/history", "Show recent calls"),
            ("/help", "Show this help"),
            ("/quit", "Exit"),
        ]
    }
}

impl fmt::Display for ReplCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time(Some(arg)) => write!(f, "/time {arg}"),
            Self::Message(Some(arg)) => write!(f, "/msg {arg}"),
            Self::Unknown(cmd) => f.write_str(cmd),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Whether the prompt should exit.
    pub quit: bool,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            quit: false,
        }
    }

    /// Creates a result that ends the session.
    #[must_use]
    pub fn quit(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            quit: true,
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            quit: false,
        }
    }
}
