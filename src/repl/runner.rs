//! The interactive call prompt.

use dialoguer::Input;
use tracing::{debug, info};

use crate::calls::{BatchSummary, CallBackend, CallResult, Dialer};
use crate::commands::{CommandHandler, ReplInput};

/// Prompt shown before each line.
pub const PROMPT: &str = "📞";

/// What reading one prompt line produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptLine {
    /// A line of input.
    Line(String),

    /// The operator pressed Ctrl+C.
    Interrupted,

    /// Input is closed.
    Closed,
}

/// Reads one line from the terminal.
///
/// Blocks the current worker thread while waiting, so it must run on the
/// multi-threaded runtime.
pub fn read_terminal_line() -> PromptLine {
    let read = tokio::task::block_in_place(|| {
        Input::<String>::new()
            .with_prompt(PROMPT)
            .allow_empty(true)
            .interact_text()
    });

    match read {
        Ok(line) => PromptLine::Line(line),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
            PromptLine::Interrupted
        }
        Err(e) => {
            debug!("Prompt closed: {}", e);
            PromptLine::Closed
        }
    }
}

/// Runs the prompt until `/quit`, Ctrl+C or end of input.
///
/// An interrupt raised through the dialer ends the loop once the call in
/// progress has been hung up.
pub async fn run<B, F>(dialer: &Dialer<B>, handler: &mut CommandHandler, mut read_line: F)
where
    B: CallBackend,
    F: FnMut() -> PromptLine,
{
    let interrupt = dialer.interrupt();

    loop {
        if interrupt.is_triggered() {
            println!("\n👋 Interrupted. Goodbye!");
            break;
        }

        println!();
        let line = match read_line() {
            PromptLine::Line(line) => line,
            PromptLine::Interrupted => {
                println!("\n👋 Interrupted. Goodbye!");
                break;
            }
            PromptLine::Closed => break,
        };

        match ReplInput::parse(&line) {
            None => {}
            Some(ReplInput::Command(command)) => {
                let result = handler.execute(command);
                println!("{}", result.message);
                if result.quit {
                    break;
                }
            }
            Some(ReplInput::Targets(targets)) => {
                let results = call_targets(dialer, handler, &targets).await;
                handler.record(results);
            }
        }
    }

    info!("Prompt finished");
}

async fn call_targets<B: CallBackend>(
    dialer: &Dialer<B>,
    handler: &CommandHandler,
    targets: &[String],
) -> Vec<CallResult> {
    let settings = handler.settings();
    let message = settings.pre_message.as_deref();

    if let [target] = targets {
        println!("   📞 Calling {target}...");
        let result = dialer.call(target, settings.ring_duration_secs, message).await;
        println!("   {}", result.summary_line());
        return vec![result];
    }

    println!("\n📞 Calling {} users...", targets.len());
    let total = targets.len();
    let results = dialer
        .call_multiple(targets, settings.ring_duration_secs, message, |i, result| {
            println!("[{i}/{total}] {}", result.summary_line());
        })
        .await;

    println!("\n✅ Done: {}", BatchSummary::from_results(&results));
    results
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::calls::{CallStatus, Target};
    use crate::commands::SessionSettings;
    use crate::telegram::{AccountInfo, CallHandle, DhParams, ResolvedUser, TelegramError};

    struct NobodyHome;

    impl CallBackend for NobodyHome {
        async fn resolve(&self, target: &Target) -> Result<ResolvedUser, TelegramError> {
            Err(TelegramError::NotFound(target.to_string()))
        }

        async fn send_message(&self, _: &ResolvedUser, _: &str) -> Result<(), TelegramError> {
            Ok(())
        }

        async fn request_call(
            &self,
            _: &ResolvedUser,
            _: &DhParams,
        ) -> Result<CallHandle, TelegramError> {
            Err(TelegramError::PrivacyRestricted)
        }

        async fn discard_call(&self, _: CallHandle) -> Result<(), TelegramError> {
            Ok(())
        }
    }

    fn handler() -> CommandHandler {
        CommandHandler::new(
            AccountInfo {
                id: 1,
                username: None,
                first_name: None,
                last_name: None,
            },
            SessionSettings {
                ring_duration_secs: 0.0,
                pre_message: None,
            },
        )
    }

    fn scripted(lines: &[&str]) -> impl FnMut() -> PromptLine {
        let mut lines: Vec<PromptLine> = lines
            .iter()
            .map(|l| PromptLine::Line((*l).to_owned()))
            .collect();
        lines.reverse();
        move || lines.pop().unwrap_or(PromptLine::Closed)
    }

    #[tokio::test]
    async fn test_commands_and_calls_are_dispatched() {
        let dialer = Dialer::with_timing(NobodyHome, Duration::ZERO, Duration::ZERO);
        let mut handler = handler();

        run(
            &dialer,
            &mut handler,
            scripted(&["/time 0", "", "@a, @b", "/msg hi", "123"]),
        )
        .await;

        let history: Vec<(String, CallStatus)> = handler
            .history()
            .map(|r| (r.target.clone(), r.status))
            .collect();
        assert_eq!(
            history,
            vec![
                ("@a".to_owned(), CallStatus::NotFound),
                ("@b".to_owned(), CallStatus::NotFound),
                ("123".to_owned(), CallStatus::NotFound),
            ]
        );
        assert_eq!(handler.settings().pre_message.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_quit_stops_reading() {
        let dialer = Dialer::with_timing(NobodyHome, Duration::ZERO, Duration::ZERO);
        let mut handler = handler();

        run(&dialer, &mut handler, scripted(&["/quit", "@never"])).await;

        assert_eq!(handler.history().count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_stops_reading() {
        let dialer = Dialer::with_timing(NobodyHome, Duration::ZERO, Duration::ZERO);
        let mut handler = handler();
        let mut script = vec![
            PromptLine::Line("@never".to_owned()),
            PromptLine::Interrupted,
        ];

        run(&dialer, &mut handler, move || script.pop().unwrap_or(PromptLine::Closed)).await;

        assert_eq!(handler.history().count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_during_calls_ends_prompt() {
        let dialer = Dialer::with_timing(NobodyHome, Duration::ZERO, Duration::ZERO);
        let interrupt = dialer.interrupt();
        let mut handler = handler();
        let mut script = vec![
            PromptLine::Line("@never".to_owned()),
            PromptLine::Line("@first".to_owned()),
        ];

        run(&dialer, &mut handler, move || {
            let line = script.pop().unwrap_or(PromptLine::Closed);
            // Ctrl+C arrives while the first line's call is running.
            interrupt.trigger();
            line
        })
        .await;

        let targets: Vec<String> = handler.history().map(|r| r.target.clone()).collect();
        assert_eq!(targets, vec!["@first".to_owned()]);
    }
}
