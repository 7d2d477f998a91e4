//! Telegram Caller - Main Entry Point
//!
//! Rings Telegram users from the terminal. Without targets on the command
//! line it starts an interactive prompt.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::{Input, Password};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use telegram_caller::calls::{BatchSummary, CallResult, Dialer, Interrupt};
use telegram_caller::commands::{help_text, CommandHandler, SessionSettings};
use telegram_caller::config::{
    parse_seconds, CallerSettings, CredentialSource, Credentials, CredentialsError,
    TelegramConfig, MAX_SECONDS,
};
use telegram_caller::repl;
use telegram_caller::telegram::{TelegramCaller, TelegramError};

/// Place short Telegram voice calls for notifications.
#[derive(Parser, Debug)]
#[command(name = "telegram_caller")]
#[command(about = "Ring Telegram users from the terminal")]
#[command(version)]
struct Args {
    /// Usernames or IDs to call once, then exit. Starts the prompt when empty.
    targets: Vec<String>,

    /// Path to the credentials file (API ID and API hash, one per line).
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the session database.
    #[arg(short, long)]
    session: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Ring duration in seconds.
    #[arg(short, long, value_parser = parse_duration_arg)]
    duration: Option<f64>,

    /// Message sent before each call.
    #[arg(short, long)]
    message: Option<String>,

    /// Print one JSON object per call result (one-shot mode).
    #[arg(long)]
    json: bool,
}

fn parse_duration_arg(s: &str) -> Result<f64, String> {
    parse_seconds(s)
        .ok_or_else(|| format!("'{s}' is not a number of seconds between 0 and {MAX_SECONDS}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut settings = CallerSettings::from_env_with_defaults();
    if let Some(path) = &args.config {
        settings.credentials_path = path.into();
    }
    if let Some(duration) = args.duration {
        settings.ring_duration_secs = duration;
    }

    let interactive = args.targets.is_empty();
    if interactive {
        print_banner();
    }

    let mut tg_config = load_telegram_config(&settings.credentials_path)?;
    if let Some(session) = &args.session {
        tg_config = tg_config.with_session_path(session);
    }

    eprintln!("\n🔄 Connecting to Telegram...");
    let caller = TelegramCaller::connect(&tg_config)
        .await
        .context("Failed to connect to Telegram")?;

    let outcome = run(&caller, &args, &settings, interactive).await;
    caller.disconnect();
    outcome
}

async fn run(
    caller: &TelegramCaller,
    args: &Args,
    settings: &CallerSettings,
    interactive: bool,
) -> Result<()> {
    // Handle authentication if needed
    if !caller
        .is_authorized()
        .await
        .context("Failed to check authorization")?
    {
        authenticate(caller).await?;
    }

    let account = caller.me().await.context("Failed to fetch the account")?;
    info!("Signed in as {} ({})", account.handle(), account.id);

    let dialer = Dialer::new(caller, settings);
    listen_for_ctrl_c(dialer.interrupt());

    if !interactive {
        return call_once(&dialer, args, settings).await;
    }

    println!(
        "\n✅ Connected as: {} ({})\n   ID: {}",
        account.handle(),
        account.full_name(),
        account.id
    );
    println!("\n{}", help_text());

    let mut handler = CommandHandler::new(
        account,
        SessionSettings {
            ring_duration_secs: settings.ring_duration_secs,
            pre_message: args.message.clone(),
        },
    );

    repl::run(&dialer, &mut handler, repl::read_terminal_line).await;

    Ok(())
}

/// Routes Ctrl+C to the dialer so a ringing call is hung up before exit.
fn listen_for_ctrl_c(interrupt: Interrupt) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\n⏹️  Interrupted");
                interrupt.trigger();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });
}

/// Calls the targets given on the command line and exits.
async fn call_once(
    dialer: &Dialer<&TelegramCaller>,
    args: &Args,
    settings: &CallerSettings,
) -> Result<()> {
    let total = args.targets.len();
    let json = args.json;

    let results = dialer
        .call_multiple(
            &args.targets,
            settings.ring_duration_secs,
            args.message.as_deref(),
            |i, result| print_result(i, total, result, json),
        )
        .await;

    if !json {
        println!("\n{}", BatchSummary::from_results(&results));
    }

    if results.iter().any(CallResult::is_success) {
        Ok(())
    } else {
        anyhow::bail!("No call went through")
    }
}

fn print_result(index: usize, total: usize, result: &CallResult, json: bool) {
    match result.report_line(index, total, json) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!("Failed to serialize result: {}", e),
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_banner() {
    println!(
        "
╔═══════════════════════════════════════════════════════════════╗
║                    📞 TELEGRAM CALLER                         ║
║                                                               ║
║  Telegram calls for notifications                             ║
╚═══════════════════════════════════════════════════════════════╝"
    );
}

/// Resolves API credentials: environment first, then the credentials file,
/// then an interactive prompt whose answers are saved for next time.
fn load_telegram_config(credentials_path: &Path) -> Result<TelegramConfig> {
    let session_path = std::env::var_os("TG_SESSION_PATH");

    let (config, source) = TelegramConfig::resolve(
        TelegramConfig::from_env(),
        credentials_path,
        session_path.as_deref().map(Path::new),
        || prompt_credentials().map_err(|e| CredentialsError::Prompt(e.to_string())),
    )
    .with_context(|| {
        format!(
            "Failed to set up credentials in {}",
            credentials_path.display()
        )
    })?;

    if source == CredentialSource::Prompt {
        println!("✅ Credentials saved");
    }

    Ok(config)
}

fn prompt_credentials() -> Result<Credentials, dialoguer::Error> {
    println!("🔧 First-time setup");
    println!("{}", "─".repeat(40));
    println!("Get your API ID and API hash at: https://my.telegram.org\n");

    let api_id: i32 = Input::new().with_prompt("API ID").interact_text()?;

    let api_hash: String = Input::new()
        .with_prompt("API Hash")
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("API hash cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    Ok(Credentials::new(api_id, api_hash.trim().to_owned()))
}

/// Handles Telegram authentication.
async fn authenticate(caller: &TelegramCaller) -> Result<()> {
    println!("\n📱 Telegram sign-in");
    println!("{}", "─".repeat(40));

    let token = loop {
        let phone: String = Input::new()
            .with_prompt("Enter your phone number (with +)")
            .interact_text()?;

        match caller.request_login_code(phone.trim()).await {
            Ok(token) => break token,
            Err(TelegramError::InvalidPhone) => {
                println!("❌ Invalid phone number format. Try again.");
            }
            Err(TelegramError::FloodWait(seconds)) => {
                anyhow::bail!("Too many attempts. Wait {seconds} seconds.");
            }
            Err(e) => return Err(e).context("Failed to request login code"),
        }
    };

    info!("Login code sent to your Telegram app");

    loop {
        let code: String = Input::new()
            .with_prompt("Enter the code from Telegram")
            .interact_text()?;

        match caller.sign_in(&token, code.trim()).await {
            Ok(()) => return Ok(()),
            Err(TelegramError::InvalidCode) => {
                println!("❌ Invalid code. Try again.");
            }
            Err(TelegramError::PasswordRequired(password_token)) => {
                println!("\n🔐 Two-factor authentication password required");
                if let Some(hint) = password_token.hint() {
                    println!("   Hint: {hint}");
                }

                let password: String = Password::new()
                    .with_prompt("Enter your 2FA password")
                    .interact()?;

                caller
                    .check_password(password_token, &password)
                    .await
                    .context("2FA authentication failed")?;

                return Ok(());
            }
            Err(e) => return Err(e).context("Authentication failed"),
        }
    }
}
