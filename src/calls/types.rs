//! Call targets, statuses and results.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::telegram::TelegramError;

/// Who to call, as typed by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A username without the leading `@`.
    Username(String),

    /// A numeric user ID.
    Id(i64),
}

impl Target {
    /// Normalizes operator input.
    ///
    /// Surrounding whitespace and one leading `@` are stripped. All-digit
    /// input is a user ID. Returns `None` for empty input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let name = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();

        if name.is_empty() {
            return None;
        }

        if name.chars().all(|c| c.is_ascii_digit())
            && let Ok(id) = name.parse()
        {
            return Some(Self::Id(id));
        }

        Some(Self::Username(name.to_owned()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(name) => write!(f, "@{name}"),
            Self::Id(id) => write!(f, "ID:{id}"),
        }
    }
}

/// Outcome class of a call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Success,
    Privacy,
    NotFound,
    FloodWait,
    Failed,
}

impl CallStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 5] = [
        Self::Success,
        Self::Privacy,
        Self::NotFound,
        Self::FloodWait,
        Self::Failed,
    ];

    /// Maps an error to the status it is reported as.
    #[must_use]
    pub fn from_error(err: &TelegramError) -> Self {
        match err {
            TelegramError::PrivacyRestricted => Self::Privacy,
            TelegramError::NotFound(_) => Self::NotFound,
            TelegramError::FloodWait(_) => Self::FloodWait,
            other if other.to_string().to_uppercase().contains("PRIVACY") => Self::Privacy,
            _ => Self::Failed,
        }
    }

    /// Console label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "✅ Success",
            Self::Privacy => "🔒 Privacy",
            Self::NotFound => "❓ Not found",
            Self::FloodWait => "⏳ Flood wait",
            Self::Failed => "❌ Failed",
        }
    }

    /// Leading icon of [`CallStatus::label`].
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Privacy => "🔒",
            Self::NotFound => "❓",
            Self::FloodWait => "⏳",
            Self::Failed => "❌",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one call attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CallResult {
    /// The target as the operator typed it.
    pub target: String,

    /// Outcome class.
    pub status: CallStatus,

    /// Human-readable detail.
    pub message: String,

    /// Seconds Telegram asked to wait, for [`CallStatus::FloodWait`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_secs: Option<u32>,

    /// When the attempt finished.
    pub finished_at: DateTime<Local>,
}

impl CallResult {
    fn new(target: &str, status: CallStatus, message: String) -> Self {
        Self {
            target: target.to_owned(),
            status,
            message,
            wait_secs: None,
            finished_at: Local::now(),
        }
    }

    /// A call that rang for `duration_secs`.
    #[must_use]
    pub fn success(target: &str, duration_secs: f64) -> Self {
        Self::new(target, CallStatus::Success, format!("Call {duration_secs:.1}s"))
    }

    /// A target that could not be resolved.
    #[must_use]
    pub fn not_found(target: &str) -> Self {
        Self::new(target, CallStatus::NotFound, "User not found".to_owned())
    }

    /// Converts a failed attempt into a result.
    #[must_use]
    pub fn from_error(target: &str, err: &TelegramError) -> Self {
        let status = CallStatus::from_error(err);
        match status {
            CallStatus::Privacy => Self::new(
                target,
                status,
                "Calls are restricted by privacy settings".to_owned(),
            ),
            CallStatus::NotFound => Self::not_found(target),
            CallStatus::FloodWait => {
                let seconds = match err {
                    TelegramError::FloodWait(seconds) => *seconds,
                    _ => 0,
                };
                let mut result = Self::new(target, status, format!("Wait {seconds}s"));
                result.wait_secs = Some(seconds);
                result
            }
            CallStatus::Success | CallStatus::Failed => Self::new(target, status, err.to_string()),
        }
    }

    /// Whether the call went through.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == CallStatus::Success
    }

    /// One console line for this result.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let message = if self.status == CallStatus::Failed {
            truncate(&self.message, 50)
        } else {
            self.message.clone()
        };
        format!("{} {}: {}", self.status.icon(), self.target, message)
    }

    /// The line one-shot mode prints for the `index`-th of `total` results:
    /// a JSON object when `json` is set, otherwise `[index/total] summary`.
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialized.
    pub fn report_line(
        &self,
        index: usize,
        total: usize,
        json: bool,
    ) -> Result<String, serde_json::Error> {
        if json {
            serde_json::to_string(self)
        } else {
            Ok(format!("[{index}/{total}] {}", self.summary_line()))
        }
    }
}

/// Per-status counts for a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub privacy: usize,
    pub not_found: usize,
    pub flood_wait: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Counts the results of a batch.
    #[must_use]
    pub fn from_results(results: &[CallResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            match result.status {
                CallStatus::Success => summary.success += 1,
                CallStatus::Privacy => summary.privacy += 1,
                CallStatus::NotFound => summary.not_found += 1,
                CallStatus::FloodWait => summary.flood_wait += 1,
                CallStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Count for a single status.
    #[must_use]
    pub const fn count(&self, status: CallStatus) -> usize {
        match status {
            CallStatus::Success => self.success,
            CallStatus::Privacy => self.privacy,
            CallStatus::NotFound => self.not_found,
            CallStatus::FloodWait => self.flood_wait,
            CallStatus::Failed => self.failed,
        }
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = CallStatus::ALL
            .into_iter()
            .filter(|&status| self.count(status) > 0)
            .map(|status| format!("{} {}", status.icon(), self.count(status)))
            .collect();
        write!(f, "{}/{} succeeded", self.success, self.total)?;
        if !parts.is_empty() {
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Truncates a string to a maximum length, adding "..." if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_strips_at() {
        assert_eq!(
            Target::parse("@durov"),
            Some(Target::Username("durov".to_owned()))
        );
        assert_eq!(
            Target::parse("  durov "),
            Some(Target::Username("durov".to_owned()))
        );
    }

    #[test]
    fn test_target_strips_only_one_at() {
        assert_eq!(
            Target::parse("@@odd"),
            Some(Target::Username("@odd".to_owned()))
        );
    }

    #[test]
    fn test_target_numeric_id() {
        assert_eq!(Target::parse("123456789"), Some(Target::Id(123_456_789)));
        assert_eq!(Target::parse("@42"), Some(Target::Id(42)));
    }

    #[test]
    fn test_target_overflowing_digits_is_username() {
        let raw = "99999999999999999999999";
        assert_eq!(Target::parse(raw), Some(Target::Username(raw.to_owned())));
    }

    #[test]
    fn test_target_empty() {
        assert_eq!(Target::parse(""), None);
        assert_eq!(Target::parse("   "), None);
        assert_eq!(Target::parse("@"), None);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Username("a".to_owned()).to_string(), "@a");
        assert_eq!(Target::Id(7).to_string(), "ID:7");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            CallStatus::from_error(&TelegramError::PrivacyRestricted),
            CallStatus::Privacy
        );
        assert_eq!(
            CallStatus::from_error(&TelegramError::NotFound("x".to_owned())),
            CallStatus::NotFound
        );
        assert_eq!(
            CallStatus::from_error(&TelegramError::FloodWait(30)),
            CallStatus::FloodWait
        );
        assert_eq!(
            CallStatus::from_error(&TelegramError::Invocation("timeout".to_owned())),
            CallStatus::Failed
        );
    }

    #[test]
    fn test_status_mapping_privacy_in_message() {
        let err = TelegramError::Invocation("rpc error 403: USER_PRIVACY_RESTRICTED".to_owned());
        assert_eq!(CallStatus::from_error(&err), CallStatus::Privacy);
    }

    #[test]
    fn test_result_from_flood_wait() {
        let result = CallResult::from_error("@a", &TelegramError::FloodWait(120));
        assert_eq!(result.status, CallStatus::FloodWait);
        assert_eq!(result.wait_secs, Some(120));
        assert_eq!(result.message, "Wait 120s");
    }

    #[test]
    fn test_result_success_message() {
        let result = CallResult::success("@a", 5.0);
        assert!(result.is_success());
        assert_eq!(result.message, "Call 5.0s");
        assert_eq!(result.summary_line(), "✅ @a: Call 5.0s");
    }

    #[test]
    fn test_failed_summary_is_truncated() {
        let long = "x".repeat(80);
        let result = CallResult::from_error("@a", &TelegramError::Invocation(long));
        assert_eq!(result.status, CallStatus::Failed);
        let line = result.summary_line();
        assert!(line.ends_with("..."));
        assert!(line.chars().count() < 80);
    }

    #[test]
    fn test_report_line() {
        let result = CallResult::success("@a", 5.0);
        assert_eq!(
            result.report_line(2, 3, false).unwrap(),
            "[2/3] ✅ @a: Call 5.0s"
        );

        let line = CallResult::from_error("@b", &TelegramError::PrivacyRestricted)
            .report_line(1, 1, true)
            .unwrap();
        assert!(!line.contains('\n'));
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["target"], "@b");
        assert_eq!(json["status"], "privacy");
        assert!(json["finished_at"].is_string());
    }

    #[test]
    fn test_result_json() {
        let result = CallResult::from_error("@a", &TelegramError::FloodWait(3));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "flood_wait");
        assert_eq!(json["wait_secs"], 3);
        assert_eq!(json["target"], "@a");

        let json = serde_json::to_value(CallResult::not_found("@b")).unwrap();
        assert_eq!(json["status"], "not_found");
        assert!(json.get("wait_secs").is_none());
    }

    #[test]
    fn test_batch_summary() {
        let results = vec![
            CallResult::success("@a", 1.0),
            CallResult::success("@b", 1.0),
            CallResult::not_found("@c"),
            CallResult::from_error("@d", &TelegramError::PrivacyRestricted),
        ];
        let summary = BatchSummary::from_results(&results);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.count(CallStatus::NotFound), 1);
        assert_eq!(summary.count(CallStatus::Privacy), 1);
        assert_eq!(summary.to_string(), "2/4 succeeded (✅ 2, 🔒 1, ❓ 1)");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello, World!", 5), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }
}
