//! The per-target call routine.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{CallBackend, CallResult, Interrupt, Target};
use crate::config::CallerSettings;
use crate::telegram::{DhParams, RateLimiter, TelegramError};

/// Places calls one at a time through a [`CallBackend`].
#[derive(Debug)]
pub struct Dialer<B> {
    backend: B,

    /// Keeps consecutive calls apart.
    pacer: RateLimiter,

    /// Pause between the pre-call message and the call.
    message_delay: Duration,

    /// Cuts a ring short; the call is still hung up.
    interrupt: Interrupt,
}

impl<B: CallBackend> Dialer<B> {
    /// Creates a dialer using the timing from `settings`.
    pub fn new(backend: B, settings: &CallerSettings) -> Self {
        Self::with_timing(
            backend,
            Duration::try_from_secs_f64(settings.call_delay_secs).unwrap_or_default(),
            Duration::from_millis(settings.message_delay_ms),
        )
    }

    /// Creates a dialer with explicit delays.
    pub fn with_timing(backend: B, call_delay: Duration, message_delay: Duration) -> Self {
        Self {
            backend,
            pacer: RateLimiter::new(call_delay),
            message_delay,
            interrupt: Interrupt::new(),
        }
    }

    /// Handle that stops the current ring early and any remaining batch
    /// targets.
    #[must_use]
    pub fn interrupt(&self) -> Interrupt {
        self.interrupt.clone()
    }

    #[cfg(test)]
    const fn backend(&self) -> &B {
        &self.backend
    }

    /// Calls one target and reports the outcome.
    ///
    /// Never fails: every error is converted into the result's status.
    pub async fn call(&self, raw: &str, ring_secs: f64, message: Option<&str>) -> CallResult {
        self.pacer.wait_turn().await;
        let result = self.place_call(raw, ring_secs, message).await;
        self.pacer.mark_used().await;

        info!("{}: {} ({})", result.target, result.status, result.message);
        result
    }

    /// Calls targets in order, with the configured gap between them.
    ///
    /// `on_result` receives the 1-based position and the result of each call
    /// as soon as it finishes. Targets after an interrupt are not called.
    pub async fn call_multiple<S: AsRef<str>>(
        &self,
        targets: &[S],
        ring_secs: f64,
        message: Option<&str>,
        mut on_result: impl FnMut(usize, &CallResult),
    ) -> Vec<CallResult> {
        let mut results = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            if self.interrupt.is_triggered() {
                info!("Interrupted, skipping {} remaining target(s)", targets.len() - i);
                break;
            }
            debug!("[{}/{}] {}", i + 1, targets.len(), target.as_ref());
            let result = self.call(target.as_ref(), ring_secs, message).await;
            on_result(i + 1, &result);
            results.push(result);
        }
        results
    }

    async fn place_call(&self, raw: &str, ring_secs: f64, message: Option<&str>) -> CallResult {
        let Some(target) = Target::parse(raw) else {
            return CallResult::not_found(raw);
        };

        let ring = Duration::try_from_secs_f64(ring_secs).unwrap_or_default();
        match self.ring(&target, ring, message).await {
            Ok(rang) => CallResult::success(raw, rang.as_secs_f64()),
            Err(e) => {
                debug!("Call to {} failed: {}", target, e);
                CallResult::from_error(raw, &e)
            }
        }
    }

    async fn ring(
        &self,
        target: &Target,
        ring: Duration,
        message: Option<&str>,
    ) -> Result<Duration, TelegramError> {
        let user = self.backend.resolve(target).await?;

        if let Some(text) = message.filter(|t| !t.trim().is_empty()) {
            self.backend.send_message(&user, text).await?;
            tokio::time::sleep(self.message_delay).await;
        }

        let dh = DhParams::generate();
        let call = self.backend.request_call(&user, &dh).await?;
        info!("Calling {} for {:.1}s", user.display(), ring.as_secs_f64());

        let started = Instant::now();
        tokio::select! {
            () = tokio::time::sleep(ring) => {}
            () = self.interrupt.triggered() => {
                info!("Interrupted, hanging up on {}", user.display());
            }
        }
        let rang = started.elapsed().min(ring);

        // The call already rang; a failed hangup doesn't change the outcome.
        if let Err(e) = self.backend.discard_call(call).await {
            warn!("Ignoring failed hangup for {}: {}", user.display(), e);
        }

        Ok(rang)
    }
}
