//! Operator interrupt shared between the signal handler and the dialer.

use std::sync::Arc;

use tokio::sync::watch;

/// A one-way switch: once triggered it stays triggered.
///
/// Clones share the same switch.
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { flag: Arc::new(tx) }
    }

    /// Flips the switch and wakes everything waiting on it.
    pub fn trigger(&self) {
        self.flag.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the switch has been flipped.
    pub async fn triggered(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|&on| on).await;
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_trigger_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let other = interrupt.clone();
        assert!(!other.is_triggered());

        interrupt.trigger();
        assert!(other.is_triggered());
    }

    #[tokio::test]
    async fn test_triggered_wakes_waiter() {
        let interrupt = Interrupt::new();
        let trigger = interrupt.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        tokio::time::timeout(Duration::from_secs(5), interrupt.triggered())
            .await
            .expect("waiter should wake up");
    }

    #[tokio::test]
    async fn test_triggered_returns_at_once_when_already_set() {
        let interrupt = Interrupt::new();
        interrupt.trigger();

        tokio::time::timeout(Duration::from_millis(100), interrupt.triggered())
            .await
            .expect("already triggered");
    }
}
