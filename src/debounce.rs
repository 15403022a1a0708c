//! Debounced values.
//!
//! A [`Debouncer`] accepts a stream of submitted values and only publishes one
//! once no newer value has arrived for the configured quiet period. Each
//! submission cancels the timer of the previous one; dropping the debouncer
//! cancels whatever is still pending, so nothing is published afterwards.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Quiet period used by the storefront search box.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Debouncer<T> {
    delay: Duration,
    stable: Arc<watch::Sender<T>>,
    pending: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl<T> std::fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T, delay: Duration) -> Self {
        let (stable, _) = watch::channel(initial);
        Self {
            delay,
            stable: Arc::new(stable),
            pending: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Submit a new value, restarting the quiet period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, value: T) {
        let token = self.shutdown.child_token();
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let stable = Arc::clone(&self.stable);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::trace!("debounced value superseded");
                }
                () = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        stable.send_replace(value);
                    }
                }
            }
        });
    }

    /// The most recent value that survived a full quiet period.
    pub fn latest(&self) -> T {
        self.stable.borrow().clone()
    }

    /// Receiver notified every time a value becomes stable.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.stable.subscribe()
    }

    /// Drop any pending value without publishing it.
    pub fn cancel(&self) {
        if let Some(pending) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pending.cancel();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    const DELAY: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn publishes_after_quiet_period() {
        let debouncer = Debouncer::new(String::new(), DELAY);

        debouncer.submit("lamp".to_string());
        tokio::time::sleep(Duration::from_millis(299)).await;
        check!(debouncer.latest() == "");

        tokio::time::sleep(Duration::from_millis(2)).await;
        check!(debouncer.latest() == "lamp");
    }

    #[tokio::test(start_paused = true)]
    async fn newer_submission_supersedes_pending_one() {
        let debouncer = Debouncer::new(String::new(), DELAY);
        let mut updates = debouncer.subscribe();

        debouncer.submit("l".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.submit("la".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.submit("lamp".to_string());

        updates.changed().await.unwrap();
        check!(*updates.borrow_and_update() == "lamp");

        tokio::time::sleep(Duration::from_secs(1)).await;
        check!(!updates.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_cancel_discards_pending_value() {
        let debouncer = Debouncer::new(0_u32, DELAY);

        debouncer.submit(7);
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        check!(debouncer.latest() == 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels_pending_value() {
        let debouncer = Debouncer::new(String::from("initial"), DELAY);
        let updates = debouncer.subscribe();

        debouncer.submit("stale".to_string());
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(1)).await;

        check!(*updates.borrow() == "initial");
    }
}
