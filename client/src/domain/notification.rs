//! Process-wide notification bus.
//!
//! A single-slot ambient alert with auto-expiry. Posting replaces whatever is
//! shown and restarts the expiry timer; there is no history and no queue.
//! Subscribers watch the slot through a `tokio::sync::watch` receiver.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::AlertSink;

/// Time an alert stays visible unless replaced or dismissed.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(2000);

/// The alert currently occupying the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    message: String,
}

impl Notification {
    /// Alert text.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

struct BusInner {
    slot: watch::Sender<Option<Notification>>,
    expiry: Mutex<Option<JoinHandle<()>>>,
    generation: AtomicU64,
    ttl: Duration,
    closed: AtomicBool,
}

impl BusInner {
    fn lock_expiry(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.expiry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expire(&self, generation: u64) {
        let _guard = self.lock_expiry();
        if self.generation.load(Ordering::SeqCst) == generation {
            self.slot.send_replace(None);
        }
    }
}

impl Drop for BusInner {
    fn drop(&mut self) {
        let timer = self
            .expiry
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.abort();
        }
    }
}

/// Single-slot, self-expiring alert channel.
///
/// Cloning yields another handle to the same slot.
///
/// ## Invariants
/// - At most one message is observable at a time.
/// - Only the most recent post's timer may clear the slot.
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use dedup_client::domain::NotificationBus;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let bus = NotificationBus::new(Duration::from_secs(2));
/// bus.post("rate limit exceeded, try again later");
/// assert_eq!(
///     bus.current().map(|n| n.message().to_owned()).as_deref(),
///     Some("rate limit exceeded, try again later"),
/// );
/// bus.clear();
/// assert!(bus.current().is_none());
/// # }
/// ```
#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    /// Create an empty bus whose alerts expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        let (slot, _receiver) = watch::channel(None);
        Self {
            inner: Arc::new(BusInner {
                slot,
                expiry: Mutex::new(None),
                generation: AtomicU64::new(0),
                ttl,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Show `message`, replacing any current alert and restarting the timer.
    ///
    /// Outside a Tokio runtime the message is shown without an expiry timer
    /// and stays until [`NotificationBus::clear`] is called.
    pub fn post(&self, message: impl Into<String>) {
        if self.inner.closed.load(Ordering::SeqCst) {
            debug!("notification bus is shut down; dropping alert");
            return;
        }

        let mut expiry = self.inner.lock_expiry();
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.slot.send_replace(Some(Notification {
            message: message.into(),
        }));

        if let Some(previous) = expiry.take() {
            previous.abort();
        }
        *expiry = self.spawn_expiry(generation);
    }

    fn spawn_expiry(&self, generation: u64) -> Option<JoinHandle<()>> {
        let Ok(handle) = Handle::try_current() else {
            warn!("no async runtime available; alert will not auto-expire");
            return None;
        };
        let weak: Weak<BusInner> = Arc::downgrade(&self.inner);
        let ttl = self.inner.ttl;
        Some(handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(generation);
            }
        }))
    }

    /// Empty the slot and cancel the running timer.
    pub fn clear(&self) {
        let mut expiry = self.inner.lock_expiry();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(timer) = expiry.take() {
            timer.abort();
        }
        self.inner.slot.send_replace(None);
    }

    /// Snapshot of the current alert.
    pub fn current(&self) -> Option<Notification> {
        self.inner.slot.borrow().clone()
    }

    /// Watch the slot for changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.slot.subscribe()
    }

    /// Clear the slot and refuse further posts.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.clear();
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TTL)
    }
}

impl AlertSink for NotificationBus {
    fn post(&self, message: &str) {
        NotificationBus::post(self, message);
    }
}

#[cfg(test)]
mod tests {
    //! Timer behaviour runs on a paused clock so expiry is deterministic.
    use super::*;
    use tokio::time::sleep;

    fn message(bus: &NotificationBus) -> Option<String> {
        bus.current().map(|notification| notification.message().to_owned())
    }

    #[tokio::test(start_paused = true)]
    async fn alert_expires_after_ttl() {
        let bus = NotificationBus::default();
        bus.post("slow down");

        sleep(Duration::from_millis(1999)).await;
        assert_eq!(message(&bus).as_deref(), Some("slow down"));

        sleep(Duration::from_millis(2)).await;
        assert!(bus.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_post_replaces_message_and_restarts_timer() {
        let bus = NotificationBus::default();
        bus.post("first");
        sleep(Duration::from_millis(1000)).await;
        bus.post("second");

        // The first post's deadline passes without clearing the second.
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(message(&bus).as_deref(), Some("second"));

        sleep(Duration::from_millis(600)).await;
        assert!(bus.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_never_see_the_replaced_message_again() {
        let bus = NotificationBus::default();
        let mut receiver = bus.subscribe();
        bus.post("first");
        bus.post("second");

        receiver.changed().await.expect("bus alive");
        assert_eq!(
            receiver.borrow_and_update().as_ref().map(Notification::message),
            Some("second")
        );

        receiver.changed().await.expect("bus alive");
        assert!(receiver.borrow_and_update().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_the_timer() {
        let bus = NotificationBus::default();
        bus.post("dismiss me");
        bus.clear();
        assert!(bus.current().is_none());

        bus.post("fresh");
        sleep(Duration::from_millis(1000)).await;
        bus.clear();
        bus.post("after dismiss");
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(message(&bus).as_deref(), Some("after dismiss"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ignores_later_posts() {
        let bus = NotificationBus::default();
        bus.post("before");
        bus.shutdown();
        bus.post("after");
        assert!(bus.current().is_none());
    }

    #[test]
    fn post_without_runtime_keeps_message_until_cleared() {
        let bus = NotificationBus::default();
        AlertSink::post(&bus, "no runtime");
        assert_eq!(message(&bus).as_deref(), Some("no runtime"));
        bus.clear();
        assert!(bus.current().is_none());
    }
}
