use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Identity of a toast; allocated from a counter and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    pub duration: Duration,
}

/// Ordered set of active toasts, each expiring on its own timer.
///
/// All toasts are visible at once. Expiry timers are Tokio tasks kept in a
/// table keyed by [`ToastId`]; a timer that fires for a toast that is
/// already gone does nothing. Cloning yields another handle to the same
/// queue.
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    active: watch::Sender<Vec<Toast>>,
    timers: Mutex<HashMap<ToastId, JoinHandle<()>>>,
    next_id: AtomicU64,
    default_duration: Duration,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_default_duration(DEFAULT_TOAST_DURATION)
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                active: watch::Sender::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                default_duration,
            }),
        }
    }

    /// Display a toast and schedule its removal.
    ///
    /// `None` or a zero duration falls back to the queue default. Expiry is
    /// scheduled on the current Tokio runtime; outside a runtime the toast
    /// stays until removed explicitly.
    pub fn show(
        &self,
        kind: ToastKind,
        message: impl Into<String>,
        duration: Option<Duration>,
    ) -> ToastId {
        let id = ToastId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let duration = duration
            .filter(|d| !d.is_zero())
            .unwrap_or(self.inner.default_duration);
        let toast = Toast {
            id,
            kind,
            message: message.into(),
            duration,
        };

        tracing::debug!(
            "Showing {} toast {} for {:?}: {}",
            kind.as_str(),
            id,
            duration,
            toast.message
        );
        self.inner.active.send_modify(|active| active.push(toast));
        self.schedule_expiry(id, duration);
        id
    }

    fn schedule_expiry(&self, id: ToastId, duration: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No runtime available, toast {} will not expire", id);
            return;
        };

        let queue: Weak<QueueInner> = Arc::downgrade(&self.inner);
        // Hold the table lock across spawn so the timer cannot fire before
        // its handle is recorded.
        let mut timers = self.inner.timers.lock();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(queue) = queue.upgrade() {
                queue.expire(id);
            }
        });
        timers.insert(id, handle);
    }

    /// Dismiss a toast. Unknown or already removed ids are ignored.
    pub fn remove(&self, id: ToastId) {
        if let Some(handle) = self.inner.timers.lock().remove(&id) {
            handle.abort();
        }
        if self.inner.remove_toast(id) {
            tracing::debug!("Dismissed toast {}", id);
        }
    }

    /// Drop every active toast. Pending timers are left to fire harmlessly.
    pub fn clear(&self) {
        self.inner.active.send_if_modified(|active| {
            let had_toasts = !active.is_empty();
            active.clear();
            had_toasts
        });
    }

    pub fn success(&self, message: impl Into<String>, duration: Option<Duration>) -> ToastId {
        self.show(ToastKind::Success, message, duration)
    }

    pub fn error(&self, message: impl Into<String>, duration: Option<Duration>) -> ToastId {
        self.show(ToastKind::Error, message, duration)
    }

    pub fn warning(&self, message: impl Into<String>, duration: Option<Duration>) -> ToastId {
        self.show(ToastKind::Warning, message, duration)
    }

    pub fn info(&self, message: impl Into<String>, duration: Option<Duration>) -> ToastId {
        self.show(ToastKind::Info, message, duration)
    }

    pub fn active(&self) -> Vec<Toast> {
        self.inner.active.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.active.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.active.borrow().is_empty()
    }

    pub fn contains(&self, id: ToastId) -> bool {
        self.inner.active.borrow().iter().any(|toast| toast.id == id)
    }

    /// Receiver notified whenever the active set changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.inner.active.subscribe()
    }

    /// Timers not yet fired or cancelled
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueInner {
    fn expire(&self, id: ToastId) {
        self.timers.lock().remove(&id);
        if self.remove_toast(id) {
            tracing::debug!("Toast {} expired", id);
        }
    }

    fn remove_toast(&self, id: ToastId) -> bool {
        self.active
            .send_if_modified(|active| match active.iter().position(|t| t.id == id) {
                Some(index) => {
                    active.remove(index);
                    true
                }
                None => false,
            })
    }
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        for (_, handle) in self.timers.get_mut().drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn messages(queue: &NotificationQueue) -> Vec<String> {
        queue.active().into_iter().map(|t| t.message).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn toast_expires_after_its_duration() {
        let queue = NotificationQueue::new();
        let id = queue.info("x", Some(Duration::from_millis(100)));
        assert_eq!(queue.len(), 1);

        sleep(Duration::from_millis(150)).await;
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);

        queue.remove(id);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_display_concurrently_and_expire_independently() {
        let queue = NotificationQueue::new();
        queue.success("saved", Some(Duration::from_millis(500)));
        queue.error("failed", Some(Duration::from_millis(100)));
        queue.warning("careful", None);
        assert_eq!(messages(&queue), ["saved", "failed", "careful"]);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(messages(&queue), ["saved", "careful"]);

        sleep(Duration::from_millis(400)).await;
        assert_eq!(messages(&queue), ["careful"]);

        sleep(DEFAULT_TOAST_DURATION).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_uses_default() {
        let queue = NotificationQueue::with_default_duration(Duration::from_millis(250));
        queue.info("a", Some(Duration::ZERO));
        assert_eq!(queue.active()[0].duration, Duration::from_millis(250));

        sleep(Duration::from_millis(240)).await;
        assert_eq!(queue.len(), 1);
        sleep(Duration::from_millis(20)).await;
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remove_preserves_order_and_cancels_timer() {
        let queue = NotificationQueue::new();
        queue.info("first", None);
        let middle = queue.info("second", None);
        queue.info("third", None);

        queue.remove(middle);
        assert_eq!(messages(&queue), ["first", "third"]);
        assert_eq!(queue.pending_timers(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_unknown_id_is_noop() {
        let queue = NotificationQueue::new();
        queue.info("kept", None);
        let mut rx = queue.subscribe();
        rx.mark_unchanged();

        queue.remove(ToastId(42));
        assert_eq!(queue.len(), 1);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_never_reused() {
        let queue = NotificationQueue::new();
        let first = queue.info("a", None);
        queue.remove(first);
        let second = queue.info("b", None);
        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_after_clear_leaves_newer_toast() {
        let queue = NotificationQueue::new();
        queue.info("old", Some(Duration::from_millis(100)));
        queue.clear();
        assert!(queue.is_empty());

        let newer = queue.info("new", Some(Duration::from_millis(1000)));
        sleep(Duration::from_millis(150)).await;

        assert!(queue.contains(newer));
        assert_eq!(queue.pending_timers(), 1);
    }

    #[test]
    fn show_outside_runtime_keeps_toast() {
        let queue = NotificationQueue::new();
        let id = queue.info("no timer", None);
        assert!(queue.contains(id));
        assert_eq!(queue.pending_timers(), 0);
    }
}
