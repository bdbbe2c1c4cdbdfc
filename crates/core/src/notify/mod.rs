//! Fire-and-forget user-facing notifications.
//!
//! Any component can [`Notifier::push`] a message without coordinating
//! display state; consumers render [`Notifier::snapshot`] in insertion
//! order. Entries retract themselves after a fixed delay whether or not
//! anything consumed them. There is deliberately no early-dismiss API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// How long a toast stays visible.
pub const TOAST_TTL: Duration = Duration::from_millis(3000);

/// Visual flavour of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    Info,
    Success,
    Error,
}

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Identifier unique within the owning [`Notifier`].
    pub id: u64,
    pub message: String,
    pub variant: ToastVariant,
}

struct Entry {
    toast: Toast,
    expires_at: Instant,
}

struct Inner {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    ttl: Duration,
    changed: watch::Sender<u64>,
}

/// Handle to a notification queue. Cheap to clone; all clones share the
/// same queue and id counter.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Inner>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    /// Create a queue with the standard 3 s retraction delay.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(TOAST_TTL)
    }

    /// Create a queue with a custom retraction delay.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                ttl,
                changed,
            }),
        }
    }

    /// Enqueue a message and schedule its retraction.
    ///
    /// Returns the assigned id. When called inside a Tokio runtime the
    /// retraction fires proactively; otherwise expired entries are swept
    /// on the next [`Notifier::snapshot`].
    pub fn push(&self, message: impl Into<String>, variant: ToastVariant) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let expires_at = Instant::now() + self.inner.ttl;
        {
            let mut entries = lock(&self.inner.entries);
            entries.push(Entry {
                toast: Toast {
                    id,
                    message: message.into(),
                    variant,
                },
                expires_at,
            });
        }
        self.inner.changed.send_modify(|v| *v += 1);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let weak = Arc::downgrade(&self.inner);
            let ttl = self.inner.ttl;
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                retract(&weak, id);
            });
        }
        id
    }

    /// Shorthand for an informational toast.
    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.push(message, ToastVariant::Info)
    }

    /// Shorthand for a success toast.
    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.push(message, ToastVariant::Success)
    }

    /// Shorthand for an error toast.
    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.push(message, ToastVariant::Error)
    }

    /// The live queue in insertion order, with expired entries swept.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut entries = lock(&self.inner.entries);
        entries.retain(|e| e.expires_at > now);
        entries.iter().map(|e| e.toast.clone()).collect()
    }

    /// Watch channel bumped whenever the queue changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changed.subscribe()
    }
}

fn lock(entries: &Mutex<Vec<Entry>>) -> MutexGuard<'_, Vec<Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drop one entry by id. Holds only a weak handle so a scheduled
/// retraction never keeps a discarded queue alive.
fn retract(inner: &Weak<Inner>, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let removed = {
        let mut entries = lock(&inner.entries);
        let before = entries.len();
        entries.retain(|e| e.toast.id != id);
        entries.len() != before
    };
    if removed {
        inner.changed.send_modify(|v| *v += 1);
    }
}
