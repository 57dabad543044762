use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use adena_connector_core::{Notification, NotificationKind, NotificationSink};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub id: u64,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Bounded in-memory toast list. Pushing past the cap evicts the oldest entry.
#[derive(Debug)]
pub struct ToastQueue {
    max: usize,
    inner: Mutex<ToastsInner>,
}

#[derive(Debug, Default)]
struct ToastsInner {
    next_id: u64,
    toasts: VecDeque<Toast>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ToastQueue {
    pub fn new(max: usize) -> Self {
        Self {
            max: max.max(1),
            inner: Mutex::new(ToastsInner::default()),
        }
    }

    pub fn push(&self, notification: Notification) -> u64 {
        let mut g = self.lock();
        g.next_id += 1;
        let id = g.next_id;
        g.toasts.push_back(Toast { id, notification });
        while g.toasts.len() > self.max {
            g.toasts.pop_front();
        }
        id
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut g = self.lock();
        let before = g.toasts.len();
        g.toasts.retain(|t| t.id != id);
        g.toasts.len() != before
    }

    pub fn clear(&self) {
        self.lock().toasts.clear();
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().toasts.iter().cloned().collect()
    }

    pub fn drain(&self) -> Vec<Toast> {
        self.lock().toasts.drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<'_, ToastsInner> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl NotificationSink for ToastQueue {
    fn notify(&self, notification: Notification) {
        self.push(notification);
    }
}

/// Writes notifications to the log instead of showing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationSink;

impl NotificationSink for TracingNotificationSink {
    fn notify(&self, notification: Notification) {
        let title = notification.title.as_deref().unwrap_or_default();
        match notification.kind {
            NotificationKind::Success => info!(%title, message = %notification.message, "notification"),
            NotificationKind::Failed => warn!(%title, message = %notification.message, "notification"),
        }
    }
}
