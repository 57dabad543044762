use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::{Account, NetworkInfo, SessionState};

/// Observable session snapshot plus the cancellation flag guarding every write.
///
/// All writers go through [`Session::update`]: once the session is closed each write is
/// dropped, so a refresh that resolves after teardown cannot touch the snapshot.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    state: watch::Sender<SessionState>,
    closed: Mutex<bool>,
}

/// Result of one joint account + network fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub account: Option<Account>,
    pub network: Option<NetworkInfo>,
}

impl RefreshOutcome {
    /// Account fetched successfully and the wallet sits on `target_chain`.
    pub fn is_consistent(&self, target_chain: &str) -> bool {
        self.account.is_some()
            && self
                .network
                .as_ref()
                .map(|n| n.chain_id == target_chain)
                .unwrap_or(false)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(SessionInner {
                state,
                closed: Mutex::new(false),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_guard()
    }

    /// Sets the cancellation flag. Idempotent.
    pub fn close(&self) {
        *self.closed_guard() = true;
    }

    /// Applies `f` unless the session is closed. Returns whether the write happened.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) -> bool {
        let closed = self.closed_guard();
        if *closed {
            tracing::debug!("session closed, dropping state write");
            return false;
        }
        self.inner.state.send_modify(f);
        true
    }

    pub fn set_installed(&self, installed: bool) -> bool {
        self.update(|s| s.is_installed = installed)
    }

    pub fn set_loading(&self, loading: bool) -> bool {
        self.update(|s| s.is_loading = loading)
    }

    pub fn set_connected(&self, connected: bool) -> bool {
        self.update(|s| {
            s.is_connected = connected;
            if !connected {
                s.account = None;
            }
        })
    }

    /// Detection gave up: the wallet is not installed and nothing is loading anymore.
    pub fn mark_unavailable(&self) -> bool {
        self.update(|s| {
            s.is_installed = false;
            s.is_connected = false;
            s.is_loading = false;
            s.account = None;
            s.network = None;
        })
    }

    /// Publishes a refresh as a single write. Account data is only kept when the
    /// wallet is on `target_chain`; otherwise the session is demoted to disconnected.
    pub fn publish_refresh(&self, outcome: RefreshOutcome, target_chain: &str) -> bool {
        let consistent = outcome.is_consistent(target_chain);
        self.update(move |s| {
            s.network = outcome.network;
            s.is_connected = consistent;
            s.account = if consistent { outcome.account } else { None };
            s.is_loading = false;
        })
    }

    fn closed_guard(&self) -> MutexGuard<'_, bool> {
        match self.inner.closed.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
