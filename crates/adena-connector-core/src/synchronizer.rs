//! Background task keeping the session snapshot in step with the wallet.
//!
//! Lifecycle: poll for the provider binding, refresh once it shows up, then re-run the
//! refresh for every provider event or explicit request until torn down. Provider
//! events are turned into [`RefreshTrigger`] messages consumed by the single task, so
//! refreshes never nest inside provider callbacks.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{Notification, ProviderEventKind};
use crate::messages;
use crate::orchestrator::Orchestrator;
use crate::ports::{EventHandler, NotificationSink, Subscription};
use crate::session::{RefreshOutcome, Session};
use crate::state_machine::{sync_transition, SyncAction, SyncPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for DetectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Startup,
    AccountChanged,
    NetworkChanged,
    Requested,
}

impl From<ProviderEventKind> for RefreshTrigger {
    fn from(kind: ProviderEventKind) -> Self {
        match kind {
            ProviderEventKind::AccountChanged => Self::AccountChanged,
            ProviderEventKind::NetworkChanged => Self::NetworkChanged,
        }
    }
}

enum Detection {
    Found,
    Exhausted,
    Cancelled,
}

type SharedPhase = Arc<Mutex<SyncPhase>>;
type SharedSubscriptions = Arc<Mutex<Vec<Subscription>>>;

pub struct Synchronizer {
    orchestrator: Orchestrator,
    sink: Arc<dyn NotificationSink>,
    policy: DetectPolicy,
}

struct TaskContext {
    phase: SharedPhase,
    subscriptions: SharedSubscriptions,
    shutdown: watch::Receiver<bool>,
    refresh_tx: mpsc::UnboundedSender<RefreshTrigger>,
    refresh_rx: mpsc::UnboundedReceiver<RefreshTrigger>,
}

impl Synchronizer {
    pub fn new(
        orchestrator: Orchestrator,
        sink: Arc<dyn NotificationSink>,
        policy: DetectPolicy,
    ) -> Self {
        Self {
            orchestrator,
            sink,
            policy,
        }
    }

    /// Starts the task on the current tokio runtime.
    pub fn spawn(self) -> SyncHandle {
        let (shutdown_tx, shutdown) = watch::channel(false);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let phase: SharedPhase = Arc::new(Mutex::new(SyncPhase::Detecting));
        let subscriptions: SharedSubscriptions = Arc::new(Mutex::new(Vec::new()));
        let session = self.orchestrator.session().clone();

        let ctx = TaskContext {
            phase: Arc::clone(&phase),
            subscriptions: Arc::clone(&subscriptions),
            shutdown,
            refresh_tx: refresh_tx.clone(),
            refresh_rx,
        };
        let task = tokio::spawn(self.run(ctx));

        SyncHandle {
            session,
            phase,
            subscriptions,
            refresh_tx,
            shutdown_tx,
            task: Some(task),
        }
    }

    async fn run(self, ctx: TaskContext) {
        let TaskContext {
            phase,
            subscriptions,
            mut shutdown,
            refresh_tx,
            mut refresh_rx,
        } = ctx;

        match self.detect(&mut shutdown).await {
            Detection::Found => {}
            Detection::Exhausted => {
                advance(&phase, SyncAction::DetectionExhausted);
                if self.session().mark_unavailable() {
                    self.sink
                        .notify(Notification::failed(messages::PROVIDER_NOT_INSTALLED));
                }
                return;
            }
            Detection::Cancelled => return,
        }

        advance(&phase, SyncAction::ProviderDetected);
        self.session().set_installed(true);
        self.subscribe(&refresh_tx, &subscriptions);
        drop(refresh_tx);

        self.refresh(RefreshTrigger::Startup, &phase).await;

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                trigger = refresh_rx.recv() => match trigger {
                    Some(trigger) => {
                        // a burst of events collapses into one refresh
                        let mut coalesced = 0usize;
                        while refresh_rx.try_recv().is_ok() {
                            coalesced += 1;
                        }
                        if coalesced > 0 {
                            debug!(?trigger, coalesced, "dropped queued refresh triggers");
                        }
                        self.refresh(trigger, &phase).await
                    }
                    None => break,
                },
            }
        }

        let remaining = std::mem::take(&mut *lock(&subscriptions));
        drop(remaining);
        debug!("synchronizer stopped");
    }

    /// Bounded poll for the provider binding.
    async fn detect(&self, shutdown: &mut watch::Receiver<bool>) -> Detection {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            if *shutdown.borrow() {
                return Detection::Cancelled;
            }
            if self.orchestrator.handle().is_installed() {
                debug!(attempt, "provider binding found");
                return Detection::Found;
            }
            attempt += 1;
            if attempt >= max_attempts {
                info!(attempts = attempt, "wallet provider not detected, giving up");
                return Detection::Exhausted;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Detection::Cancelled;
                    }
                }
            }
        }
    }

    fn subscribe(
        &self,
        refresh_tx: &mpsc::UnboundedSender<RefreshTrigger>,
        subscriptions: &SharedSubscriptions,
    ) {
        let provider = match self.orchestrator.handle().get() {
            Ok(provider) => provider,
            Err(e) => {
                warn!(error = %e, "provider vanished before event registration");
                return;
            }
        };

        for event in [ProviderEventKind::AccountChanged, ProviderEventKind::NetworkChanged] {
            let tx = refresh_tx.clone();
            let handler: EventHandler = Box::new(move || {
                let _ = tx.send(RefreshTrigger::from(event));
            });
            match provider.on(event, handler) {
                Ok(Some(subscription)) => {
                    let mut g = lock(subscriptions);
                    if self.session().is_closed() {
                        drop(g);
                        subscription.unsubscribe();
                    } else {
                        g.push(subscription);
                    }
                }
                Ok(None) => debug!(event = event.event_name(), "provider has no event registration"),
                Err(e) => warn!(event = event.event_name(), error = %e, "event registration failed"),
            }
        }
    }

    /// Fetches account and network side by side and publishes both in one write.
    /// Either fetch may fail on its own; the session then degrades instead of erroring.
    async fn refresh(&self, trigger: RefreshTrigger, phase: &SharedPhase) {
        if self.session().is_closed() {
            return;
        }
        advance(phase, SyncAction::RefreshStart);
        if trigger != RefreshTrigger::Startup {
            self.session().set_loading(true);
        }

        let (account, network) = tokio::join!(
            self.orchestrator.get_account(),
            self.orchestrator.get_network()
        );
        let account = account
            .inspect_err(|e| debug!(?trigger, error = %e, "account fetch failed during refresh"))
            .ok();
        let network = network
            .inspect_err(|e| debug!(?trigger, error = %e, "network fetch failed during refresh"))
            .ok();

        let target = &self.orchestrator.target().chain_id;
        let outcome = RefreshOutcome { account, network };
        let consistent = outcome.is_consistent(target);
        if !self.session().publish_refresh(outcome, target) {
            debug!(?trigger, "refresh resolved after teardown, discarded");
            return;
        }
        let action = if consistent {
            SyncAction::RefreshConsistent
        } else {
            SyncAction::RefreshInconsistent
        };
        advance(phase, action);
        debug!(?trigger, consistent, "session refreshed");
    }

    fn session(&self) -> &Session {
        self.orchestrator.session()
    }
}

/// Owner side of a running synchronizer. Dropping it tears the session down.
pub struct SyncHandle {
    session: Session,
    phase: SharedPhase,
    subscriptions: SharedSubscriptions,
    refresh_tx: mpsc::UnboundedSender<RefreshTrigger>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn phase(&self) -> SyncPhase {
        *lock(&self.phase)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Queues a refresh; `false` once the task has stopped.
    pub fn request_refresh(&self) -> bool {
        !self.session.is_closed() && self.refresh_tx.send(RefreshTrigger::Requested).is_ok()
    }

    /// Raises the cancellation flag, unregisters both event handlers and stops the task.
    /// In-flight refreshes finish on their own but their writes are dropped.
    pub fn teardown(&self) {
        self.session.close();
        let subscriptions = std::mem::take(&mut *lock(&self.subscriptions));
        drop(subscriptions);
        self.shutdown_tx.send_replace(true);
        if !self.phase().is_terminal() {
            advance(&self.phase, SyncAction::Teardown);
        }
    }

    /// Waits for the task to exit (provider never detected, or after teardown).
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "synchronizer task failed");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn advance(phase: &Mutex<SyncPhase>, action: SyncAction) -> bool {
    let mut g = lock(phase);
    match sync_transition(*g, action) {
        Ok(t) => {
            debug!(from = ?t.from, to = ?t.to, reason = t.reason, "sync transition");
            *g = t.to;
            true
        }
        Err(e) => {
            if *g != SyncPhase::TornDown {
                warn!(error = %e, "sync transition rejected");
            }
            false
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}
