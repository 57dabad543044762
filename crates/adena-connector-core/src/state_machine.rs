use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    Detecting,
    Unavailable,
    Available,
    Syncing,
    Synced,
    Desynced,
    TornDown,
}

impl SyncPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Unavailable | Self::TornDown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    ProviderDetected,
    DetectionExhausted,
    RefreshStart,
    RefreshConsistent,
    RefreshInconsistent,
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SyncPhase,
    pub to: SyncPhase,
    pub reason: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal sync transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: SyncPhase,
    pub action: SyncAction,
}

pub fn sync_transition(from: SyncPhase, action: SyncAction) -> Result<StateTransition, TransitionError> {
    use SyncAction as A;
    use SyncPhase as P;

    let (to, reason) = match (from, action) {
        (P::Detecting, A::ProviderDetected) => (P::Available, "provider binding detected"),
        (P::Detecting, A::DetectionExhausted) => (P::Unavailable, "provider never appeared"),
        (P::Available | P::Synced | P::Desynced, A::RefreshStart) => (P::Syncing, "refresh started"),
        // an event can land while an earlier refresh is still running
        (P::Syncing, A::RefreshStart) => (P::Syncing, "overlapping refresh"),
        (P::Syncing, A::RefreshConsistent) => (P::Synced, "account on target network"),
        (P::Syncing, A::RefreshInconsistent) => (P::Desynced, "no account on target network"),
        (p, A::Teardown) if !p.is_terminal() => (P::TornDown, "session torn down"),
        _ => return Err(TransitionError { from, action }),
    };
    Ok(StateTransition { from, to, reason })
}
