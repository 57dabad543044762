pub mod account;
pub mod domain;
pub mod error;
pub mod messages;
pub mod orchestrator;
pub mod ports;
pub mod provider_handle;
pub mod session;
pub mod state_machine;
pub mod synchronizer;
pub mod transfer;
pub mod units;
pub mod validator;

pub use domain::{
    Account, ContractCall, ContractMessage, MsgSendValue, NetworkInfo, Notification,
    NotificationKind, ProviderEventKind, ProviderResponse, SessionState, TargetNetwork,
    TransferReceipt, BASE_DENOM, BASE_UNITS_PER_DISPLAY,
};
pub use error::{AppError, ErrorCode};
pub use orchestrator::Orchestrator;
pub use ports::{EventHandler, NotificationSink, PortError, Subscription, WalletProvider};
pub use provider_handle::ProviderHandle;
pub use session::{RefreshOutcome, Session};
pub use state_machine::{sync_transition, StateTransition, SyncAction, SyncPhase, TransitionError};
pub use synchronizer::{DetectPolicy, RefreshTrigger, SyncHandle, Synchronizer};
pub use transfer::classify_transfer;
pub use units::{strip_denom, to_base_units, UnitError};
pub use validator::is_success;
