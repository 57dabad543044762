use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContractCall, Notification, ProviderEventKind, ProviderResponse, TargetNetwork};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

pub type EventHandler = Box<dyn Fn() + Send + Sync + 'static>;

/// Registration returned by [`WalletProvider::on`]. Dropping it unregisters the handler.
pub struct Subscription {
    event: ProviderEventKind,
    off: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Subscription {
    pub fn new(event: ProviderEventKind, off: impl FnOnce() + Send + 'static) -> Self {
        Self {
            event,
            off: Some(Box::new(off)),
        }
    }

    pub fn event(&self) -> ProviderEventKind {
        self.event
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(off) = self.off.take() {
            off();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("active", &self.off.is_some())
            .finish()
    }
}

/// Capability surface of the injected wallet.
///
/// Every call answers with the provider's response envelope. A `PortError` means the
/// call never produced an envelope at all (bridge down, provider refused the runtime).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn establish(&self, app_name: &str) -> Result<ProviderResponse, PortError>;
    async fn get_account(&self) -> Result<ProviderResponse, PortError>;
    async fn get_network(&self) -> Result<ProviderResponse, PortError>;
    async fn switch_network(&self, chain_id: &str) -> Result<ProviderResponse, PortError>;
    async fn add_network(&self, network: &TargetNetwork) -> Result<ProviderResponse, PortError>;
    async fn do_contract(&self, call: &ContractCall) -> Result<ProviderResponse, PortError>;

    /// `Ok(None)` when the provider has no event registration.
    fn on(
        &self,
        _event: ProviderEventKind,
        _handler: EventHandler,
    ) -> Result<Option<Subscription>, PortError> {
        Ok(None)
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}
