use tracing::{debug, info, warn};

use crate::domain::{NetworkInfo, ProviderResponse, TargetNetwork};
use crate::error::AppError;
use crate::ports::WalletProvider;
use crate::provider_handle::ProviderHandle;
use crate::session::Session;
use crate::validator::is_success;

/// Entry point for every user-triggered wallet operation.
///
/// Cheap to clone: the provider handle and the session are shared.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    pub(crate) handle: ProviderHandle,
    pub(crate) session: Session,
    pub(crate) target: TargetNetwork,
    pub(crate) app_name: String,
}

impl Orchestrator {
    pub fn new(
        handle: ProviderHandle,
        session: Session,
        target: TargetNetwork,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            handle,
            session,
            target,
            app_name: app_name.into(),
        }
    }

    pub fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn target(&self) -> &TargetNetwork {
        &self.target
    }

    /// Establishes the session, then moves the wallet onto the target network.
    ///
    /// The connected flag is raised as soon as the wallet authorizes the app; the
    /// synchronizer demotes it again if the network never lines up.
    pub async fn connect(&self) -> Result<ProviderResponse, AppError> {
        let provider = self.handle.get()?;

        debug!(app = %self.app_name, "establishing wallet session");
        let establish = provider.establish(&self.app_name).await.map_err(|e| {
            AppError::connection_failed()
                .with_dev(format!("AddEstablish transport failure: {e}"))
                .with_cause(e)
        })?;

        if is_success(Some(&establish)) {
            self.session.set_connected(true);
        } else if establish.message_contains("already") {
            debug!("wallet reports an existing session");
            self.session.set_connected(true);
        } else {
            self.session.set_connected(false);
            let detail = establish
                .message
                .clone()
                .unwrap_or_else(|| format!("AddEstablish returned code {}", establish.code));
            return Err(AppError::connection_failed().with_dev(detail));
        }

        self.ensure_target_network(provider.as_ref()).await?;
        Ok(establish)
    }

    pub async fn get_network(&self) -> Result<NetworkInfo, AppError> {
        let provider = self.handle.get()?;
        fetch_network(provider.as_ref()).await
    }

    pub async fn switch_network(&self, chain_id: &str) -> Result<(), AppError> {
        let provider = self.handle.get()?;
        switch_to(provider.as_ref(), chain_id).await
    }

    /// Registers the configured target network with the wallet.
    pub async fn add_network(&self) -> Result<(), AppError> {
        let provider = self.handle.get()?;
        register(provider.as_ref(), &self.target).await
    }

    async fn ensure_target_network(&self, provider: &dyn WalletProvider) -> Result<(), AppError> {
        let current = fetch_network(provider).await?;
        if current.chain_id == self.target.chain_id {
            return Ok(());
        }

        info!(
            from = %current.chain_id,
            to = %self.target.chain_id,
            "wallet on foreign network, switching"
        );
        let first = match switch_to(provider, &self.target.chain_id).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        warn!(
            detail = first.dev_message.as_deref().unwrap_or_default(),
            "switch failed, registering target network"
        );
        let registration = register(provider, &self.target).await.err();
        if let Some(ref err) = registration {
            warn!(
                detail = err.dev_message.as_deref().unwrap_or_default(),
                "target network registration failed"
            );
        }

        switch_to(provider, &self.target.chain_id).await.map_err(|retry| {
            let mut detail = format!(
                "switch to {} failed twice: first={}, retry={}",
                self.target.chain_id,
                first.dev_message.as_deref().unwrap_or("-"),
                retry.dev_message.as_deref().unwrap_or("-"),
            );
            if let Some(err) = registration {
                detail.push_str(&format!(
                    ", registration={}",
                    err.dev_message.as_deref().unwrap_or("-")
                ));
            }
            AppError::network_switch_failed().with_dev(detail).with_cause(retry)
        })
    }
}

pub(crate) async fn fetch_network(provider: &dyn WalletProvider) -> Result<NetworkInfo, AppError> {
    let resp = provider.get_network().await.map_err(|e| {
        AppError::network_fetch_failed()
            .with_dev(format!("GetNetwork transport failure: {e}"))
            .with_cause(e)
    })?;
    if !is_success(Some(&resp)) {
        return Err(AppError::network_fetch_failed().with_dev(describe("GetNetwork", &resp)));
    }
    let chain_id = resp.data_str("chainId").ok_or_else(|| {
        AppError::network_fetch_failed().with_dev("GetNetwork response has no chainId")
    })?;
    Ok(NetworkInfo {
        chain_id: chain_id.to_owned(),
    })
}

async fn switch_to(provider: &dyn WalletProvider, chain_id: &str) -> Result<(), AppError> {
    let resp = provider.switch_network(chain_id).await.map_err(|e| {
        AppError::network_switch_failed()
            .with_dev(format!("SwitchNetwork({chain_id}) transport failure: {e}"))
            .with_cause(e)
    })?;
    if !is_success(Some(&resp)) {
        return Err(AppError::network_switch_failed().with_dev(describe("SwitchNetwork", &resp)));
    }
    Ok(())
}

async fn register(provider: &dyn WalletProvider, network: &TargetNetwork) -> Result<(), AppError> {
    let resp = provider.add_network(network).await.map_err(|e| {
        AppError::network_switch_failed()
            .with_dev(format!("AddNetwork({}) transport failure: {e}", network.chain_id))
            .with_cause(e)
    })?;
    if !is_success(Some(&resp)) {
        return Err(AppError::network_switch_failed().with_dev(describe("AddNetwork", &resp)));
    }
    Ok(())
}

pub(crate) fn describe(method: &str, resp: &ProviderResponse) -> String {
    match resp.message.as_deref() {
        Some(msg) if !msg.is_empty() => format!("{method} returned code {}: {msg}", resp.code),
        _ => format!("{method} returned code {}", resp.code),
    }
}
