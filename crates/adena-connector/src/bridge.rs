//! Bridge between the command-line shell and the connector crates.
//! This must remain the only shell-facing boundary for wallet operations.

use std::sync::Arc;

use serde::Serialize;

use adena_connector_adapters::{
    AdenaAdapter, ConnectorConfig, Toast, ToastQueue, TracingNotificationSink,
};
use adena_connector_core::{
    is_success, messages, AppError, ErrorCode, Notification, NotificationSink, Orchestrator,
    ProviderHandle, Session, SessionState, SyncHandle, Synchronizer, TransferReceipt,
};

/// Page-level state the shell renders next to the session snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPanel {
    pub address: Option<String>,
    pub balance: Option<String>,
    pub is_loading_address: bool,
    pub is_loading_balance: bool,
    pub recipient: String,
    pub amount: String,
    pub is_sending: bool,
    pub last_error: Option<String>,
    pub last_tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BridgeReport {
    pub session: SessionState,
    pub panel: WalletPanel,
    pub notifications: Vec<Toast>,
}

/// Logs every notification and keeps it for the report.
#[derive(Debug)]
struct ShellSink {
    toasts: Arc<ToastQueue>,
}

impl NotificationSink for ShellSink {
    fn notify(&self, notification: Notification) {
        TracingNotificationSink.notify(notification.clone());
        self.toasts.notify(notification);
    }
}

pub struct WalletBridge {
    orchestrator: Orchestrator,
    sync: SyncHandle,
    sink: Arc<ShellSink>,
    panel: WalletPanel,
}

impl WalletBridge {
    /// Binds `adapter` and starts the session synchronizer. Needs a tokio runtime.
    pub fn new(config: &ConnectorConfig, adapter: AdenaAdapter) -> Self {
        let orchestrator = Orchestrator::new(
            ProviderHandle::installed(Arc::new(adapter)),
            Session::new(),
            config.target_network(),
            config.app_name.clone(),
        );
        let sink = Arc::new(ShellSink {
            toasts: Arc::new(ToastQueue::new(config.toast_max)),
        });
        let sync =
            Synchronizer::new(orchestrator.clone(), sink.clone(), config.detect_policy()).spawn();
        Self {
            orchestrator,
            sync,
            sink,
            panel: WalletPanel::default(),
        }
    }

    pub fn panel(&self) -> &WalletPanel {
        &self.panel
    }

    pub fn session(&self) -> SessionState {
        self.orchestrator.session().snapshot()
    }

    /// Resolves once the synchronizer finished detection and its first refresh.
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.orchestrator.session().subscribe();
        let settled = rx.wait_for(|s| !s.is_loading).await.map(|s| s.clone());
        settled.unwrap_or_else(|_| self.session())
    }

    pub async fn connect(&mut self) -> Result<(), AppError> {
        let result = self.orchestrator.connect().await;
        self.sync.request_refresh();
        match result {
            Ok(resp) if is_success(Some(&resp)) => {
                self.notify(Notification::success(messages::WALLET_CONNECTED));
                Ok(())
            }
            // existing session, nothing to announce
            Ok(_) => Ok(()),
            Err(err) => {
                self.panel.address = None;
                self.panel.last_error = Some(err.user_message.clone());
                self.notify(Notification::failed(err.user_message.clone()));
                Err(err)
            }
        }
    }

    pub async fn load_address(&mut self) -> Result<String, AppError> {
        self.panel.is_loading_address = true;
        let result = self.orchestrator.get_address().await;
        self.panel.is_loading_address = false;
        match result {
            Ok(address) => {
                self.panel.address = Some(address.clone());
                self.notify(Notification::success(messages::ADDRESS_LOADED));
                Ok(address)
            }
            Err(err) => {
                self.panel.address = None;
                self.panel.last_error = Some(err.user_message.clone());
                self.notify(Notification::failed(err.user_message.clone()));
                Err(err)
            }
        }
    }

    pub async fn load_balance(&mut self) -> Result<String, AppError> {
        self.panel.is_loading_balance = true;
        let result = self.orchestrator.get_balance().await;
        self.panel.is_loading_balance = false;
        match result {
            Ok(balance) => {
                self.panel.balance = Some(balance.clone());
                self.notify(Notification::success(messages::BALANCE_LOADED));
                Ok(balance)
            }
            Err(err) => {
                self.panel.balance = None;
                self.notify(Notification::failed(err.user_message.clone()));
                Err(err)
            }
        }
    }

    /// Sends from the loaded address, falling back to the session account.
    pub async fn send(
        &mut self,
        recipient: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AppError> {
        self.panel.recipient = recipient.trim().to_owned();
        self.panel.amount = amount.trim().to_owned();
        let sender = self
            .panel
            .address
            .clone()
            .or_else(|| self.session().address().map(str::to_owned))
            .unwrap_or_default();

        if sender.is_empty() || self.panel.recipient.is_empty() || self.panel.amount.is_empty() {
            self.notify(Notification::failed(messages::FIELDS_REQUIRED));
            return Err(AppError::new(ErrorCode::SendFailed, messages::FIELDS_REQUIRED));
        }

        self.panel.is_sending = true;
        let result = self
            .orchestrator
            .send_tokens(&sender, &self.panel.recipient, &self.panel.amount)
            .await;
        self.panel.is_sending = false;

        match result {
            Ok(receipt) => {
                self.panel.last_tx_hash = Some(receipt.tx_hash.clone());
                self.notify(
                    Notification::success(format!("{} {}", messages::TX_HASH_LABEL, receipt.tx_hash))
                        .titled(messages::TX_SUCCESS),
                );
                Ok(receipt)
            }
            Err(err) => {
                let mut notification = Notification::failed(err.user_message.clone());
                if err.is(ErrorCode::TxFailed) {
                    notification = notification.titled(messages::TX_FAILED);
                }
                self.notify(notification);
                Err(err)
            }
        }
    }

    pub fn report(&self) -> BridgeReport {
        BridgeReport {
            session: self.session(),
            panel: self.panel().clone(),
            notifications: self.sink.toasts.snapshot(),
        }
    }

    /// Tears the session down and waits for the synchronizer to stop.
    pub async fn shutdown(mut self) {
        self.sync.teardown();
        self.sync.join().await;
    }

    fn notify(&self, notification: Notification) {
        self.sink.notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use adena_connector_core::NotificationKind;

    use super::*;

    const WALLET: &str = "g1jg8mtutu9khhfwc4nxmuhcpftf0pajdhfvsqf5";

    fn bridge() -> (WalletBridge, AdenaAdapter) {
        let adapter = AdenaAdapter::deterministic();
        let config = ConnectorConfig {
            toast_max: 10,
            ..ConnectorConfig::default()
        };
        (WalletBridge::new(&config, adapter.clone()), adapter)
    }

    fn last(bridge: &WalletBridge) -> Toast {
        bridge
            .report()
            .notifications
            .pop()
            .expect("at least one notification")
    }

    #[tokio::test(start_paused = true)]
    async fn connect_announces_fresh_session_only() {
        let (mut bridge, _) = bridge();
        bridge.ready().await;

        bridge.connect().await.expect("first connect");
        assert_eq!(last(&bridge).notification.message, messages::WALLET_CONNECTED);

        bridge.connect().await.expect("second connect");
        assert_eq!(bridge.report().notifications.len(), 1);
        bridge.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn loads_address_then_balance() {
        let (mut bridge, _) = bridge();
        bridge.connect().await.expect("connect");

        assert_eq!(bridge.load_address().await.expect("address"), WALLET);
        assert_eq!(last(&bridge).notification.message, messages::ADDRESS_LOADED);
        assert_eq!(bridge.load_balance().await.expect("balance"), "100000000");
        assert_eq!(last(&bridge).notification.message, messages::BALANCE_LOADED);

        let panel = bridge.panel();
        assert_eq!(panel.address.as_deref(), Some(WALLET));
        assert_eq!(panel.balance.as_deref(), Some("100000000"));
        assert!(!panel.is_loading_address);
        assert!(!panel.is_loading_balance);
    }

    #[tokio::test(start_paused = true)]
    async fn address_failure_clears_field() {
        let (mut bridge, adapter) = bridge();
        bridge.connect().await.expect("connect");
        bridge.load_address().await.expect("address");
        adapter.debug_set_locked(true).expect("lock");

        let err = bridge.load_address().await.expect_err("locked");
        assert_eq!(err.code, ErrorCode::NetworkError);
        assert!(bridge.panel().address.is_none());
        assert_eq!(
            bridge.panel().last_error.as_deref(),
            Some(messages::ACCOUNT_FETCH_FAILED)
        );
        let toast = last(&bridge);
        assert_eq!(toast.notification.kind, NotificationKind::Failed);
        assert_eq!(toast.notification.message, messages::ACCOUNT_FETCH_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn send_requires_every_field() {
        let (mut bridge, _) = bridge();
        bridge.ready().await;

        let err = bridge.send("g1dest", "1").await.expect_err("no sender yet");
        assert_eq!(err.user_message, messages::FIELDS_REQUIRED);
        assert_eq!(last(&bridge).notification.message, messages::FIELDS_REQUIRED);

        bridge.connect().await.expect("connect");
        bridge.load_address().await.expect("address");
        let err = bridge.send("g1dest", "  ").await.expect_err("no amount");
        assert_eq!(err.user_message, messages::FIELDS_REQUIRED);
        assert!(!bridge.panel().is_sending);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_send_reports_hash() {
        let (mut bridge, _) = bridge();
        bridge.connect().await.expect("connect");
        bridge.load_address().await.expect("address");

        let receipt = bridge.send("g1dest", "0.5").await.expect("send");
        assert_eq!(bridge.panel().last_tx_hash.as_deref(), Some(receipt.tx_hash.as_str()));
        let toast = last(&bridge);
        assert_eq!(toast.notification.title.as_deref(), Some(messages::TX_SUCCESS));
        assert_eq!(
            toast.notification.message,
            format!("txHash: {}", receipt.tx_hash)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_send_is_titled_transaction_failed() {
        let (mut bridge, adapter) = bridge();
        bridge.connect().await.expect("connect");
        bridge.load_address().await.expect("address");
        adapter.debug_reject_next_transfer().expect("arm rejection");

        let err = bridge.send("g1dest", "1").await.expect_err("rejected");
        assert_eq!(err.code, ErrorCode::TxFailed);
        let toast = last(&bridge);
        assert_eq!(toast.notification.title.as_deref(), Some(messages::TX_FAILED));
        assert!(toast.notification.message.starts_with(messages::TX_FAILED));

        let err = bridge.send("g1dest", "abc").await.expect_err("malformed");
        assert_eq!(err.code, ErrorCode::SendFailed);
        let toast = last(&bridge);
        assert!(toast.notification.title.is_none());
        assert_eq!(toast.notification.message, messages::SEND_FAILED);
    }

    #[tokio::test(start_paused = true)]
    async fn session_follows_connect() {
        let (mut bridge, _) = bridge();
        let state = bridge.ready().await;
        assert!(state.is_installed);
        assert!(!state.is_connected);

        bridge.connect().await.expect("connect");
        let mut rx = bridge.orchestrator.session().subscribe();
        let state = rx
            .wait_for(|s| s.account.is_some())
            .await
            .expect("sender alive")
            .clone();
        assert!(state.is_connected);
        assert_eq!(state.address(), Some(WALLET));

        let report = serde_json::to_value(bridge.report()).expect("serialize report");
        assert_eq!(report["session"]["isConnected"], true);
        assert_eq!(report["notifications"][0]["type"], "success");
    }
}
