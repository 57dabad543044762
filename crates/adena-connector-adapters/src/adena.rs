use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use adena_connector_core::{
    strip_denom, ContractCall, EventHandler, PortError, ProviderEventKind, ProviderResponse,
    Subscription, TargetNetwork, WalletProvider, BASE_DENOM,
};

use crate::ConnectorConfig;

const ALREADY_CONNECTED: i64 = 4001;
const NOT_CONNECTED: i64 = 1001;
const WALLET_LOCKED: i64 = 1000;
const UNADDED_NETWORK: i64 = 4004;
const NETWORK_EXISTS: i64 = 4005;
const INVALID_MESSAGE: i64 = 4006;
const INSUFFICIENT_FUNDS: i64 = 4007;
const TX_REJECTED: i64 = 5001;

/// Wallet provider behind one of three runtimes: an in-memory wallet for development,
/// an HTTP bridge to a real extension, or a disabled stub refusing every call.
#[derive(Clone)]
pub struct AdenaAdapter {
    mode: ProviderMode,
    state: Arc<Mutex<WalletState>>,
    handlers: Arc<Mutex<HandlerRegistry>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Bridge(BridgeRuntime),
}

#[derive(Debug, Clone)]
struct BridgeRuntime {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
struct WalletState {
    address: String,
    balance: u64,
    chain_id: String,
    networks: Vec<String>,
    established: bool,
    locked: bool,
    reject_next_transfer: bool,
    tx_seq: u64,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            address: "g1jg8mtutu9khhfwc4nxmuhcpftf0pajdhfvsqf5".to_owned(),
            balance: 100_000_000,
            chain_id: "portal-loop".to_owned(),
            networks: vec!["portal-loop".to_owned(), "test5".to_owned()],
            established: false,
            locked: false,
            reject_next_transfer: false,
            tx_seq: 0,
        }
    }
}

type SharedHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct HandlerRegistry {
    next_id: u64,
    entries: Vec<(u64, ProviderEventKind, SharedHandler)>,
}

impl Default for AdenaAdapter {
    fn default() -> Self {
        Self::with_config(ConnectorConfig::from_env())
    }
}

impl fmt::Debug for AdenaAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdenaAdapter")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl AdenaAdapter {
    pub fn with_config(config: ConnectorConfig) -> Self {
        let mode = if let Some(ref url) = config.provider_bridge_url {
            let timeout = Duration::from_millis(config.provider_timeout_ms);
            match reqwest::Client::builder().timeout(timeout).build() {
                Ok(client) => ProviderMode::Bridge(BridgeRuntime {
                    url: url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize Adena bridge client in production profile: {e}"
                        ))
                    } else {
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "Adena bridge URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };
        Self::from_mode(mode)
    }

    /// In-memory wallet regardless of configuration.
    pub fn deterministic() -> Self {
        Self::from_mode(ProviderMode::Deterministic)
    }

    fn from_mode(mode: ProviderMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(WalletState::default())),
            handlers: Arc::new(Mutex::new(HandlerRegistry::default())),
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            ProviderMode::Disabled(_) => "disabled",
            ProviderMode::Deterministic => "deterministic",
            ProviderMode::Bridge(_) => "bridge",
        }
    }

    pub fn debug_inject_account_changed(
        &self,
        address: &str,
        balance: u64,
    ) -> Result<(), PortError> {
        {
            let mut g = self.state()?;
            g.address = address.to_owned();
            g.balance = balance;
        }
        self.emit(ProviderEventKind::AccountChanged)
    }

    /// Moves the wallet to `chain_id` as if the user switched in the extension.
    pub fn debug_inject_network_changed(&self, chain_id: &str) -> Result<(), PortError> {
        {
            let mut g = self.state()?;
            if !g.networks.iter().any(|n| n == chain_id) {
                g.networks.push(chain_id.to_owned());
            }
            g.chain_id = chain_id.to_owned();
        }
        self.emit(ProviderEventKind::NetworkChanged)
    }

    pub fn debug_set_locked(&self, locked: bool) -> Result<(), PortError> {
        self.state()?.locked = locked;
        Ok(())
    }

    /// The next transfer is broadcast but fails on-chain.
    pub fn debug_reject_next_transfer(&self) -> Result<(), PortError> {
        self.state()?.reject_next_transfer = true;
        Ok(())
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn state(&self) -> Result<MutexGuard<'_, WalletState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    fn registry(&self) -> Result<MutexGuard<'_, HandlerRegistry>, PortError> {
        self.handlers
            .lock()
            .map_err(|e| PortError::Transport(format!("handler lock poisoned: {e}")))
    }

    /// Runs every handler registered for `event` outside the registry lock.
    fn emit(&self, event: ProviderEventKind) -> Result<(), PortError> {
        let handlers: Vec<SharedHandler> = self
            .registry()?
            .entries
            .iter()
            .filter(|(_, kind, _)| *kind == event)
            .map(|(_, _, h)| Arc::clone(h))
            .collect();
        debug!(event = event.event_name(), listeners = handlers.len(), "emitting provider event");
        for handler in handlers {
            handler();
        }
        Ok(())
    }

    async fn bridge_call(&self, method: &str, params: Value) -> Result<ProviderResponse, PortError> {
        let bridge = match &self.mode {
            ProviderMode::Bridge(bridge) => bridge,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented("adena bridge runtime not enabled"))
            }
        };

        debug!(%method, url = %bridge.url, "bridge request");
        let payload = json!({ "method": method, "params": params });
        let response = bridge
            .client
            .post(&bridge.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("adena bridge request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Transport(format!("adena bridge read failed: {e}")))?;
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!(
                "adena bridge endpoint {} not found",
                bridge.url
            )));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "adena bridge status {status}: {body}"
            )));
        }
        serde_json::from_str(&body)
            .map_err(|e| PortError::Transport(format!("adena bridge json decode failed: {e}")))
    }

    fn require_session<'a>(
        g: &'a WalletState,
        method: &str,
    ) -> Result<&'a WalletState, ProviderResponse> {
        if !g.established {
            return Err(ProviderResponse::failed(
                NOT_CONNECTED,
                format!("{method}: the website is not connected to Adena"),
            ));
        }
        if g.locked {
            return Err(ProviderResponse::failed(WALLET_LOCKED, "Adena is locked"));
        }
        Ok(g)
    }

    fn local_establish(&self, app_name: &str) -> Result<ProviderResponse, PortError> {
        let mut g = self.state()?;
        if g.established {
            return Ok(ProviderResponse::failed(
                ALREADY_CONNECTED,
                "The account is already connected to this website.",
            ));
        }
        g.established = true;
        debug!(%app_name, "deterministic wallet established");
        Ok(ProviderResponse::ok(json!({})))
    }

    fn local_account(&self) -> Result<ProviderResponse, PortError> {
        let g = self.state()?;
        Ok(match Self::require_session(&g, "GetAccount") {
            Ok(s) => ProviderResponse::ok(json!({
                "address": s.address,
                "coins": format!("{}{BASE_DENOM}", s.balance),
                "chainId": s.chain_id,
                "status": "ACTIVE",
            })),
            Err(resp) => resp,
        })
    }

    fn local_network(&self) -> Result<ProviderResponse, PortError> {
        let g = self.state()?;
        Ok(match Self::require_session(&g, "GetNetwork") {
            Ok(s) => ProviderResponse::ok(json!({ "chainId": s.chain_id })),
            Err(resp) => resp,
        })
    }

    fn local_switch(&self, chain_id: &str) -> Result<ProviderResponse, PortError> {
        let resp = {
            let mut g = self.state()?;
            if let Err(resp) = Self::require_session(&g, "SwitchNetwork") {
                return Ok(resp);
            }
            if !g.networks.iter().any(|n| n == chain_id) {
                return Ok(ProviderResponse::failed(
                    UNADDED_NETWORK,
                    format!("network {chain_id} has not been added"),
                ));
            }
            if g.chain_id == chain_id {
                return Ok(ProviderResponse::ok(json!({ "chainId": chain_id })));
            }
            g.chain_id = chain_id.to_owned();
            ProviderResponse::ok(json!({ "chainId": chain_id }))
        };
        self.emit(ProviderEventKind::NetworkChanged)?;
        Ok(resp)
    }

    fn local_add_network(&self, network: &TargetNetwork) -> Result<ProviderResponse, PortError> {
        let mut g = self.state()?;
        if let Err(resp) = Self::require_session(&g, "AddNetwork") {
            return Ok(resp);
        }
        if g.networks.iter().any(|n| *n == network.chain_id) {
            return Ok(ProviderResponse::failed(
                NETWORK_EXISTS,
                format!("network {} already exists", network.chain_id),
            ));
        }
        g.networks.push(network.chain_id.clone());
        let data = serde_json::to_value(network)
            .map_err(|e| PortError::Validation(format!("unencodable network: {e}")))?;
        Ok(ProviderResponse::ok(data))
    }

    fn local_contract(&self, call: &ContractCall) -> Result<ProviderResponse, PortError> {
        let resp = {
            let mut g = self.state()?;
            if let Err(resp) = Self::require_session(&g, "DoContract") {
                return Ok(resp);
            }
            let mut total: u64 = 0;
            for msg in &call.messages {
                if msg.type_url != "/bank.MsgSend" || msg.value.from_address != g.address {
                    return Ok(ProviderResponse::failed(
                        INVALID_MESSAGE,
                        format!("unsupported message {} from {}", msg.type_url, msg.value.from_address),
                    ));
                }
                let amount = strip_denom(&msg.value.amount)
                    .and_then(|a| a.parse::<u64>().ok())
                    .ok_or_else(|| {
                        PortError::Validation(format!("invalid coin amount {}", msg.value.amount))
                    })?;
                total = total.saturating_add(amount);
            }
            if total > g.balance {
                return Ok(ProviderResponse::failed(INSUFFICIENT_FUNDS, "insufficient funds"));
            }

            g.tx_seq += 1;
            let hash = format!("{:064X}", g.tx_seq);
            if std::mem::take(&mut g.reject_next_transfer) {
                debug!(tx_hash = %hash, "deterministic transfer rejected on-chain");
                return Ok(ProviderResponse {
                    code: TX_REJECTED,
                    data: Some(json!({ "hash": hash })),
                    message: Some("transaction failed during execution".to_owned()),
                });
            }
            g.balance -= total;
            ProviderResponse::ok(json!({ "hash": hash }))
        };
        self.emit(ProviderEventKind::AccountChanged)?;
        Ok(resp)
    }
}

#[async_trait]
impl WalletProvider for AdenaAdapter {
    async fn establish(&self, app_name: &str) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_establish(app_name),
            _ => self.bridge_call("AddEstablish", json!([app_name])).await,
        }
    }

    async fn get_account(&self) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_account(),
            _ => self.bridge_call("GetAccount", json!([])).await,
        }
    }

    async fn get_network(&self) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_network(),
            _ => self.bridge_call("GetNetwork", json!([])).await,
        }
    }

    async fn switch_network(&self, chain_id: &str) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_switch(chain_id),
            _ => self.bridge_call("SwitchNetwork", json!([{ "chainId": chain_id }])).await,
        }
    }

    async fn add_network(&self, network: &TargetNetwork) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_add_network(network),
            _ => self.bridge_call("AddNetwork", json!([network])).await,
        }
    }

    async fn do_contract(&self, call: &ContractCall) -> Result<ProviderResponse, PortError> {
        self.check_mode()?;
        match self.mode {
            ProviderMode::Deterministic => self.local_contract(call),
            _ => self.bridge_call("DoContract", json!([call])).await,
        }
    }

    fn on(
        &self,
        event: ProviderEventKind,
        handler: EventHandler,
    ) -> Result<Option<Subscription>, PortError> {
        self.check_mode()?;
        if !matches!(self.mode, ProviderMode::Deterministic) {
            return Ok(None);
        }

        let id = {
            let mut g = self.registry()?;
            let id = g.next_id;
            g.next_id += 1;
            g.entries.push((id, event, Arc::from(handler)));
            id
        };
        let handlers = Arc::clone(&self.handlers);
        Ok(Some(Subscription::new(event, move || {
            if let Ok(mut g) = handlers.lock() {
                g.entries.retain(|(h, _, _)| *h != id);
            }
        })))
    }
}
