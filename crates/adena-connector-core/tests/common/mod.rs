#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Notify, Semaphore};

use adena_connector_core::{
    ContractCall, EventHandler, Notification, NotificationSink, Orchestrator, PortError,
    ProviderEventKind, ProviderHandle, ProviderResponse, Session, Subscription, TargetNetwork,
    WalletProvider,
};

pub const TARGET_CHAIN: &str = "portal-loop";

#[derive(Debug, Clone)]
pub struct Script {
    pub establish: ProviderResponse,
    pub account: ProviderResponse,
    pub network: ProviderResponse,
    /// Popped once per SwitchNetwork call; empty means success.
    pub switch: VecDeque<ProviderResponse>,
    pub add: ProviderResponse,
    pub contract: Result<ProviderResponse, String>,
    pub supports_events: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            establish: ProviderResponse::ok(json!({})),
            account: account_response("g1abc", "1000ugnot"),
            network: network_response(TARGET_CHAIN),
            switch: VecDeque::new(),
            add: ProviderResponse::ok(json!({})),
            contract: Ok(ProviderResponse::ok(json!({ "hash": "txhash" }))),
            supports_events: true,
        }
    }
}

type Handlers = Arc<Mutex<Vec<(u64, ProviderEventKind, EventHandler)>>>;

#[derive(Default)]
pub struct ScriptedProvider {
    pub script: Mutex<Script>,
    calls: Mutex<Vec<&'static str>>,
    contract_calls: Mutex<Vec<ContractCall>>,
    handlers: Handlers,
    next_handler: AtomicU64,
    account_gate: Mutex<Option<Arc<Semaphore>>>,
    pub account_started: Notify,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Self::default()
        })
    }

    pub fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().expect("script lock"));
    }

    /// Subsequent GetAccount calls block until the returned semaphore gets permits.
    pub fn hold_account(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.account_gate.lock().expect("gate lock") = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn contract_calls(&self) -> Vec<ContractCall> {
        self.contract_calls.lock().expect("contract lock").clone()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().expect("handlers lock").len()
    }

    pub fn emit(&self, event: ProviderEventKind) {
        let g = self.handlers.lock().expect("handlers lock");
        for (_, kind, handler) in g.iter() {
            if *kind == event {
                handler();
            }
        }
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().expect("calls lock").push(name);
    }

    fn script(&self) -> Script {
        self.script.lock().expect("script lock").clone()
    }
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    async fn establish(&self, _app_name: &str) -> Result<ProviderResponse, PortError> {
        self.record("AddEstablish");
        Ok(self.script().establish)
    }

    async fn get_account(&self) -> Result<ProviderResponse, PortError> {
        self.record("GetAccount");
        self.account_started.notify_one();
        let gate = self.account_gate.lock().expect("gate lock").clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| PortError::Transport(e.to_string()))?;
        }
        Ok(self.script().account)
    }

    async fn get_network(&self) -> Result<ProviderResponse, PortError> {
        self.record("GetNetwork");
        Ok(self.script().network)
    }

    async fn switch_network(&self, chain_id: &str) -> Result<ProviderResponse, PortError> {
        self.record("SwitchNetwork");
        let next = self.script.lock().expect("script lock").switch.pop_front();
        match next {
            Some(resp) => Ok(resp),
            None => {
                self.edit(|s| s.network = network_response(chain_id));
                Ok(ProviderResponse::ok(json!({ "chainId": chain_id })))
            }
        }
    }

    async fn add_network(&self, _network: &TargetNetwork) -> Result<ProviderResponse, PortError> {
        self.record("AddNetwork");
        Ok(self.script().add)
    }

    async fn do_contract(&self, call: &ContractCall) -> Result<ProviderResponse, PortError> {
        self.record("DoContract");
        self.contract_calls
            .lock()
            .expect("contract lock")
            .push(call.clone());
        self.script().contract.map_err(PortError::Transport)
    }

    fn on(
        &self,
        event: ProviderEventKind,
        handler: EventHandler,
    ) -> Result<Option<Subscription>, PortError> {
        if !self.script().supports_events {
            return Ok(None);
        }
        let id = self.next_handler.fetch_add(1, Ordering::SeqCst);
        self.handlers
            .lock()
            .expect("handlers lock")
            .push((id, event, handler));
        let handlers = Arc::clone(&self.handlers);
        Ok(Some(Subscription::new(event, move || {
            if let Ok(mut g) = handlers.lock() {
                g.retain(|(h, _, _)| *h != id);
            }
        })))
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().expect("sink lock").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().expect("sink lock").push(notification);
    }
}

pub fn account_response(address: &str, coins: &str) -> ProviderResponse {
    ProviderResponse::ok(json!({ "address": address, "coins": coins }))
}

pub fn network_response(chain_id: &str) -> ProviderResponse {
    ProviderResponse::ok(json!({ "chainId": chain_id }))
}

pub fn orchestrator_with(provider: Arc<ScriptedProvider>) -> Orchestrator {
    Orchestrator::new(
        ProviderHandle::installed(provider),
        Session::new(),
        TargetNetwork::default(),
        "Adena",
    )
}

pub fn orchestrator_without_provider() -> Orchestrator {
    Orchestrator::new(
        ProviderHandle::empty(),
        Session::new(),
        TargetNetwork::default(),
        "Adena",
    )
}
