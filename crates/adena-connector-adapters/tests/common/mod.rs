#![allow(dead_code)]

use std::sync::Arc;

use adena_connector_adapters::{AdenaAdapter, ConnectorConfig};
use adena_connector_core::{Orchestrator, ProviderHandle, Session};

pub fn orchestrator_for(adapter: &AdenaAdapter, config: &ConnectorConfig) -> Orchestrator {
    Orchestrator::new(
        ProviderHandle::installed(Arc::new(adapter.clone())),
        Session::new(),
        config.target_network(),
        config.app_name.clone(),
    )
}

pub fn deterministic() -> (AdenaAdapter, Orchestrator) {
    let adapter = AdenaAdapter::deterministic();
    let orch = orchestrator_for(&adapter, &ConnectorConfig::default());
    (adapter, orch)
}
