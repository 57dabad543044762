mod common;

use serde_json::json;

use adena_connector_core::{classify_transfer, ErrorCode, ProviderResponse};

use common::{orchestrator_with, orchestrator_without_provider, Script, ScriptedProvider};

fn contract_response(code: i64, data: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        code,
        data: Some(data),
        message: Some("DoContract".to_owned()),
    }
}

#[tokio::test]
async fn amounts_are_scaled_and_truncated() {
    let cases = [("1", "1000000ugnot"), ("0.000001", "1ugnot"), ("0.0000009", "0ugnot")];
    for (amount, expected) in cases {
        let provider = ScriptedProvider::new(Script::default());
        let orch = orchestrator_with(provider.clone());
        orch.send_tokens("g1from", "g1to", amount)
            .await
            .expect("send succeeds");
        let calls = provider.contract_calls();
        assert_eq!(calls.len(), 1);
        let msg = &calls[0].messages[0];
        assert_eq!(msg.type_url, "/bank.MsgSend");
        assert_eq!(msg.value.from_address, "g1from");
        assert_eq!(msg.value.to_address, "g1to");
        assert_eq!(msg.value.amount, expected, "amount {amount}");
    }
}

#[tokio::test]
async fn confirmed_transfer_returns_hash() {
    let provider = ScriptedProvider::new(Script {
        contract: Ok(contract_response(0, json!({ "hash": "h" }))),
        ..Script::default()
    });
    let orch = orchestrator_with(provider);
    let receipt = orch
        .send_tokens("g1a", "g1b", "1")
        .await
        .expect("transfer confirmed");
    assert_eq!(receipt.tx_hash, "h");
}

#[tokio::test]
async fn rejected_on_chain_is_tx_failed_with_hash() {
    let provider = ScriptedProvider::new(Script {
        contract: Ok(contract_response(1, json!({ "hash": "4kZ9rejected" }))),
        ..Script::default()
    });
    let orch = orchestrator_with(provider);
    let err = orch
        .send_tokens("g1a", "g1b", "1")
        .await
        .expect_err("rejected on chain");
    assert_eq!(err.code, ErrorCode::TxFailed);
    assert!(err.user_message.contains("4kZ9rejected"));
}

#[tokio::test]
async fn never_broadcast_is_send_failed() {
    let provider = ScriptedProvider::new(Script {
        contract: Ok(contract_response(1, json!({}))),
        ..Script::default()
    });
    let orch = orchestrator_with(provider);
    let err = orch
        .send_tokens("g1a", "g1b", "1")
        .await
        .expect_err("not broadcast");
    assert_eq!(err.code, ErrorCode::SendFailed);
}

#[tokio::test]
async fn transport_failure_is_send_failed() {
    let provider = ScriptedProvider::new(Script {
        contract: Err("bridge closed".to_owned()),
        ..Script::default()
    });
    let orch = orchestrator_with(provider);
    let err = orch
        .send_tokens("g1a", "g1b", "1")
        .await
        .expect_err("transport failure");
    assert_eq!(err.code, ErrorCode::SendFailed);
    assert!(err
        .dev_message
        .as_deref()
        .unwrap_or_default()
        .contains("bridge closed"));
}

#[tokio::test]
async fn malformed_amount_never_reaches_provider() {
    let provider = ScriptedProvider::new(Script::default());
    let orch = orchestrator_with(provider.clone());
    for amount in ["", "abc", "-3"] {
        let err = orch
            .send_tokens("g1a", "g1b", amount)
            .await
            .expect_err("bad amount");
        assert_eq!(err.code, ErrorCode::SendFailed, "amount {amount:?}");
    }
    assert_eq!(provider.count("DoContract"), 0);
}

#[tokio::test]
async fn missing_provider_is_reported_before_sending() {
    let orch = orchestrator_without_provider();
    let err = orch
        .send_tokens("g1a", "g1b", "1")
        .await
        .expect_err("no provider");
    assert_eq!(err.code, ErrorCode::ProviderNotInstalled);
}

#[test]
fn success_code_without_hash_is_send_failed() {
    let err = classify_transfer(&ProviderResponse::ok(json!({})))
        .expect_err("no hash means nothing was broadcast");
    assert_eq!(err.code, ErrorCode::SendFailed);
}
