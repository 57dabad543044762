use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Denomination suffix the provider appends to base-unit amounts.
pub const BASE_DENOM: &str = "ugnot";

/// Base units per display unit.
pub const BASE_UNITS_PER_DISPLAY: u64 = 1_000_000;

/// Response envelope returned by every provider call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProviderResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            code: 0,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// String field inside `data`, ignoring empty strings.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn message_contains(&self, needle: &str) -> bool {
        self.message
            .as_deref()
            .map(|m| m.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    /// Base-unit amount, digits only.
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub chain_id: String,
}

/// Network definition registered with the provider when the target chain is unknown to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetNetwork {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_url: String,
}

impl Default for TargetNetwork {
    fn default() -> Self {
        Self {
            chain_id: "portal-loop".to_owned(),
            chain_name: "portal-loop".to_owned(),
            rpc_url: "https://rpc.gno.land:443".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub is_installed: bool,
    pub is_connected: bool,
    pub is_loading: bool,
    pub account: Option<Account>,
    pub network: Option<NetworkInfo>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            is_installed: false,
            is_connected: false,
            is_loading: true,
            account: None,
            network: None,
        }
    }
}

impl SessionState {
    pub fn address(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.address.as_str())
    }

    pub fn balance(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.balance.as_str())
    }

    pub fn on_chain(&self, chain_id: &str) -> bool {
        self.network
            .as_ref()
            .map(|n| n.chain_id == chain_id)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSendValue {
    pub from_address: String,
    pub to_address: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMessage {
    #[serde(rename = "type")]
    pub type_url: String,
    pub value: MsgSendValue,
}

impl ContractMessage {
    pub fn bank_send(from: &str, to: &str, base_amount: &str) -> Self {
        Self {
            type_url: "/bank.MsgSend".to_owned(),
            value: MsgSendValue {
                from_address: from.to_owned(),
                to_address: to.to_owned(),
                amount: format!("{base_amount}{BASE_DENOM}"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub messages: Vec<ContractMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderEventKind {
    #[serde(rename = "changedAccount")]
    AccountChanged,
    #[serde(rename = "changedNetwork")]
    NetworkChanged,
}

impl ProviderEventKind {
    pub fn event_name(self) -> &'static str {
        match self {
            Self::AccountChanged => "changedAccount",
            Self::NetworkChanged => "changedNetwork",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failed,
}

/// Event handed to the toast subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: None,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Failed,
            title: None,
            message: message.into(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
