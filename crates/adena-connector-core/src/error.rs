use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ProviderNotInstalled,
    NetworkError,
    SendFailed,
    TxFailed,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderNotInstalled => "PROVIDER_NOT_INSTALLED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::SendFailed => "SEND_FAILED",
            Self::TxFailed => "TX_FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only failure shape that leaves a public connector operation.
#[derive(Debug, Error)]
#[error("{code}: {user_message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub user_message: String,
    pub dev_message: Option<String>,
    #[source]
    pub cause: Option<BoxedCause>,
}

impl AppError {
    pub fn new(code: ErrorCode, user_message: impl Into<String>) -> Self {
        Self {
            code,
            user_message: user_message.into(),
            dev_message: None,
            cause: None,
        }
    }

    pub fn with_dev(mut self, dev_message: impl Into<String>) -> Self {
        self.dev_message = Some(dev_message.into());
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn provider_not_installed() -> Self {
        Self::new(ErrorCode::ProviderNotInstalled, messages::PROVIDER_NOT_INSTALLED)
            .with_dev("provider binding is absent")
    }

    pub fn network_fetch_failed() -> Self {
        Self::new(ErrorCode::NetworkError, messages::NETWORK_FETCH_FAILED)
    }

    pub fn account_fetch_failed() -> Self {
        Self::new(ErrorCode::NetworkError, messages::ACCOUNT_FETCH_FAILED)
    }

    pub fn connection_failed() -> Self {
        Self::new(ErrorCode::NetworkError, messages::CONNECTION_FAILED)
    }

    pub fn network_switch_failed() -> Self {
        Self::new(ErrorCode::NetworkError, messages::NETWORK_SWITCH_FAILED)
    }

    pub fn send_failed() -> Self {
        Self::new(ErrorCode::SendFailed, messages::SEND_FAILED)
    }

    /// The user message carries the hash so it can be looked up on an explorer.
    pub fn tx_failed(tx_hash: &str) -> Self {
        Self::new(
            ErrorCode::TxFailed,
            format!("{} ({} {tx_hash})", messages::TX_FAILED, messages::TX_HASH_LABEL),
        )
    }

    pub fn unknown() -> Self {
        Self::new(ErrorCode::Unknown, messages::UNKNOWN)
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}
