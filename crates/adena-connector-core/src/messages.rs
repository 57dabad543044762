//! User-facing message catalogue.

pub const PROVIDER_NOT_INSTALLED: &str = "Adena Wallet is not installed";
pub const NETWORK_FETCH_FAILED: &str = "Failed to fetch network information";
pub const ACCOUNT_FETCH_FAILED: &str = "Failed to fetch account information";
pub const SEND_FAILED: &str = "Failed to send GNOT";
pub const TX_FAILED: &str = "Transaction Failed";
pub const UNKNOWN: &str = "An unknown error occurred";
pub const FIELDS_REQUIRED: &str = "All fields are required";
pub const CONNECTION_FAILED: &str = "Failed to connect to Adena Wallet";
pub const NETWORK_SWITCH_FAILED: &str = "Failed to switch to the target network";

pub const WALLET_CONNECTED: &str = "Wallet connected";
pub const ADDRESS_LOADED: &str = "Address loaded";
pub const BALANCE_LOADED: &str = "Balance loaded";
pub const TX_SUCCESS: &str = "Transaction Success";

pub const TX_HASH_LABEL: &str = "txHash:";
