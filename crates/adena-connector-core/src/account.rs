use crate::domain::Account;
use crate::error::AppError;
use crate::orchestrator::{describe, Orchestrator};
use crate::ports::WalletProvider;
use crate::units::strip_denom;
use crate::validator::is_success;

impl Orchestrator {
    /// Always a fresh provider round trip; balances move between calls.
    pub async fn get_account(&self) -> Result<Account, AppError> {
        let provider = self.handle.get()?;
        fetch_account(provider.as_ref()).await
    }

    pub async fn get_address(&self) -> Result<String, AppError> {
        Ok(self.get_account().await?.address)
    }

    /// Balance in base units.
    pub async fn get_balance(&self) -> Result<String, AppError> {
        Ok(self.get_account().await?.balance)
    }
}

pub(crate) async fn fetch_account(provider: &dyn WalletProvider) -> Result<Account, AppError> {
    let resp = provider.get_account().await.map_err(|e| {
        AppError::account_fetch_failed()
            .with_dev(format!("GetAccount transport failure: {e}"))
            .with_cause(e)
    })?;
    if !is_success(Some(&resp)) {
        return Err(AppError::account_fetch_failed().with_dev(describe("GetAccount", &resp)));
    }
    let address = resp.data_str("address").ok_or_else(|| {
        AppError::account_fetch_failed().with_dev("GetAccount response has no address")
    })?;
    let coins = resp.data_str("coins").ok_or_else(|| {
        AppError::account_fetch_failed().with_dev("GetAccount response has no coins")
    })?;
    let balance = strip_denom(coins).ok_or_else(|| {
        AppError::account_fetch_failed().with_dev(format!("unreadable coin amount {coins:?}"))
    })?;
    Ok(Account {
        address: address.to_owned(),
        balance,
    })
}
