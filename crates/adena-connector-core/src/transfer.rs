use tracing::{debug, warn};

use crate::domain::{ContractCall, ContractMessage, ProviderResponse, TransferReceipt};
use crate::error::{AppError, ErrorCode};
use crate::orchestrator::{describe, Orchestrator};
use crate::ports::WalletProvider;
use crate::units::to_base_units;
use crate::validator::is_success;

impl Orchestrator {
    /// Sends `amount` display units from `from` to `to`.
    ///
    /// Failures come back as `TX_FAILED` when the transaction reached the chain (the
    /// user message then carries its hash) and as `SEND_FAILED` otherwise.
    pub async fn send_tokens(
        &self,
        from: &str,
        to: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AppError> {
        let provider = self.handle.get()?;
        submit_transfer(provider.as_ref(), from, to, amount)
            .await
            .map_err(reclassify)
    }
}

async fn submit_transfer(
    provider: &dyn WalletProvider,
    from: &str,
    to: &str,
    amount: &str,
) -> Result<TransferReceipt, AppError> {
    let base_amount = to_base_units(amount).map_err(|e| {
        AppError::send_failed()
            .with_dev(format!("invalid amount {amount:?}: {e}"))
            .with_cause(e)
    })?;

    let call = ContractCall {
        messages: vec![ContractMessage::bank_send(from, to, &base_amount)],
    };
    debug!(%from, %to, %base_amount, "submitting transfer");
    let resp = provider.do_contract(&call).await.map_err(|e| {
        AppError::send_failed()
            .with_dev(format!("DoContract transport failure: {e}"))
            .with_cause(e)
    })?;
    classify_transfer(&resp)
}

/// Three-way outcome of a `DoContract` response.
pub fn classify_transfer(resp: &ProviderResponse) -> Result<TransferReceipt, AppError> {
    let hash = resp.data_str("hash");
    if is_success(Some(resp)) {
        if let Some(hash) = hash {
            return Ok(TransferReceipt {
                tx_hash: hash.to_owned(),
            });
        }
    }
    match hash {
        Some(hash) if resp.code != 0 => {
            warn!(tx_hash = %hash, code = resp.code, "transfer rejected on-chain");
            Err(AppError::tx_failed(hash).with_dev(describe("DoContract", resp)))
        }
        _ => Err(AppError::send_failed().with_dev(describe("DoContract", resp))),
    }
}

fn reclassify(err: AppError) -> AppError {
    match err.code {
        ErrorCode::TxFailed | ErrorCode::SendFailed => err,
        _ => {
            let detail = err
                .dev_message
                .clone()
                .unwrap_or_else(|| err.user_message.clone());
            AppError::send_failed().with_dev(detail).with_cause(err)
        }
    }
}
