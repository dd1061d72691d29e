//! Deposit Orchestrator
//!
//! Moves funds from the custodial wallet into the settlement contract. ZEC goes
//! through the Zcash subsystem; every other asset is a NEP-141 token on NEAR and
//! is deposited with `ft_transfer_call`.

use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::context::AgentContext;
use crate::crypto::WRAP_NEAR_CONTRACT;
use crate::error::{IntentsError, IntentsResult};
use crate::ledger::{
    ft_balance, require_success, storage_balance, FT_DEPOSIT_GAS, FT_MINIMUM_STORAGE_BALANCE_LARGE,
    FT_TRANSFER_GAS, ONE_YOCTO,
};
use crate::registry::AssetDescriptor;
use crate::service::zcash::ZcashService;

/// A submitted deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    pub asset_id: String,
    /// Raw units deposited
    pub amount: u128,
    /// NEAR transaction hash or Zcash txid of the final transfer
    pub transaction_hash: String,
}

pub struct DepositService {
    ctx: Arc<AgentContext>,
    zcash: Arc<ZcashService>,
}

impl DepositService {
    pub fn new(ctx: Arc<AgentContext>, zcash: Arc<ZcashService>) -> Self {
        Self { ctx, zcash }
    }

    /// Deposits `amount` of `symbol` from `sender` into the settlement contract.
    ///
    /// Only assets living on NEAR or Zcash can be deposited from the wallet.
    /// `sender` is the Zcash address for ZEC and ignored otherwise (the signing
    /// account pays).
    ///
    /// # Returns
    ///
    /// * `Ok(DepositOutcome)` - The final transfer succeeded
    /// * `Err(IntentsError::NotFound)` - No NEAR or Zcash descriptor for `symbol`
    /// * `Err(IntentsError::Terminal)` - An on-chain call did not report success
    pub async fn deposit(&self, symbol: &str, amount: Decimal, sender: &str) -> IntentsResult<DepositOutcome> {
        let asset = self
            .ctx
            .registry
            .resolve_all(symbol)
            .into_iter()
            .find(|a| a.blockchain == "near" || a.blockchain == "zec")
            .cloned()
            .ok_or_else(|| IntentsError::NotFound(format!("Token {} cannot be deposited from the wallet", symbol)))?;

        if asset.blockchain == "zec" {
            let txid = self.zcash.deposit(sender, amount).await?;
            return Ok(DepositOutcome {
                amount: asset.to_raw(amount)?,
                asset_id: asset.defuse_asset_id,
                transaction_hash: txid,
            });
        }

        let raw = asset.to_raw(amount)?;
        if raw == 0 {
            return Err(IntentsError::InvalidInput("Deposit amount must be positive".to_string()));
        }
        self.deposit_nep141(&asset, raw).await
    }

    /// Deposits `amount` raw units of a NEAR token.
    pub async fn deposit_nep141(&self, asset: &AssetDescriptor, amount: u128) -> IntentsResult<DepositOutcome> {
        let ctx = &self.ctx;
        let ledger = ctx.ledger.as_ref();
        let contract_id = asset.contract_id();

        if contract_id == WRAP_NEAR_CONTRACT {
            let storage = storage_balance(ledger, WRAP_NEAR_CONTRACT, ctx.account_id())
                .await?
                .unwrap_or(0);
            let storage_payment = FT_MINIMUM_STORAGE_BALANCE_LARGE.saturating_sub(storage);
            let wrapped = ft_balance(ledger, WRAP_NEAR_CONTRACT, ctx.account_id()).await?;
            let wrap_gap = amount.saturating_sub(wrapped);

            if storage_payment > 0 || wrap_gap > 0 {
                info!(
                    "Wrapping {} yoctoNEAR ({} storage, {} balance gap)",
                    storage_payment + wrap_gap,
                    storage_payment,
                    wrap_gap
                );
                let outcome = ledger
                    .call(
                        WRAP_NEAR_CONTRACT,
                        "near_deposit",
                        json!({}),
                        FT_DEPOSIT_GAS,
                        storage_payment + wrap_gap,
                    )
                    .await?;
                require_success(&outcome, "near_deposit")?;
            }
        } else if storage_balance(ledger, contract_id, &ctx.settlement_contract)
            .await?
            .is_none()
        {
            info!("Registering {} storage on {}", ctx.settlement_contract, contract_id);
            let outcome = ledger
                .call(
                    contract_id,
                    "storage_deposit",
                    json!({"account_id": ctx.settlement_contract}),
                    FT_DEPOSIT_GAS,
                    FT_MINIMUM_STORAGE_BALANCE_LARGE,
                )
                .await?;
            require_success(&outcome, "storage_deposit")?;
        }

        let outcome = ledger
            .call(
                contract_id,
                "ft_transfer_call",
                json!({
                    "receiver_id": ctx.settlement_contract,
                    "amount": amount.to_string(),
                    "msg": "",
                }),
                FT_TRANSFER_GAS,
                ONE_YOCTO,
            )
            .await?;
        require_success(&outcome, "ft_transfer_call")?;

        ctx.notifier
            .info(&format!("Transaction Hash: {}", outcome.transaction_hash));
        Ok(DepositOutcome {
            asset_id: asset.defuse_asset_id.clone(),
            amount,
            transaction_hash: outcome.transaction_hash,
        })
    }
}
