//! Withdraw Orchestrator
//!
//! Moves funds out of the settlement contract to a destination address.
//!
//! Flow:
//! 1. Reject amounts below the asset's minimum (no network call)
//! 2. Consolidate chain variants of the symbol into the target descriptor
//! 3. Cap to the live balance, notifying the caller before anything is signed
//! 4. Build the withdraw message for the descriptor's chain, sign, publish, poll once

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::context::AgentContext;
use crate::crypto::{deadline_in, generate_nonce, IntentMessage, WRAP_NEAR_CONTRACT};
use crate::error::{IntentsError, IntentsResult};
use crate::ledger::{ensure_public_key, settlement_balance, storage_balance, FT_MINIMUM_STORAGE_BALANCE_LARGE};
use crate::registry::AssetDescriptor;
use crate::service::swap::SwapService;

/// A settled withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// Raw units actually withdrawn (after capping)
    pub amount: u128,
    pub intent_hash: String,
    /// Settlement transaction hash; the intent hash when the relay reported none
    pub transaction_hash: String,
}

pub struct WithdrawService {
    ctx: Arc<AgentContext>,
    swaps: Arc<SwapService>,
}

impl WithdrawService {
    pub fn new(ctx: Arc<AgentContext>, swaps: Arc<SwapService>) -> Self {
        Self { ctx, swaps }
    }

    /// Withdraws `amount` (display units) of `asset` to `receiver`.
    pub async fn withdraw(
        &self,
        asset: &AssetDescriptor,
        amount: Decimal,
        receiver: &str,
    ) -> IntentsResult<WithdrawOutcome> {
        let raw = asset.to_raw(amount)?;
        self.withdraw_raw(asset, raw, receiver).await
    }

    /// Withdraws `requested` raw units of `asset` to `receiver`.
    ///
    /// # Returns
    ///
    /// * `Ok(WithdrawOutcome)` - Settled withdrawal
    /// * `Err(IntentsError::InvalidInput)` - Below the minimum or nothing to withdraw
    /// * `Err(IntentsError::Terminal)` - The intent did not settle
    pub async fn withdraw_raw(
        &self,
        asset: &AssetDescriptor,
        requested: u128,
        receiver: &str,
    ) -> IntentsResult<WithdrawOutcome> {
        if requested < asset.min_withdraw_amount {
            return Err(IntentsError::InvalidInput(format!(
                "Withdrawal of {} is below the minimum of {}",
                asset.format(requested),
                asset.format(asset.min_withdraw_amount)
            )));
        }

        let ctx = &self.ctx;
        if ctx.registry.resolve_all(&asset.symbol).len() > 1 {
            self.swaps.consolidate(asset, requested).await?;
        }

        let balance = settlement_balance(
            ctx.ledger.as_ref(),
            &ctx.settlement_contract,
            ctx.account_id(),
            &asset.defuse_asset_id,
        )
        .await?;
        if balance == 0 {
            return Err(IntentsError::InvalidInput(format!(
                "No {} ({}) balance in {}",
                asset.symbol, asset.blockchain, ctx.settlement_contract
            )));
        }

        let amount = requested.min(balance);
        if amount < asset.min_withdraw_amount {
            return Err(IntentsError::InvalidInput(format!(
                "Available {} is below the minimum withdrawal of {}",
                asset.format(amount),
                asset.format(asset.min_withdraw_amount)
            )));
        }
        if amount < requested {
            ctx.notifier.warn(&format!(
                "Amount is more than the available {}. Withdrawing the complete amount",
                asset.format(balance)
            ));
        }

        let near_token = asset.blockchain.eq_ignore_ascii_case("near") && asset.contract_id() != WRAP_NEAR_CONTRACT;
        let storage_deposit = if near_token {
            self.receiver_storage_deposit().await?
        } else {
            0
        };

        let message = IntentMessage::withdraw(
            ctx.account_id(),
            asset,
            receiver,
            amount,
            storage_deposit,
            deadline_in(ctx.polling.withdraw_deadline_secs),
        )
        .to_message_string()?;

        ensure_public_key(ctx.ledger.as_ref(), &ctx.settlement_contract, &ctx.signer.public_key()).await?;
        let signed = ctx.signer.sign(message, generate_nonce(), &ctx.settlement_contract)?;

        info!("Withdrawing {} to {}", asset.format(amount), receiver);
        let (intent_hash, outcome) = ctx.settlement.publish_and_poll(&signed, &[]).await?;
        if !outcome.settled {
            return Err(IntentsError::Terminal(format!(
                "Withdraw intent {} ended {:?}",
                intent_hash, outcome.status
            )));
        }

        let transaction_hash = match outcome.transaction_hash() {
            Some(hash) => hash,
            None => {
                ctx.notifier.warn(&format!(
                    "Settlement of {} reported no transaction hash",
                    intent_hash
                ));
                intent_hash.clone()
            }
        };
        ctx.notifier.info(&format!("Transaction Hash: {}", transaction_hash));

        Ok(WithdrawOutcome {
            amount,
            intent_hash,
            transaction_hash,
        })
    }

    /// Storage deposit attached to a NEAR `ft_withdraw`: nothing once the account
    /// holds more than the large storage balance on the wrapped native token.
    async fn receiver_storage_deposit(&self) -> IntentsResult<u128> {
        let available = storage_balance(self.ctx.ledger.as_ref(), WRAP_NEAR_CONTRACT, self.ctx.account_id())
            .await?
            .unwrap_or(0);
        Ok(if available > FT_MINIMUM_STORAGE_BALANCE_LARGE {
            0
        } else {
            FT_MINIMUM_STORAGE_BALANCE_LARGE
        })
    }
}
