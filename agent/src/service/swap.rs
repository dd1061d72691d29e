//! Swap Orchestrator
//!
//! Executes token-to-token swaps inside the settlement contract.
//!
//! Flow:
//! 1. **Consolidate**: when the source symbol exists on several chains, swap other
//!    variants into the requested one until the requested amount is covered
//! 2. **Cap**: never move more than the live balance of the source asset
//! 3. **Quote**: take the relay quote with the greatest `amount_out`
//! 4. **Sign & publish**: fresh nonce per attempt, retried with fixed backoffs until settled

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::AgentContext;
use crate::crypto::{generate_nonce, IntentMessage};
use crate::error::{IntentsError, IntentsResult};
use crate::ledger::{ensure_public_key, settlement_balance, settlement_balances};
use crate::registry::AssetDescriptor;

/// A settled swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapOutcome {
    pub asset_in: String,
    pub asset_out: String,
    /// Raw units of the source asset actually swapped
    pub amount_in: u128,
    /// Raw units of the target asset received
    pub amount_out: u128,
    /// `amount_out` scaled by the target asset's decimals
    pub amount_out_display: Decimal,
    pub intent_hash: String,
    pub transaction_hash: Option<String>,
}

pub struct SwapService {
    ctx: Arc<AgentContext>,
}

impl SwapService {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    /// Swaps `amount_in` of `token_in` into `token_out`.
    ///
    /// # Arguments
    ///
    /// * `token_in` / `token_out` - Symbols
    /// * `amount_in` - Display amount of the source token
    /// * `source_asset_id` / `dest_asset_id` - Optional asset ids pinning a chain variant
    ///
    /// # Returns
    ///
    /// * `Ok(SwapOutcome)` - Settled swap
    /// * `Err(IntentsError)` - Unknown token, no balance, no quote or never settled
    pub async fn swap(
        &self,
        token_in: &str,
        amount_in: Decimal,
        token_out: &str,
        source_asset_id: Option<&str>,
        dest_asset_id: Option<&str>,
    ) -> IntentsResult<SwapOutcome> {
        let registry = &self.ctx.registry;
        let asset_in = registry.resolve_with_asset_id(token_in, source_asset_id)?.clone();
        let asset_out = registry.resolve_with_asset_id(token_out, dest_asset_id)?.clone();

        if asset_in.defuse_asset_id == asset_out.defuse_asset_id {
            return Err(IntentsError::InvalidInput(format!(
                "Cannot swap {} into itself",
                asset_in.defuse_asset_id
            )));
        }

        let requested = asset_in.to_raw(amount_in)?;
        if requested == 0 {
            return Err(IntentsError::InvalidInput("Swap amount must be positive".to_string()));
        }

        if registry.resolve_all(&asset_in.symbol).len() > 1 {
            self.consolidate(&asset_in, requested).await?;
        }

        self.swap_exact(&asset_in, &asset_out, requested).await
    }

    /// Balance waterfall: swaps whole balances of the other chain variants of
    /// `primary.symbol` into `primary`, in registry order, until `target` raw units
    /// of `primary` are held.
    ///
    /// Proceeds are credited only after their swap settled; a failed intermediate
    /// swap is reported and skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(total)` - Raw units of `primary` held afterwards (may be below `target`)
    pub async fn consolidate(&self, primary: &AssetDescriptor, target: u128) -> IntentsResult<u128> {
        let candidates: Vec<AssetDescriptor> = self
            .ctx
            .registry
            .resolve_all(&primary.symbol)
            .into_iter()
            .cloned()
            .collect();
        let token_ids: Vec<String> = candidates.iter().map(|a| a.defuse_asset_id.clone()).collect();
        let balances = settlement_balances(
            self.ctx.ledger.as_ref(),
            &self.ctx.settlement_contract,
            self.ctx.account_id(),
            &token_ids,
        )
        .await?;

        let mut running = candidates
            .iter()
            .zip(&balances)
            .find(|(asset, _)| asset.defuse_asset_id == primary.defuse_asset_id)
            .map_or(0, |(_, balance)| *balance);

        for (candidate, balance) in candidates.iter().zip(balances) {
            if candidate.defuse_asset_id == primary.defuse_asset_id || balance == 0 {
                continue;
            }
            if running >= target {
                break;
            }

            info!(
                "Consolidating {} into {}",
                candidate.format(balance),
                primary.defuse_asset_id
            );
            match self.swap_exact(candidate, primary, balance).await {
                Ok(outcome) => running = running.saturating_add(outcome.amount_out),
                Err(e) => self.ctx.notifier.warn(&format!(
                    "Could not consolidate {} ({}): {}",
                    candidate.symbol, candidate.blockchain, e
                )),
            }
        }

        Ok(running)
    }

    /// Swaps up to `requested` raw units of `asset_in` into `asset_out`.
    pub async fn swap_exact(
        &self,
        asset_in: &AssetDescriptor,
        asset_out: &AssetDescriptor,
        requested: u128,
    ) -> IntentsResult<SwapOutcome> {
        let ctx = &self.ctx;
        let balance = settlement_balance(
            ctx.ledger.as_ref(),
            &ctx.settlement_contract,
            ctx.account_id(),
            &asset_in.defuse_asset_id,
        )
        .await?;

        let amount = requested.min(balance);
        if amount == 0 {
            return Err(IntentsError::InvalidInput(format!(
                "No {} ({}) balance in {}",
                asset_in.symbol, asset_in.blockchain, ctx.settlement_contract
            )));
        }
        if amount < requested {
            info!(
                "Capping swap of {} to the available {}",
                asset_in.format(requested),
                asset_in.format(amount)
            );
        }

        let quote = ctx
            .settlement
            .quote(&asset_in.defuse_asset_id, &asset_out.defuse_asset_id, amount)
            .await?
            .ok_or_else(|| {
                IntentsError::Transient(format!(
                    "No quote for {} -> {}",
                    asset_in.format(amount),
                    asset_out.symbol
                ))
            })?;

        // Nothing after settlement may fail
        let amount_out_display = asset_out.to_display(quote.amount_out)?;

        ensure_public_key(ctx.ledger.as_ref(), &ctx.settlement_contract, &ctx.signer.public_key()).await?;

        let quote_hashes = vec![quote.quote_hash.clone()];
        let backoffs = ctx.polling.swap_backoffs();
        let attempts = backoffs.len() + 1;
        let mut last_failure = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(backoffs[attempt - 1]).await;
            }

            let message = IntentMessage::swap(
                ctx.account_id(),
                &asset_in.defuse_asset_id,
                quote.amount_in,
                &asset_out.defuse_asset_id,
                quote.amount_out,
                quote.expiration_time.clone(),
            )
            .to_message_string()?;
            let signed = ctx.signer.sign(message, generate_nonce(), &ctx.settlement_contract)?;

            match ctx.settlement.publish_and_poll(&signed, &quote_hashes).await {
                Ok((intent_hash, outcome)) if outcome.settled => {
                    let transaction_hash = outcome.transaction_hash();
                    if let Some(hash) = &transaction_hash {
                        ctx.notifier.info(&format!("Transaction Hash: {}", hash));
                    }
                    return Ok(SwapOutcome {
                        asset_in: asset_in.defuse_asset_id.clone(),
                        asset_out: asset_out.defuse_asset_id.clone(),
                        amount_in: quote.amount_in,
                        amount_out: quote.amount_out,
                        amount_out_display,
                        intent_hash,
                        transaction_hash,
                    });
                }
                Ok((intent_hash, outcome)) => {
                    last_failure = format!("intent {} ended {:?}", intent_hash, outcome.status);
                }
                Err(e @ IntentsError::Config(_)) => return Err(e),
                Err(e) => last_failure = e.to_string(),
            }
            warn!("Swap attempt {}/{} did not settle: {}", attempt + 1, attempts, last_failure);
        }

        Err(IntentsError::Terminal(format!(
            "Swap {} -> {} did not settle after {} attempts: {}",
            asset_in.format(amount),
            asset_out.symbol,
            attempts,
            last_failure
        )))
    }
}
