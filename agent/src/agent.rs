//! Intents agent facade
//!
//! Wires the orchestrators around one shared [`AgentContext`] and adds the
//! request-level defaults: default senders and receivers, destination routing
//! through the address classifier, and the deposit/swap/withdraw chain.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::address::ChainTag;
use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::crypto::{generate_nonce, IntentMessage, SignedPayload, NONCE_LENGTH};
use crate::error::{IntentsError, IntentsResult};
use crate::registry::AssetDescriptor;
use crate::service::{
    BalanceService, DepositOutcome, DepositService, SwapOutcome, SwapService, TokenBalance, WithdrawService,
    ZcashService, ZcashWalletBalance,
};

/// Result of a deposit, swap and withdraw chain.
#[derive(Debug, Clone)]
pub struct BridgeSwapOutcome {
    pub deposit: DepositOutcome,
    pub swap: SwapOutcome,
    pub withdraw_transaction: String,
}

pub struct IntentsAgent {
    ctx: Arc<AgentContext>,
    swaps: Arc<SwapService>,
    withdrawals: Arc<WithdrawService>,
    zcash: Arc<ZcashService>,
    deposits: DepositService,
    balances: BalanceService,
}

impl IntentsAgent {
    pub fn new(ctx: AgentContext) -> Self {
        let ctx = Arc::new(ctx);
        let swaps = Arc::new(SwapService::new(ctx.clone()));
        let withdrawals = Arc::new(WithdrawService::new(ctx.clone(), swaps.clone()));
        let zcash = Arc::new(ZcashService::new(ctx.clone(), withdrawals.clone()));

        Self {
            deposits: DepositService::new(ctx.clone(), zcash.clone()),
            balances: BalanceService::new(ctx.clone()),
            ctx,
            swaps,
            withdrawals,
            zcash,
        }
    }

    pub fn from_config(config: &AgentConfig) -> IntentsResult<Self> {
        Ok(Self::new(AgentContext::from_config(config)?))
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn zcash(&self) -> &ZcashService {
        &self.zcash
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Deposits `amount` of `symbol` into the settlement contract.
    ///
    /// A ZEC deposit without an explicit sender spends from the configured
    /// receive address.
    pub async fn deposit(&self, symbol: &str, amount: Decimal, sender: Option<&str>) -> IntentsResult<DepositOutcome> {
        let sender = match sender {
            Some(sender) => sender.to_string(),
            None => match &self.ctx.zcash_config {
                Some(zcash) if symbol.eq_ignore_ascii_case("ZEC") => zcash.receive_address.clone(),
                _ => self.ctx.account_id().to_string(),
            },
        };
        self.deposits.deposit(symbol, amount, &sender).await
    }

    pub async fn swap(
        &self,
        token_in: &str,
        amount_in: Decimal,
        token_out: &str,
        source_asset_id: Option<&str>,
        dest_asset_id: Option<&str>,
    ) -> IntentsResult<SwapOutcome> {
        self.swaps
            .swap(token_in, amount_in, token_out, source_asset_id, dest_asset_id)
            .await
    }

    /// Withdraws `amount` of `symbol` to `receiver` (default: the signing account).
    ///
    /// The destination descriptor is the one whose chain the receiver address
    /// can be classified on; `chain` pins it when several qualify.
    ///
    /// # Returns
    ///
    /// * `Ok(hash)` - Settlement transaction hash, or the final Zcash txid for shielded ZEC
    /// * `Err(IntentsError::InvalidInput)` - Below minimum, unroutable or ambiguous destination
    pub async fn withdraw(
        &self,
        symbol: &str,
        amount: Decimal,
        receiver: Option<&str>,
        chain: Option<&str>,
    ) -> IntentsResult<String> {
        let receiver = self.default_receiver(symbol, receiver);
        let asset = self.route_withdrawal(symbol, amount, &receiver, chain).await?;

        info!(
            "Withdrawing {} {} to {} on {}",
            amount, asset.symbol, receiver, asset.blockchain
        );
        if asset.blockchain.eq_ignore_ascii_case(ChainTag::Zec.as_str()) {
            self.zcash.withdraw(&asset, amount, &receiver).await
        } else {
            let outcome = self.withdrawals.withdraw(&asset, amount, &receiver).await?;
            Ok(outcome.transaction_hash)
        }
    }

    /// Deposits `token_in` from the wallet, swaps it into `token_out` and
    /// withdraws the proceeds.
    pub async fn bridge_swap(
        &self,
        token_in: &str,
        amount: Decimal,
        token_out: &str,
        receiver: Option<&str>,
        chain: Option<&str>,
    ) -> IntentsResult<BridgeSwapOutcome> {
        let deposit = self.deposit(token_in, amount, None).await?;
        let swap = self
            .swaps
            .swap(token_in, amount, token_out, Some(&deposit.asset_id), None)
            .await?;
        let withdraw_transaction = self
            .withdraw(token_out, swap.amount_out_display, receiver, chain)
            .await?;

        Ok(BridgeSwapOutcome {
            deposit,
            swap,
            withdraw_transaction,
        })
    }

    pub async fn balances(&self) -> IntentsResult<Vec<TokenBalance>> {
        self.balances.settlement_balances().await
    }

    /// ZEC held on the node by `address` (default: the configured receive address).
    pub async fn zcash_wallet_balance(&self, address: Option<&str>) -> IntentsResult<ZcashWalletBalance> {
        let address = match address {
            Some(address) => address.to_string(),
            None => self.ctx.zcash_settings()?.receive_address.clone(),
        };
        self.balances.zcash_wallet_balance(&address).await
    }

    /// Signs `message` for the settlement contract without publishing it.
    pub fn sign_offline(
        &self,
        message: &IntentMessage,
        nonce: Option<[u8; NONCE_LENGTH]>,
    ) -> IntentsResult<SignedPayload> {
        self.ctx.signer.sign(
            message.to_message_string()?,
            nonce.unwrap_or_else(generate_nonce),
            &self.ctx.settlement_contract,
        )
    }

    // ========================================================================
    // ROUTING
    // ========================================================================

    /// ZEC sent to the signing account itself goes to the configured Zcash address.
    fn default_receiver(&self, symbol: &str, receiver: Option<&str>) -> String {
        let account_id = self.ctx.account_id();
        let receiver = receiver.unwrap_or(account_id);
        match &self.ctx.zcash_config {
            Some(zcash) if symbol.eq_ignore_ascii_case("ZEC") && receiver == account_id => {
                zcash.receive_address.clone()
            }
            _ => receiver.to_string(),
        }
    }

    /// Picks the descriptor of `symbol` that `receiver` can receive on.
    ///
    /// The minimum-amount check runs before the receiver is classified, so a
    /// below-minimum request never reaches the network.
    async fn route_withdrawal(
        &self,
        symbol: &str,
        amount: Decimal,
        receiver: &str,
        chain: Option<&str>,
    ) -> IntentsResult<AssetDescriptor> {
        let candidates: Vec<&AssetDescriptor> = self
            .ctx
            .registry
            .resolve_all(symbol)
            .into_iter()
            .filter(|a| chain.map_or(true, |c| a.blockchain.eq_ignore_ascii_case(c)))
            .collect();
        if candidates.is_empty() {
            return Err(match chain {
                Some(chain) => IntentsError::NotFound(format!("Token {} is not supported on {}", symbol, chain)),
                None => IntentsError::NotFound(format!("Token {} is not supported", symbol)),
            });
        }

        let first = candidates[0];
        let mut allowed = Vec::new();
        for asset in candidates {
            if asset.to_raw(amount)? >= asset.min_withdraw_amount {
                allowed.push(asset);
            }
        }
        if allowed.is_empty() {
            return Err(IntentsError::InvalidInput(format!(
                "You need to withdraw at minimum {} or else you may lose your money",
                first.format(first.min_withdraw_amount)
            )));
        }

        let chains = self.ctx.classifier.classify(receiver).await;
        if chains.is_empty() {
            return Err(IntentsError::InvalidInput(format!(
                "Address {} is not valid on any supported chain",
                receiver
            )));
        }

        let routable: Vec<&AssetDescriptor> = allowed
            .into_iter()
            .filter(|a| chains.iter().any(|c| a.blockchain.eq_ignore_ascii_case(c.as_str())))
            .collect();

        match routable.as_slice() {
            [] => Err(IntentsError::InvalidInput(format!(
                "{} cannot be withdrawn to {} (address chains: {})",
                symbol.to_uppercase(),
                receiver,
                join_chains(chains.iter().map(ChainTag::as_str))
            ))),
            [asset] => Ok((*asset).clone()),
            several => Err(IntentsError::InvalidInput(format!(
                "{} can be withdrawn to {} on several chains ({}); choose one",
                symbol.to_uppercase(),
                receiver,
                join_chains(several.iter().map(|a| a.blockchain.as_str()))
            ))),
        }
    }
}

fn join_chains<'a>(chains: impl Iterator<Item = &'a str>) -> String {
    chains.collect::<Vec<_>>().join(", ")
}
