//! Balance reporting
//!
//! Settlement-contract balances aggregated per symbol, and the ZEC held by a
//! wallet address on the Zcash node.

use chain_clients_common::from_raw_units;
use chain_clients_zcash::ZEC_DECIMALS;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::context::AgentContext;
use crate::error::{IntentsError, IntentsResult};
use crate::ledger::settlement_balances;

/// Fee reserve kept out of the spendable wallet balance: 0.0004 ZEC.
pub const WALLET_FEE_RESERVE_ZAT: u64 = 40_000;

/// Holdings of one symbol summed over its chain variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub symbol: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
}

/// ZEC held by one wallet account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZcashWalletBalance {
    pub account: u32,
    pub transparent: Decimal,
    /// Sapling plus Orchard
    pub shielded: Decimal,
    /// Total minus the fee reserve, never negative
    pub spendable: Decimal,
    pub usd_value: Decimal,
}

pub struct BalanceService {
    ctx: Arc<AgentContext>,
}

impl BalanceService {
    pub fn new(ctx: Arc<AgentContext>) -> Self {
        Self { ctx }
    }

    /// Non-zero settlement balances of the signing account, one row per symbol in
    /// registry order. The wrapped native token is reported as `NEAR`.
    pub async fn settlement_balances(&self) -> IntentsResult<Vec<TokenBalance>> {
        let ctx = &self.ctx;
        let assets = ctx.registry.assets();
        let token_ids: Vec<String> = assets.iter().map(|a| a.defuse_asset_id.clone()).collect();
        if token_ids.is_empty() {
            return Ok(Vec::new());
        }

        let balances = settlement_balances(
            ctx.ledger.as_ref(),
            &ctx.settlement_contract,
            ctx.account_id(),
            &token_ids,
        )
        .await?;

        let mut rows: Vec<TokenBalance> = Vec::new();
        for (asset, raw) in assets.iter().zip(balances) {
            if raw == 0 {
                continue;
            }
            let amount = asset.to_display(raw)?;
            let usd_value = amount * asset.price;
            let symbol = if asset.symbol.eq_ignore_ascii_case("WNEAR") {
                "NEAR".to_string()
            } else {
                asset.symbol.to_uppercase()
            };

            match rows.iter_mut().find(|row| row.symbol == symbol) {
                Some(row) => {
                    row.amount += amount;
                    row.usd_value += usd_value;
                }
                None => rows.push(TokenBalance {
                    symbol,
                    amount,
                    usd_value,
                }),
            }
        }
        Ok(rows)
    }

    /// ZEC held by the wallet account owning `address`.
    pub async fn zcash_wallet_balance(&self, address: &str) -> IntentsResult<ZcashWalletBalance> {
        let node = self.ctx.zcash_node()?;
        let account = node
            .find_account_for_address(address)
            .await?
            .ok_or_else(|| IntentsError::NotFound(format!("No wallet account owns {}", address)))?;
        let balance = node.account_balance(account).await?;

        let zec = |zat: u64| {
            from_raw_units(zat as u128, ZEC_DECIMALS)
                .map_err(|e| IntentsError::Transient(format!("Invalid zat amount {}: {:#}", zat, e)))
        };
        let spendable = zec(balance.total_zat().saturating_sub(WALLET_FEE_RESERVE_ZAT))?;
        let price = self
            .ctx
            .registry
            .resolve("ZEC", None)
            .map(|a| a.price)
            .unwrap_or_default();

        Ok(ZcashWalletBalance {
            account,
            transparent: zec(balance.transparent_zat())?,
            shielded: zec(balance.shielded_zat())?,
            spendable,
            usd_value: spendable * price,
        })
    }
}
