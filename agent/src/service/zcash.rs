//! Zcash Subsystem
//!
//! Specialization of deposits and withdrawals for ZEC, which moves through the
//! node wallet and the chain bridge instead of NEAR token contracts.
//!
//! Deposit: combined balance check, optional shield-to-self, bridge deposit
//! address, transfer, then wait for the settlement balance to move.
//!
//! Withdraw: transparent destinations use the generic withdraw path. Anything else
//! is withdrawn to the transparent receiver of a local wallet account, tracked on
//! the bridge until it lands on the node, then forwarded to the destination.

use chain_clients_common::to_raw_units;
use chain_clients_zcash::{PrivacyPolicy, ZcashRpcClient, ZEC_DECIMALS};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::bridge_client::WithdrawalStatus;
use crate::context::AgentContext;
use crate::error::{poll_until, Attempt, IntentsError, IntentsResult};
use crate::ledger::settlement_balance;
use crate::registry::AssetDescriptor;
use crate::service::withdraw::WithdrawService;

/// Fixed `z_sendmany` fee: 0.0002 ZEC.
pub const ZCASH_FEE_ZAT: u64 = 20_000;

/// Converts a ZEC display amount to zatoshis.
pub fn to_zat(amount: Decimal) -> IntentsResult<u64> {
    let raw = to_raw_units(amount, ZEC_DECIMALS)
        .map_err(|e| IntentsError::InvalidInput(format!("ZEC amount {}: {:#}", amount, e)))?;
    u64::try_from(raw).map_err(|_| IntentsError::InvalidInput(format!("ZEC amount {} is too large", amount)))
}

pub struct ZcashService {
    ctx: Arc<AgentContext>,
    withdrawals: Arc<WithdrawService>,
    /// Wallet account used for unshielding, loaded from the account file once
    account: Mutex<Option<u32>>,
}

impl ZcashService {
    pub fn new(ctx: Arc<AgentContext>, withdrawals: Arc<WithdrawService>) -> Self {
        Self {
            ctx,
            withdrawals,
            account: Mutex::new(None),
        }
    }

    fn node(&self) -> IntentsResult<&ZcashRpcClient> {
        self.ctx.zcash_node()
    }

    /// The ZEC descriptor bridged from the Zcash chain.
    fn zec_asset(&self) -> IntentsResult<&AssetDescriptor> {
        self.ctx.registry.resolve("ZEC", Some("zec"))
    }

    // ========================================================================
    // TRANSFERS
    // ========================================================================

    /// Sends `gross_zat` minus the fixed fee from `from` to `to`.
    ///
    /// # Returns
    ///
    /// * `Ok(txid)` - Transaction id, or the operation id when the node no longer tracks it
    /// * `Err(IntentsError::Terminal)` - The operation failed
    /// * `Err(IntentsError::Transient)` - Node error or operation still running at the timeout
    pub async fn transfer(
        &self,
        from: &str,
        gross_zat: u64,
        to: &str,
        policy: PrivacyPolicy,
    ) -> IntentsResult<String> {
        if gross_zat <= ZCASH_FEE_ZAT {
            return Err(IntentsError::InvalidInput(format!(
                "Transfer of {} zat does not cover the {} zat fee",
                gross_zat, ZCASH_FEE_ZAT
            )));
        }

        let node = self.node()?;
        let opid = node
            .send_many(from, to, gross_zat - ZCASH_FEE_ZAT, ZCASH_FEE_ZAT, policy)
            .await?;
        info!("z_sendmany {} -> {} started operation {}", from, to, opid);
        self.track_operation(node, opid).await
    }

    /// Waits for a `z_sendmany` operation and returns its txid.
    async fn track_operation(&self, node: &ZcashRpcClient, opid: String) -> IntentsResult<String> {
        let listed = node.list_operation_ids().await?;
        if !listed.contains(&opid) {
            debug!("Operation {} is not tracked by the node", opid);
            return Ok(opid);
        }

        let opids = vec![opid.clone()];
        let opids_ref = &opids;
        let txid = poll_until("z_getoperationstatus", self.ctx.polling.operation(), || async move {
            let statuses = match node.operation_status(opids_ref).await {
                Ok(statuses) => statuses,
                Err(e) => return Attempt::Retry(format!("status check failed: {:#}", e)),
            };
            match statuses.into_iter().next() {
                Some(op) if op.status == "success" => match op.result {
                    Some(result) => Attempt::Done(result.txid),
                    None => Attempt::Fatal(IntentsError::Terminal(format!(
                        "Operation {} succeeded without a txid",
                        op.id
                    ))),
                },
                Some(op) if op.status == "failed" || op.status == "cancelled" => {
                    Attempt::Fatal(IntentsError::Terminal(format!(
                        "Operation {} {}: {}",
                        op.id,
                        op.status,
                        op.error.unwrap_or_default()
                    )))
                }
                Some(op) => Attempt::Retry(format!("operation {} {}", op.id, op.status)),
                None => Attempt::Retry("operation not reported yet".to_string()),
            }
        })
        .await?;

        txid.ok_or_else(|| IntentsError::Transient(format!("Operation {} did not complete in time", opid)))
    }

    // ========================================================================
    // LOCAL ACCOUNT
    // ========================================================================

    /// Wallet account used as the unshielding hop, created on first use.
    ///
    /// The account number is persisted in the configured account file; the lock
    /// serializes creation so one process never creates two accounts.
    pub async fn intent_account(&self) -> IntentsResult<u32> {
        let mut cached = self.account.lock().await;
        if let Some(account) = *cached {
            return Ok(account);
        }

        let settings = self.ctx.zcash_settings()?;
        let path = Path::new(&settings.account_file);
        let stored = match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => None,
            Ok(content) => Some(content.trim().parse::<u32>().map_err(|_| {
                IntentsError::Config(format!(
                    "Account file {} holds '{}', expected an account number",
                    path.display(),
                    content.trim()
                ))
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(IntentsError::Config(format!(
                    "Failed to read account file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let account = match stored {
            Some(account) => account,
            None => {
                let account = self.node()?.get_new_account().await?;
                tokio::fs::write(path, account.to_string()).await.map_err(|e| {
                    IntentsError::Config(format!("Failed to write account file {}: {}", path.display(), e))
                })?;
                info!("Created wallet account {} ({})", account, path.display());
                account
            }
        };

        *cached = Some(account);
        Ok(account)
    }

    // ========================================================================
    // DEPOSIT
    // ========================================================================

    /// Deposits `amount` ZEC from the wallet address `sender` into the settlement contract.
    ///
    /// # Returns
    ///
    /// * `Ok(txid)` - Bridge transfer id; returned even if crediting was not observed in time
    /// * `Err(IntentsError::NotFound)` - `sender` belongs to no wallet account
    /// * `Err(IntentsError::InvalidInput)` - Balance does not cover amount plus fees
    pub async fn deposit(&self, sender: &str, amount: Decimal) -> IntentsResult<String> {
        let ctx = &self.ctx;
        let node = self.node()?;
        let settings = ctx.zcash_settings()?;
        let zec = self.zec_asset()?;

        let amount_zat = to_zat(amount)?;
        if amount_zat == 0 {
            return Err(IntentsError::InvalidInput("Deposit amount must be positive".to_string()));
        }
        let needed = amount_zat + ZCASH_FEE_ZAT;

        let account = node
            .find_account_for_address(sender)
            .await?
            .ok_or_else(|| IntentsError::NotFound(format!("No wallet account owns {}", sender)))?;
        let balance = node.account_balance(account).await?;

        // Shielding to self spends a second fee
        let needs_shielding = needed > balance.shielded_zat();
        let required = if needs_shielding { needed + ZCASH_FEE_ZAT } else { needed };
        if required > balance.total_zat() {
            return Err(IntentsError::InvalidInput(format!(
                "Insufficient balance of {} zat. Cannot deposit {} zat including fees",
                balance.total_zat(),
                required
            )));
        }

        if needs_shielding {
            info!(
                "Shielding for deposit: need {} zat, {} zat shielded",
                needed,
                balance.shielded_zat()
            );
            let txid = self
                .transfer(sender, needed + ZCASH_FEE_ZAT, sender, PrivacyPolicy::AllowRevealedSenders)
                .await?;
            ctx.notifier.info(&format!("Transaction Id: {}", txid));

            let shielded = poll_until("shielding", ctx.polling.shielding(), || async move {
                match node.account_balance(account).await {
                    Ok(balance) if balance.shielded_zat() >= needed => Attempt::Done(()),
                    Ok(balance) => Attempt::Retry(format!("{} zat shielded", balance.shielded_zat())),
                    Err(e) => Attempt::Retry(format!("balance check failed: {:#}", e)),
                }
            })
            .await?;
            if shielded.is_none() {
                return Err(IntentsError::Transient(format!(
                    "Shielded balance of account {} did not reach {} zat in time",
                    account, needed
                )));
            }
        }

        let deposit_address = ctx
            .bridge
            .deposit_address(ctx.account_id(), &settings.bridge_chain)
            .await?;
        let before = self.settled_zec(zec).await?;

        let txid = self
            .transfer(sender, needed, &deposit_address, PrivacyPolicy::NoPrivacy)
            .await?;
        ctx.notifier.info(&format!("Transaction Id: {}", txid));

        let expected = zec.to_raw(amount)?;
        let credited = poll_until("deposit confirmation", ctx.polling.deposit_confirmation(), || async move {
            match self.settled_zec(zec).await {
                Ok(now) if now.saturating_sub(before) >= expected => Attempt::Done(()),
                Ok(now) => Attempt::Retry(format!("credited {} of {}", now.saturating_sub(before), expected)),
                Err(e) => Attempt::Retry(format!("balance check failed: {}", e)),
            }
        })
        .await?;

        if credited.is_none() {
            ctx.notifier.warn(&format!(
                "Deposit {} was sent but is not credited in {} yet",
                txid, ctx.settlement_contract
            ));
        }
        Ok(txid)
    }

    async fn settled_zec(&self, zec: &AssetDescriptor) -> IntentsResult<u128> {
        settlement_balance(
            self.ctx.ledger.as_ref(),
            &self.ctx.settlement_contract,
            self.ctx.account_id(),
            &zec.defuse_asset_id,
        )
        .await
    }

    // ========================================================================
    // WITHDRAW
    // ========================================================================

    /// Withdraws `amount` of the ZEC descriptor `asset` to the Zcash address `recipient`.
    ///
    /// # Returns
    ///
    /// * `Ok(txid)` - Final transaction (settlement hash for transparent destinations)
    /// * `Err(IntentsError::InvalidInput)` - `recipient` is not a Zcash address
    pub async fn withdraw(&self, asset: &AssetDescriptor, amount: Decimal, recipient: &str) -> IntentsResult<String> {
        let ctx = &self.ctx;
        let node = self.node()?;

        let validation = node.validate_address(recipient).await?;
        if !validation.isvalid {
            return Err(IntentsError::InvalidInput(format!(
                "Address {} is not valid for the zcash chain",
                recipient
            )));
        }
        if validation.is_transparent() {
            let outcome = self.withdrawals.withdraw(asset, amount, recipient).await?;
            return Ok(outcome.transaction_hash);
        }

        let account = self.intent_account().await?;
        let unified_address = node.unified_address(account).await?;
        let receivers = node.list_unified_receivers(&unified_address).await?;
        let transparent = receivers.transparent().ok_or_else(|| {
            IntentsError::NotFound(format!("Unified address {} has no transparent receiver", unified_address))
        })?;

        let withdrawn = self.withdrawals.withdraw(asset, amount, transparent).await?;
        let status = self.await_bridge(&withdrawn.transaction_hash).await?;
        if let Some(status) = &status {
            if status.status == "FAILED" {
                return Err(IntentsError::Terminal(format!(
                    "Bridge reported withdrawal {} as FAILED",
                    withdrawn.transaction_hash
                )));
            }
        }

        let withdrawn_zat = to_zat(asset.to_display(withdrawn.amount)?)?;
        let expected = withdrawn_zat.saturating_sub(ZCASH_FEE_ZAT);
        let landed = poll_until("funds landing", ctx.polling.landing(), || async move {
            match node.account_balance(account).await {
                Ok(balance) if balance.transparent_zat() >= expected => Attempt::Done(()),
                Ok(balance) => Attempt::Retry(format!("{} zat transparent", balance.transparent_zat())),
                Err(e) => Attempt::Retry(format!("balance check failed: {:#}", e)),
            }
        })
        .await?;
        if landed.is_none() {
            return Err(IntentsError::Transient(format!(
                "Withdrawn funds did not reach account {} in time",
                account
            )));
        }

        let txid = self
            .transfer(&unified_address, withdrawn_zat, recipient, PrivacyPolicy::AllowRevealedSenders)
            .await?;
        ctx.notifier.info(&format!("Transaction Hash: {}", txid));
        Ok(txid)
    }

    /// Polls the bridge until the withdrawal leaves `PENDING`.
    ///
    /// Empty or failed responses are counted; once more than the tolerated number
    /// were seen, the caller proceeds to watch the node balance instead.
    async fn await_bridge(&self, withdrawal_hash: &str) -> IntentsResult<Option<WithdrawalStatus>> {
        let ctx = &self.ctx;
        let bridge = &ctx.bridge;
        let notifier = ctx.notifier.as_ref();
        let tolerance = ctx.polling.bridge_empty_tolerance;
        let empty = AtomicU32::new(0);
        let notified = AtomicBool::new(false);
        let (empty, notified) = (&empty, &notified);

        let status = poll_until("withdrawal_status", ctx.polling.bridge_status(), || async move {
            let response = bridge.withdrawal_status(withdrawal_hash).await;
            match response {
                Ok(Some(status)) => {
                    if let Some(hash) = &status.transfer_tx_hash {
                        if !notified.swap(true, Ordering::SeqCst) {
                            notifier.info(&format!("Transaction Hash: {}", hash));
                        }
                    }
                    if status.is_pending() {
                        Attempt::Retry(format!("withdrawal {} pending", withdrawal_hash))
                    } else {
                        Attempt::Done(Some(status))
                    }
                }
                other => {
                    if let Err(e) = other {
                        warn!("withdrawal_status for {} failed: {:#}", withdrawal_hash, e);
                    }
                    let seen = empty.fetch_add(1, Ordering::SeqCst) + 1;
                    if seen > tolerance {
                        Attempt::Done(None)
                    } else {
                        Attempt::Retry(format!("no withdrawal data ({}/{})", seen, tolerance))
                    }
                }
            }
        })
        .await?;

        status.ok_or_else(|| {
            IntentsError::Transient(format!(
                "Bridge withdrawal {} still pending at the timeout",
                withdrawal_hash
            ))
        })
    }
}
