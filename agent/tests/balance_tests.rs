//! Integration tests for balance reporting

use intents_agent::{IntentsAgent, IntentsError, TokenBalance};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use wiremock::MockServer;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::*;

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn row(symbol: &str, amount: &str, usd_value: &str) -> TokenBalance {
    TokenBalance {
        symbol: symbol.to_string(),
        amount: dec(amount),
        usd_value: dec(usd_value),
    }
}

fn zcash_agent(node: &MockServer, ledger: Arc<FakeLedger>) -> IntentsAgent {
    let zcash = test_zcash_config(&node.uri(), "unused_account_file");
    let config = test_config(DUMMY_UNREACHABLE_URL, DUMMY_UNREACHABLE_URL, Some(zcash));
    IntentsAgent::new(test_context(&config, ledger, Arc::new(RecordingNotifier::default())))
}

async fn mount_wallet(node: &MockServer, transparent_zat: u64, sapling_zat: u64) {
    mount_node(
        node,
        "listaddresses",
        json!([
            {"source": "imported_watchonly", "transparent": {"addresses": ["t1Other"]}},
            {"source": "mnemonic_seed", "unified": [
                {"account": 0, "addresses": [{"address": "u1someoneelse"}]},
                {"account": 3, "addresses": [{"address": DUMMY_ZCASH_RECEIVE}]},
            ]},
        ]),
    )
    .await;
    mount_node(
        node,
        "z_getbalanceforaccount",
        json!({"pools": {
            "transparent": {"valueZat": transparent_zat},
            "sapling": {"valueZat": sapling_zat},
        }, "minimum_confirmations": 1}),
    )
    .await;
}

// ============================================================================
// SETTLEMENT BALANCE TESTS
// ============================================================================

/// What is tested: Balances are summed per symbol across chains, zeros dropped, wNEAR shown as NEAR
/// Why: Users think in symbols, not bridged asset ids
#[tokio::test]
async fn test_settlement_balances_aggregated_per_symbol() {
    let ledger = Arc::new(
        FakeLedger::new()
            .with_balance(ASSET_AAA, 2_500_000)
            .with_balance(ASSET_USDC_NEAR, 1_000_000)
            .with_balance(ASSET_USDC_ETH, 2_000_000)
            .with_balance(ASSET_WNEAR, 1_500_000_000_000_000_000_000_000),
    );
    let agent = IntentsAgent::new(test_context(
        &test_config(DUMMY_UNREACHABLE_URL, DUMMY_UNREACHABLE_URL, None),
        ledger.clone(),
        Arc::new(RecordingNotifier::default()),
    ));

    let balances = agent.balances().await.unwrap();

    assert_eq!(
        balances,
        vec![
            row("AAA", "2.5", "5"),
            row("USDC", "3", "3"),
            row("NEAR", "1.5", "4.5"),
        ]
    );
    // One batched read for every listed asset
    assert_eq!(
        ledger.views(),
        vec![(DUMMY_SETTLEMENT.to_string(), "mt_batch_balance_of".to_string())]
    );
}

/// What is tested: A wNEAR holding wider than a Decimal mantissa is still reported
/// Why: 100000 NEAR is 1e29 yocto; one large holding must not break the whole report
#[tokio::test]
async fn test_settlement_balances_wide_holding() {
    let ledger = Arc::new(
        FakeLedger::new().with_balance(ASSET_WNEAR, 100_000_000_000_000_000_000_000_000_001),
    );
    let agent = IntentsAgent::new(test_context(
        &test_config(DUMMY_UNREACHABLE_URL, DUMMY_UNREACHABLE_URL, None),
        ledger,
        Arc::new(RecordingNotifier::default()),
    ));

    let balances = agent.balances().await.unwrap();

    assert_eq!(balances, vec![row("NEAR", "100000", "300000")]);
}

/// What is tested: An empty account reports no rows
/// Why: Zero balances are noise
#[tokio::test]
async fn test_settlement_balances_empty() {
    let agent = IntentsAgent::new(test_context(
        &test_config(DUMMY_UNREACHABLE_URL, DUMMY_UNREACHABLE_URL, None),
        Arc::new(FakeLedger::new()),
        Arc::new(RecordingNotifier::default()),
    ));

    assert!(agent.balances().await.unwrap().is_empty());
}

// ============================================================================
// ZCASH WALLET TESTS
// ============================================================================

/// What is tested: The wallet balance of the receive address, with the fee reserve held back
/// Why: Spending the full balance would leave nothing for the transfer fee
#[tokio::test]
async fn test_zcash_wallet_balance_reserves_fee() {
    let node = MockServer::start().await;
    mount_wallet(&node, 50_000_000, 150_000_000).await;
    let agent = zcash_agent(&node, Arc::new(FakeLedger::new()));

    let balance = agent.zcash_wallet_balance(None).await.unwrap();

    assert_eq!(balance.account, 3);
    assert_eq!(balance.transparent, dec("0.5"));
    assert_eq!(balance.shielded, dec("1.5"));
    assert_eq!(balance.spendable, dec("1.9996"));
    assert_eq!(balance.usd_value, dec("59.988"));
}

/// What is tested: A wallet below the reserve is reported as not spendable
/// Why: Spendable never goes negative
#[tokio::test]
async fn test_zcash_wallet_balance_below_reserve() {
    let node = MockServer::start().await;
    mount_wallet(&node, 30_000, 0).await;
    let agent = zcash_agent(&node, Arc::new(FakeLedger::new()));

    let balance = agent.zcash_wallet_balance(Some(DUMMY_ZCASH_RECEIVE)).await.unwrap();
    assert_eq!(balance.spendable, Decimal::ZERO);
}

/// What is tested: An address no wallet account owns, and a missing node
/// Why: Both must be reported instead of showing a zero balance
#[tokio::test]
async fn test_zcash_wallet_balance_errors() {
    let node = MockServer::start().await;
    mount_wallet(&node, 0, 0).await;
    let agent = zcash_agent(&node, Arc::new(FakeLedger::new()));

    let err = agent.zcash_wallet_balance(Some("u1notours")).await.unwrap_err();
    assert!(matches!(err, IntentsError::NotFound(_)));

    let without_node = IntentsAgent::new(test_context(
        &test_config(DUMMY_UNREACHABLE_URL, DUMMY_UNREACHABLE_URL, None),
        Arc::new(FakeLedger::new()),
        Arc::new(RecordingNotifier::default()),
    ));
    let err = without_node.zcash_wallet_balance(None).await.unwrap_err();
    assert!(matches!(err, IntentsError::Config(_)));
}
