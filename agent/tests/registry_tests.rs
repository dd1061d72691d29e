//! Unit tests for the token registry

use intents_agent::{IntentsError, TokenRegistry};
use rust_decimal::Decimal;
use std::str::FromStr;

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::*;

/// What is tested: resolve is case-insensitive and returns the first listed descriptor
/// Why: Users type symbols freely; the listing order is the default chain preference
#[test]
fn test_resolve_first_listed() {
    let registry = test_registry();
    let usdc = registry.resolve("usdc", None).unwrap();
    assert_eq!(usdc.defuse_asset_id, ASSET_USDC_NEAR);
    assert_eq!(usdc.contract_id(), "usdc.near");
}

/// What is tested: a chain pins the descriptor
/// Why: Multi-chain symbols are disambiguated by chain
#[test]
fn test_resolve_with_chain() {
    let registry = test_registry();
    assert_eq!(registry.resolve("USDC", Some("eth")).unwrap().defuse_asset_id, ASSET_USDC_ETH);
    assert!(matches!(
        registry.resolve("USDC", Some("btc")),
        Err(IntentsError::NotFound(_))
    ));
    assert!(matches!(registry.resolve("NOPE", None), Err(IntentsError::NotFound(_))));
}

/// What is tested: resolve_all keeps listing order
/// Why: Balance waterfalls walk candidates in that order
#[test]
fn test_resolve_all_order() {
    let registry = test_registry();
    let ids: Vec<&str> = registry
        .resolve_all("USDC")
        .iter()
        .map(|a| a.defuse_asset_id.as_str())
        .collect();
    assert_eq!(ids, vec![ASSET_USDC_NEAR, ASSET_USDC_ETH, ASSET_USDC_BASE]);
}

/// What is tested: an explicit asset id selects among same-symbol descriptors
/// Why: Swaps may pin source and destination variants
#[test]
fn test_resolve_with_asset_id() {
    let registry = test_registry();
    assert_eq!(
        registry.resolve_with_asset_id("USDC", Some(ASSET_USDC_BASE)).unwrap().blockchain,
        "base"
    );
    assert!(registry.resolve_with_asset_id("USDC", Some(ASSET_ZEC)).is_err());
    assert_eq!(registry.by_asset_id(ASSET_ZEC).unwrap().symbol, "ZEC");
}

/// What is tested: raw conversion uses each asset's own decimals exactly
/// Why: A global decimals value would mis-scale 6 vs 24 decimal tokens
#[test]
fn test_amount_conversion_uses_asset_decimals() {
    let registry = test_registry();
    let usdc = registry.resolve("USDC", None).unwrap();
    let wnear = registry.resolve("WNEAR", None).unwrap();
    let amount = Decimal::from_str("1.5").unwrap();

    assert_eq!(usdc.to_raw(amount).unwrap(), 1_500_000);
    assert_eq!(wnear.to_raw(amount).unwrap(), 1_500_000_000_000_000_000_000_000);
    assert_eq!(usdc.to_display(1_500_000).unwrap(), amount);
    assert_eq!(usdc.format(500_000), "0.5 USDC");

    // Digits beyond the asset's decimals are truncated, never rounded up
    assert_eq!(usdc.to_raw(Decimal::from_str("0.0000019").unwrap()).unwrap(), 1);
    assert!(matches!(
        usdc.to_raw(Decimal::from_str("-1").unwrap()),
        Err(IntentsError::InvalidInput(_))
    ));
}

/// What is tested: the console API's {"items": [...]} shape and numeric minimums are accepted
/// Why: Snapshots are exported from that API unchanged
#[test]
fn test_items_wrapper_and_numeric_minimum() {
    let registry = TokenRegistry::from_json(
        r#"{"items": [{"symbol": "BTC", "blockchain": "btc", "decimals": 8, "defuse_asset_id": "nep141:btc.omft.near", "min_withdraw_amount": 10000, "price": 67000.5}]}"#,
    )
    .unwrap();

    let btc = registry.resolve("BTC", None).unwrap();
    assert_eq!(btc.min_withdraw_amount, 10_000);
    assert_eq!(btc.price, Decimal::from_str("67000.5").unwrap());
}

/// What is tested: loading the registry from a file
/// Why: The context loads the snapshot named in the configuration
#[test]
fn test_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, TEST_TOKENS).unwrap();

    let registry = TokenRegistry::load_from_path(&path).unwrap();
    assert_eq!(registry.assets().len(), 7);
    assert!(TokenRegistry::load_from_path(dir.path().join("missing.json")).is_err());
}
