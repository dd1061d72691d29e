//! Unit tests for the address classifier

use chain_clients_zcash::ZcashRpcClient;
use intents_agent::address::EVM_CHAINS;
use intents_agent::{AddressClassifier, ChainTag};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[path = "helpers.rs"]
mod test_helpers;
use test_helpers::*;

/// Checksummed EVM address; the upper-case letters keep it from looking like a NEAR name
const EVM_CHECKSUM_ADDR: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

fn evm_set() -> BTreeSet<ChainTag> {
    EVM_CHAINS.into_iter().collect()
}

/// What is tested: a NEAR account name classifies as near only
/// Why: Routing must not offer foreign chains for NEAR receivers
#[tokio::test]
async fn test_near_name_is_near_only() {
    let classifier = AddressClassifier::new(None).unwrap();
    let chains = classifier.classify("alice.near").await;
    assert_eq!(chains, BTreeSet::from([ChainTag::Near]));

    let chains = classifier.classify("my_agent-01.tg").await;
    assert_eq!(chains, BTreeSet::from([ChainTag::Near]));
}

/// What is tested: a 0x-prefixed 40-hex address yields every bridged EVM chain
/// Why: The same address receives on all EVM networks; the chain is picked from the token
#[tokio::test]
async fn test_evm_address_gets_full_evm_set() {
    let classifier = AddressClassifier::new(None).unwrap();
    assert_eq!(classifier.classify(EVM_CHECKSUM_ADDR).await, evm_set());

    // All lower-case hex is also a syntactically valid NEAR name
    let lower = EVM_CHECKSUM_ADDR.to_lowercase();
    let chains = classifier.classify(&lower).await;
    assert!(evm_set().is_subset(&chains));
    assert!(chains.contains(&ChainTag::Near));
}

/// What is tested: Bitcoin legacy, P2SH and bech32 patterns classify as btc
/// Why: BTC withdrawals are routed by these patterns alone
#[tokio::test]
async fn test_bitcoin_patterns() {
    let classifier = AddressClassifier::new(None).unwrap();
    for address in [
        "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
        "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
        "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq",
    ] {
        assert!(classifier.classify(address).await.contains(&ChainTag::Btc), "{}", address);
    }
}

/// What is tested: Dogecoin addresses classify as doge
/// Why: Same pattern-only routing as BTC
#[tokio::test]
async fn test_dogecoin_pattern() {
    let classifier = AddressClassifier::new(None).unwrap();
    let chains = classifier.classify("DH5yaieqoZN36fDVciNyRueRGvGLR3mr7L").await;
    assert!(chains.contains(&ChainTag::Doge));
    assert!(!chains.contains(&ChainTag::Btc));
}

/// What is tested: strings matching no rule yield the empty set
/// Why: Empty means unroutable and must stop a withdrawal
#[tokio::test]
async fn test_unroutable_address_is_empty() {
    let classifier = AddressClassifier::new(None).unwrap();
    assert!(classifier.classify("Not An Address!").await.is_empty());
    assert!(classifier.classify("").await.is_empty());
}

/// What is tested: the Zcash node's z_validateaddress adds zec
/// Why: Zcash address formats are validated by the node, not by patterns
#[tokio::test]
async fn test_zcash_validation_adds_zec() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "z_validateaddress", "params": ["t1Zcash"]})))
        .respond_with(node_result(json!({"isvalid": true, "address_type": "p2pkh"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "z_validateaddress"})))
        .respond_with(node_result(json!({"isvalid": false})))
        .mount(&mock_server)
        .await;

    let node = Arc::new(ZcashRpcClient::new(mock_server.uri(), None).unwrap());
    let classifier = AddressClassifier::new(Some(node)).unwrap();

    assert_eq!(classifier.classify("t1Zcash").await, BTreeSet::from([ChainTag::Zec]));
    assert_eq!(classifier.classify("alice.near").await, BTreeSet::from([ChainTag::Near]));
}

/// What is tested: a failing node only removes zec from the result
/// Why: A node outage must not block NEAR or EVM withdrawals
#[tokio::test]
async fn test_node_error_drops_only_zec() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let node = Arc::new(ZcashRpcClient::new(mock_server.uri(), None).unwrap());
    let classifier = AddressClassifier::new(Some(node)).unwrap();

    assert_eq!(classifier.classify("alice.near").await, BTreeSet::from([ChainTag::Near]));
}
