//! Unit tests for the zcashd client

use chain_clients_zcash::{PrivacyPolicy, ZcashCredentials, ZcashRpcClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rpc_ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"result": result, "error": null, "id": "intents-agent"}))
}

async fn mock_method(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": rpc_method})))
        .respond_with(rpc_ok(result))
        .mount(server)
        .await;
}

// ============================================================================
// TRANSPORT TESTS
// ============================================================================

/// What is tested: requests use JSON-RPC 1.0, text/plain and basic auth
/// Why: zcashd rejects unauthenticated calls and expects the bitcoind dialect
#[tokio::test]
async fn test_request_envelope_and_auth() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "text/plain"))
        // base64("user:pass")
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .and(body_partial_json(json!({"jsonrpc": "1.0", "method": "z_getnewaccount", "params": []})))
        .respond_with(rpc_ok(json!({"account": 3})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ZcashRpcClient::new(
        mock_server.uri(),
        Some(ZcashCredentials {
            user: "user".to_string(),
            password: "pass".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(client.get_new_account().await.unwrap(), 3);
}

/// What is tested: node errors returned with HTTP 500 surface the RPC message
/// Why: zcashd reports invalid parameters this way and the message is the only diagnostic
#[tokio::test]
async fn test_rpc_error_body_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "result": null,
            "error": {"code": -8, "message": "Invalid account number"},
            "id": "intents-agent"
        })))
        .mount(&mock_server)
        .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let err = client.get_address_for_account(99).await.unwrap_err();
    assert!(err.to_string().contains("Invalid account number"));
}

// ============================================================================
// ACCOUNT TESTS
// ============================================================================

/// What is tested: find_account_for_address walks the unified section of listaddresses
/// Why: Deposits and wallet balances start from an address, not an account number
#[tokio::test]
async fn test_find_account_for_address() {
    let mock_server = MockServer::start().await;
    mock_method(
        &mock_server,
        "listaddresses",
        json!([
            {"source": "legacy_random", "transparent": {"addresses": ["t1legacy"]}},
            {"source": "mnemonic_seed", "unified": [
                {"account": 0, "seedfp": "aa", "addresses": [{"address": "u1first", "receiver_types": ["orchard"]}]},
                {"account": 2, "seedfp": "aa", "addresses": [{"address": "u1target", "receiver_types": ["p2pkh", "orchard"]}]}
            ]}
        ]),
    )
    .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    assert_eq!(client.find_account_for_address("u1target").await.unwrap(), Some(2));
    assert_eq!(client.find_account_for_address("u1missing").await.unwrap(), None);
}

/// What is tested: unified_address prefers an existing UA and falls back to deriving one
/// Why: Deriving a new address on every withdrawal would scatter funds across diversifiers
#[tokio::test]
async fn test_unified_address_fallback() {
    let mock_server = MockServer::start().await;
    mock_method(
        &mock_server,
        "z_listaccounts",
        json!([
            {"account": 0, "addresses": [{"diversifier_index": 0, "ua": "u1existing"}]},
            {"account": 1, "addresses": []}
        ]),
    )
    .await;
    mock_method(&mock_server, "z_getaddressforaccount", json!({"account": 1, "address": "u1derived"})).await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    assert_eq!(client.unified_address(0).await.unwrap(), "u1existing");
    assert_eq!(client.unified_address(1).await.unwrap(), "u1derived");
}

/// What is tested: unified receivers pick p2pkh before p2sh and sapling before orchard
/// Why: The transparent receiver is the bridge withdrawal target
#[tokio::test]
async fn test_unified_receivers() {
    let mock_server = MockServer::start().await;
    mock_method(
        &mock_server,
        "z_listunifiedreceivers",
        json!({"p2pkh": "t1receiver", "orchard": "u1orchardonly"}),
    )
    .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let receivers = client.list_unified_receivers("u1ua").await.unwrap();
    assert_eq!(receivers.transparent(), Some("t1receiver"));
    assert_eq!(receivers.shielded(), Some("u1orchardonly"));
}

/// What is tested: address validation exposes the address type
/// Why: Transparent destinations skip the unshielding hop
#[tokio::test]
async fn test_validate_address() {
    let mock_server = MockServer::start().await;
    mock_method(&mock_server, "z_validateaddress", json!({"isvalid": true, "address_type": "p2pkh"})).await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let validation = client.validate_address("t1abc").await.unwrap();
    assert!(validation.isvalid);
    assert!(validation.is_transparent());
}

// ============================================================================
// BALANCE AND SEND TESTS
// ============================================================================

/// What is tested: pool balances are split into transparent and sapling+orchard
/// Why: The deposit flow shields only when the shielded pools cannot cover the amount
#[tokio::test]
async fn test_account_balance_pools() {
    let mock_server = MockServer::start().await;
    mock_method(
        &mock_server,
        "z_getbalanceforaccount",
        json!({"pools": {
            "transparent": {"valueZat": 5000},
            "sapling": {"valueZat": 100},
            "orchard": {"valueZat": 200}
        }, "minimum_confirmations": 1}),
    )
    .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let balance = client.account_balance(0).await.unwrap();
    assert_eq!(balance.transparent_zat(), 5000);
    assert_eq!(balance.shielded_zat(), 300);
    assert_eq!(balance.total_zat(), 5300);
}

/// What is tested: z_sendmany parameters carry decimal ZEC strings, minconf 1, fee and policy
/// Why: zcashd interprets bare integers as whole ZEC
#[tokio::test]
async fn test_send_many_params() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "z_sendmany",
            "params": [
                "u1from",
                [{"address": "t1to", "amount": "1.2345"}],
                1,
                "0.0002",
                "AllowRevealedSenders"
            ]
        })))
        .respond_with(rpc_ok(json!("opid-1234")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let opid = client
        .send_many("u1from", "t1to", 123_450_000, 20_000, PrivacyPolicy::AllowRevealedSenders)
        .await
        .unwrap();
    assert_eq!(opid, "opid-1234");
}

/// What is tested: operation status parses success txids and failures
/// Why: The txid is what gets reported back for Zcash transfers
#[tokio::test]
async fn test_operation_status() {
    let mock_server = MockServer::start().await;
    mock_method(
        &mock_server,
        "z_getoperationstatus",
        json!([
            {"id": "opid-1", "status": "success", "result": {"txid": "abcd"}},
            {"id": "opid-2", "status": "failed", "error": {"code": -6, "message": "Insufficient funds"}}
        ]),
    )
    .await;

    let client = ZcashRpcClient::new(mock_server.uri(), None).unwrap();
    let statuses = client
        .operation_status(&["opid-1".to_string(), "opid-2".to_string()])
        .await
        .unwrap();
    assert_eq!(statuses[0].result.as_ref().unwrap().txid, "abcd");
    assert_eq!(statuses[1].status, "failed");
    assert!(statuses[1].error.is_some());
}
