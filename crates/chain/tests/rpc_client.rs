//! JSON-RPC client tests against a throwaway in-process node stub.

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use assert_matches::assert_matches;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use keeper_chain::client::PendingTransaction;
use keeper_chain::{ChainClient, ChainError, JsonRpcClient, LocalSigner};
use serde_json::{json, Value};

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const DAO: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
const TX_HASH: &str = "0xdeadbeef00000000000000000000000000000000000000000000000000000001";

type Answer = Result<Value, (i64, &'static str)>;

#[derive(Default)]
struct NodeStub {
    answers: HashMap<&'static str, Answer>,
    scripted: Mutex<HashMap<&'static str, VecDeque<Answer>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl NodeStub {
    fn answer(mut self, method: &'static str, result: Value) -> Self {
        self.answers.insert(method, Ok(result));
        self
    }

    /// Answer successive calls with `results` in order, then keep repeating
    /// the last one.
    fn answer_in_turn(mut self, method: &'static str, mut results: Vec<Value>) -> Self {
        let last = results.pop().expect("at least one answer");
        self.answers.insert(method, Ok(last));
        self.scripted
            .get_mut()
            .unwrap()
            .insert(method, results.into_iter().map(Ok).collect());
        self
    }

    fn reject(mut self, method: &'static str, code: i64, message: &'static str) -> Self {
        self.answers.insert(method, Err((code, message)));
        self
    }

    fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == method)
            .map(|(_, params)| params.clone())
            .collect()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn handle(State(stub): State<Arc<NodeStub>>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    stub.requests
        .lock()
        .unwrap()
        .push((method.clone(), request["params"].clone()));

    let next = stub
        .scripted
        .lock()
        .unwrap()
        .get_mut(method.as_str())
        .and_then(VecDeque::pop_front);
    let body = match next.as_ref().or_else(|| stub.answers.get(method.as_str())) {
        Some(Ok(result)) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
        Some(Err((code, message))) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": code, "message": message },
        }),
        None => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": -32601, "message": "method not found" },
        }),
    };
    Json(body)
}

async fn spawn_node(stub: NodeStub) -> (String, Arc<NodeStub>) {
    let stub = Arc::new(stub);
    let app = Router::new()
        .route("/", post(handle))
        .with_state(Arc::clone(&stub));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

/// A URL nothing is listening on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn reads_block_number_and_logs() {
    let topic = "0x7d84a6263ae0d98d3329bd7b46bb4e8d6f98cd35a7adb45c274c8b7fd5ebd5e0";
    let (url, stub) = spawn_node(
        NodeStub::default()
            .answer("eth_blockNumber", json!("0x2a"))
            .answer(
                "eth_getLogs",
                json!([
                    {
                        "address": DAO,
                        "topics": [topic],
                        "data": "0xdead",
                        "blockNumber": "0x10",
                        "logIndex": "0x3",
                        "removed": false
                    },
                    {
                        "address": DAO,
                        "topics": [topic],
                        "data": "0x",
                        "blockNumber": "0x11",
                        "logIndex": "0x0",
                        "removed": true
                    }
                ]),
            ),
    )
    .await;
    let client = JsonRpcClient::new(url);

    assert_eq!(client.block_number().await.unwrap(), 42);

    let dao = Address::from_str(DAO).unwrap();
    let logs = client
        .get_logs(dao, B256::from_str(topic).unwrap(), 1, 42)
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].address, dao);
    assert_eq!(logs[0].data, Bytes::from(vec![0xde, 0xad]));
    assert_eq!((logs[0].block_number, logs[0].log_index), (16, 3));

    let filter = &stub.requests_for("eth_getLogs")[0][0];
    assert_eq!(filter["fromBlock"], "0x1");
    assert_eq!(filter["toBlock"], "0x2a");
    assert_eq!(filter["address"], DAO);
    assert_eq!(filter["topics"][0], topic);
}

#[tokio::test]
async fn node_errors_become_rejections() {
    let (url, _stub) = spawn_node(NodeStub::default().reject(
        "eth_call",
        3,
        "execution reverted: Governor: unknown proposal id",
    ))
    .await;
    let client = JsonRpcClient::new(url);

    let err = client
        .call(Address::from_str(DAO).unwrap(), Bytes::new())
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(err.to_string(), "execution reverted: Governor: unknown proposal id");
}

#[tokio::test]
async fn falls_back_when_primary_is_unreachable() {
    let (fallback, stub) =
        spawn_node(NodeStub::default().answer("eth_blockNumber", json!("0x64"))).await;
    let client = JsonRpcClient::new(dead_url().await).with_fallback(Some(fallback));

    assert_eq!(client.block_number().await.unwrap(), 100);
    assert_eq!(stub.request_count(), 1);
}

#[tokio::test]
async fn reports_both_endpoints_when_everything_is_down() {
    let client = JsonRpcClient::new(dead_url().await).with_fallback(Some(dead_url().await));

    let err = client.block_number().await.unwrap_err();
    assert_matches!(
        &err,
        ChainError::Transport(message) if message.contains("fallback rpc failed")
    );
    assert!(err.is_transport());
}

#[tokio::test]
async fn rejections_are_not_replayed_on_fallback() {
    let (primary, _) =
        spawn_node(NodeStub::default().reject("eth_blockNumber", -32000, "header not found")).await;
    let (fallback, fallback_stub) =
        spawn_node(NodeStub::default().answer("eth_blockNumber", json!("0x1"))).await;
    let client = JsonRpcClient::new(primary).with_fallback(Some(fallback));

    assert_matches!(client.block_number().await, Err(ChainError::Rpc { code: -32000, .. }));
    assert_eq!(fallback_stub.request_count(), 0);
}

#[tokio::test]
async fn chain_id_is_fetched_once() {
    let (url, stub) = spawn_node(NodeStub::default().answer("eth_chainId", json!("0x7a69"))).await;
    let client = JsonRpcClient::new(url);

    assert_eq!(client.chain_id().await.unwrap(), 31_337);
    assert_eq!(client.chain_id().await.unwrap(), 31_337);
    assert_eq!(stub.requests_for("eth_chainId").len(), 1);
}

#[tokio::test]
async fn pinned_chain_id_skips_the_node() {
    let (url, stub) = spawn_node(NodeStub::default()).await;
    let client = JsonRpcClient::new(url).with_chain_id(Some(1));

    assert_eq!(client.chain_id().await.unwrap(), 1);
    assert_eq!(stub.request_count(), 0);
}

#[tokio::test]
async fn send_transaction_signs_and_broadcasts_type_2() {
    let (url, stub) = spawn_node(
        NodeStub::default()
            .answer("eth_chainId", json!("0x7a69"))
            .answer("eth_getTransactionCount", json!("0x5"))
            .answer("eth_gasPrice", json!("0x3b9aca00"))
            .answer("eth_estimateGas", json!("0x5208"))
            .answer("eth_sendRawTransaction", json!(TX_HASH)),
    )
    .await;
    let client = JsonRpcClient::new(url);
    let signer = LocalSigner::from_hex(DEV_KEY).unwrap();
    let dao = Address::from_str(DAO).unwrap();

    let pending = client
        .send_transaction(&signer, dao, Bytes::from(vec![0x26, 0x56, 0x22, 0x7d]))
        .await
        .unwrap();
    assert_eq!(pending.tx_hash, B256::from_str(TX_HASH).unwrap());

    let nonce_query = &stub.requests_for("eth_getTransactionCount")[0];
    assert_eq!(nonce_query[0], DEV_ADDRESS);
    assert_eq!(nonce_query[1], "pending");

    let estimate = &stub.requests_for("eth_estimateGas")[0][0];
    assert_eq!(estimate["from"], DEV_ADDRESS);
    assert_eq!(estimate["to"], DAO);
    assert_eq!(estimate["data"], "0x2656227d");
    assert_eq!(estimate["value"], "0x0");

    let raw = stub.requests_for("eth_sendRawTransaction")[0][0]
        .as_str()
        .unwrap()
        .to_string();
    assert!(raw.starts_with("0x02"));
}

#[tokio::test]
async fn estimation_revert_stops_before_broadcast() {
    let (url, stub) = spawn_node(
        NodeStub::default()
            .answer("eth_chainId", json!("0x1"))
            .answer("eth_getTransactionCount", json!("0x0"))
            .answer("eth_gasPrice", json!("0x1"))
            .reject("eth_estimateGas", 3, "execution reverted: Governor: proposal not successful"),
    )
    .await;
    let client = JsonRpcClient::new(url);
    let signer = LocalSigner::from_hex(DEV_KEY).unwrap();

    let err = client
        .send_transaction(&signer, Address::from_str(DAO).unwrap(), Bytes::new())
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    assert!(stub.requests_for("eth_sendRawTransaction").is_empty());
}

#[tokio::test]
async fn reverted_receipt_is_reported_as_unsuccessful() {
    let (url, _) = spawn_node(
        NodeStub::default()
            .answer(
                "eth_getTransactionReceipt",
                json!({ "transactionHash": TX_HASH, "blockNumber": "0x10", "status": "0x0" }),
            )
            .answer("eth_blockNumber", json!("0x10")),
    )
    .await;
    let client = JsonRpcClient::new(url);
    let pending = PendingTransaction {
        tx_hash: B256::from_str(TX_HASH).unwrap(),
    };

    let receipt = client.wait_for_confirmation(&pending, 1).await.unwrap();
    assert!(!receipt.succeeded);
    assert_eq!(receipt.block_number, 16);
    assert_eq!(receipt.transaction_hash, pending.tx_hash);
}

#[tokio::test]
async fn waits_for_inclusion_and_confirmation_depth() {
    let (url, stub) = spawn_node(
        NodeStub::default()
            .answer_in_turn(
                "eth_getTransactionReceipt",
                vec![
                    Value::Null,
                    json!({ "transactionHash": TX_HASH, "blockNumber": "0x10", "status": "0x1" }),
                ],
            )
            .answer_in_turn(
                "eth_blockNumber",
                vec![json!("0x10"), json!("0x11"), json!("0x12")],
            ),
    )
    .await;
    let client = JsonRpcClient::new(url).with_poll_interval(Duration::from_millis(10));
    let pending = PendingTransaction {
        tx_hash: B256::from_str(TX_HASH).unwrap(),
    };

    let receipt = client.wait_for_confirmation(&pending, 3).await.unwrap();
    assert!(receipt.succeeded);
    assert_eq!(receipt.block_number, 16);

    // Pending once, then mined at 16 with the head at 16, 17 and finally 18.
    assert_eq!(stub.requests_for("eth_getTransactionReceipt").len(), 4);
    assert_eq!(stub.requests_for("eth_blockNumber").len(), 3);
}
