//! JSON-RPC [`ChainClient`] over HTTP.
//!
//! Requests go to the primary endpoint first. When it fails before the node
//! could answer (connect error, non-2xx status) the same request is replayed
//! once against the fallback endpoint, if configured. JSON-RPC error objects
//! are never replayed: the node has spoken.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use keeper_core::address::format_address;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::client::{ChainClient, PendingTransaction, RawLog, TransactionReceipt};
use crate::error::ChainError;
use crate::signer::LocalSigner;
use crate::tx::Eip1559Transaction;

/// Priority fee used when the node does not support `eth_maxPriorityFeePerGas`.
const DEFAULT_PRIORITY_FEE_WEI: u64 = 1_000_000_000;
/// Default delay between receipt polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Headroom added on top of `eth_estimateGas`, in percent.
const GAS_LIMIT_HEADROOM_PERCENT: u64 = 20;

pub struct JsonRpcClient {
    client: reqwest::Client,
    rpc_url: String,
    fallback_url: Option<String>,
    chain_id: OnceCell<u64>,
    poll_interval: Duration,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    topics: Vec<String>,
    data: String,
    block_number: Option<String>,
    log_index: Option<String>,
    #[serde(default)]
    removed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

impl JsonRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), rpc_url)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pool, timeouts).
    pub fn with_client(client: reqwest::Client, rpc_url: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            fallback_url: None,
            chain_id: OnceCell::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_fallback(mut self, fallback_url: Option<String>) -> Self {
        self.fallback_url = fallback_url;
        self
    }

    /// Pin the chain id instead of asking the node with `eth_chainId`.
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = OnceCell::new_with(chain_id);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Chain id, fetched once and cached.
    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        self.chain_id
            .get_or_try_init(|| async {
                let result = self.rpc_call("eth_chainId", json!([])).await?;
                parse_hex_u64(as_str(&result, "eth_chainId")?, "eth_chainId")
            })
            .await
            .copied()
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let envelope = match self.post(&self.rpc_url, &body).await {
            Ok(envelope) => envelope,
            Err(primary) if primary.is_transport() => match self.fallback_url.as_deref() {
                Some(fallback_url) => {
                    tracing::warn!(method, error = %primary, "Primary RPC failed, trying fallback");
                    self.post(fallback_url, &body).await.map_err(|fallback| {
                        ChainError::Transport(format!(
                            "primary rpc failed: {primary}; fallback rpc failed: {fallback}"
                        ))
                    })?
                }
                None => return Err(primary),
            },
            Err(other) => return Err(other),
        };

        if let Some(error) = envelope.get("error").filter(|error| !error.is_null()) {
            let error: RpcErrorObject = serde_json::from_value(error.clone())
                .map_err(|err| ChainError::decode(method, format!("bad error object: {err}")))?;
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::decode(method, "result was missing"))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ChainError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChainError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ChainError> {
        let result = self
            .rpc_call(
                "eth_getTransactionCount",
                json!([format_address(&address), "pending"]),
            )
            .await?;
        parse_hex_u64(
            as_str(&result, "eth_getTransactionCount")?,
            "eth_getTransactionCount",
        )
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        let result = self.rpc_call("eth_gasPrice", json!([])).await?;
        parse_hex_u256(as_str(&result, "eth_gasPrice")?, "eth_gasPrice")
    }

    async fn max_priority_fee(&self) -> U256 {
        let fee = match self.rpc_call("eth_maxPriorityFeePerGas", json!([])).await {
            Ok(result) => as_str(&result, "eth_maxPriorityFeePerGas")
                .and_then(|raw| parse_hex_u256(raw, "eth_maxPriorityFeePerGas")),
            Err(error) => Err(error),
        };
        fee.unwrap_or_else(|error| {
            tracing::debug!(error = %error, "Priority fee unavailable, using default");
            U256::from(DEFAULT_PRIORITY_FEE_WEI)
        })
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: &Bytes,
    ) -> Result<u64, ChainError> {
        let result = self
            .rpc_call(
                "eth_estimateGas",
                json!([{
                    "from": format_address(&from),
                    "to": format_address(&to),
                    "data": hex_data(data),
                    "value": "0x0",
                }]),
            )
            .await?;
        parse_hex_u64(as_str(&result, "eth_estimateGas")?, "eth_estimateGas")
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<RpcReceipt>, ChainError> {
        let result = self
            .rpc_call("eth_getTransactionReceipt", json!([hex_data(tx_hash)]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|err| ChainError::decode("eth_getTransactionReceipt", err.to_string()))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let result = self.rpc_call("eth_blockNumber", json!([])).await?;
        parse_hex_u64(as_str(&result, "eth_blockNumber")?, "eth_blockNumber")
    }

    async fn get_logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RawLog>, ChainError> {
        let result = self
            .rpc_call(
                "eth_getLogs",
                json!([{
                    "address": format_address(&address),
                    "topics": [hex_data(topic0)],
                    "fromBlock": format!("0x{from_block:x}"),
                    "toBlock": format!("0x{to_block:x}"),
                }]),
            )
            .await?;
        let logs: Vec<RpcLog> = serde_json::from_value(result)
            .map_err(|err| ChainError::decode("eth_getLogs", err.to_string()))?;

        logs.into_iter()
            .filter(|log| !log.removed)
            .map(|log| {
                Ok(RawLog {
                    address: Address::from_str(&log.address)
                        .map_err(|err| ChainError::decode("eth_getLogs", err.to_string()))?,
                    topics: log
                        .topics
                        .iter()
                        .map(|topic| {
                            B256::from_str(topic)
                                .map_err(|err| ChainError::decode("eth_getLogs", err.to_string()))
                        })
                        .collect::<Result<_, _>>()?,
                    data: parse_hex_bytes(&log.data, "eth_getLogs")?,
                    block_number: parse_optional_quantity(log.block_number.as_deref())?,
                    log_index: parse_optional_quantity(log.log_index.as_deref())?,
                })
            })
            .collect()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": format_address(&to), "data": hex_data(data) }, "latest"]),
            )
            .await?;
        parse_hex_bytes(as_str(&result, "eth_call")?, "eth_call")
    }

    async fn send_transaction(
        &self,
        signer: &LocalSigner,
        to: Address,
        data: Bytes,
    ) -> Result<PendingTransaction, ChainError> {
        let from = signer.address();
        let chain_id = self.chain_id().await?;
        let nonce = self.transaction_count(from).await?;
        let gas_price = self.gas_price().await?;
        let priority_fee = self.max_priority_fee().await;
        // Reverts surface here, before anything is signed.
        let estimate = self.estimate_gas(from, to, &data).await?;

        let tx = Eip1559Transaction {
            chain_id,
            nonce,
            max_priority_fee_per_gas: priority_fee,
            max_fee_per_gas: gas_price
                .saturating_mul(U256::from(2))
                .saturating_add(priority_fee),
            gas_limit: estimate.saturating_mul(100 + GAS_LIMIT_HEADROOM_PERCENT) / 100,
            to,
            value: U256::ZERO,
            data,
        };
        let signed = signer.sign_transaction(&tx)?;

        tracing::debug!(
            from = %from,
            to = %to,
            nonce,
            gas_limit = tx.gas_limit,
            "Broadcasting transaction"
        );
        let result = self
            .rpc_call("eth_sendRawTransaction", json!([hex_data(&signed.raw)]))
            .await?;
        let tx_hash = B256::from_str(as_str(&result, "eth_sendRawTransaction")?)
            .map_err(|err| ChainError::decode("eth_sendRawTransaction", err.to_string()))?;
        if tx_hash != signed.hash {
            tracing::warn!(
                node_hash = %tx_hash,
                local_hash = %signed.hash,
                "Node reported a different transaction hash"
            );
        }
        Ok(PendingTransaction { tx_hash })
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
        confirmations: u64,
    ) -> Result<TransactionReceipt, ChainError> {
        let confirmations = confirmations.max(1);
        loop {
            if let Some(receipt) = self.transaction_receipt(pending.tx_hash).await? {
                if let Some(raw_block) = receipt.block_number.as_deref() {
                    let included_at = parse_hex_u64(raw_block, "eth_getTransactionReceipt")?;
                    let head = self.block_number().await?;
                    if head.saturating_sub(included_at) + 1 >= confirmations {
                        return Ok(TransactionReceipt {
                            transaction_hash: B256::from_str(&receipt.transaction_hash)
                                .map_err(|err| {
                                    ChainError::decode("eth_getTransactionReceipt", err.to_string())
                                })?,
                            block_number: included_at,
                            succeeded: receipt.status.as_deref() != Some("0x0"),
                        });
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn hex_data(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn as_str<'a>(value: &'a Value, method: &str) -> Result<&'a str, ChainError> {
    value
        .as_str()
        .ok_or_else(|| ChainError::decode(method, "expected a hex string"))
}

fn strip_hex_prefix<'a>(raw: &'a str, method: &str) -> Result<&'a str, ChainError> {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ChainError::decode(method, format!("{raw:?} is not 0x-prefixed")))
}

fn parse_hex_u64(raw: &str, method: &str) -> Result<u64, ChainError> {
    let digits = strip_hex_prefix(raw, method)?;
    u64::from_str_radix(digits, 16)
        .map_err(|err| ChainError::decode(method, format!("bad quantity {raw:?}: {err}")))
}

fn parse_hex_u256(raw: &str, method: &str) -> Result<U256, ChainError> {
    let digits = strip_hex_prefix(raw, method)?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|err| ChainError::decode(method, format!("bad quantity {raw:?}: {err}")))
}

fn parse_hex_bytes(raw: &str, method: &str) -> Result<Bytes, ChainError> {
    let digits = strip_hex_prefix(raw, method)?;
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|err| ChainError::decode(method, format!("bad hex data: {err}")))
}

fn parse_optional_quantity(raw: Option<&str>) -> Result<u64, ChainError> {
    raw.map(|raw| parse_hex_u64(raw, "eth_getLogs"))
        .transpose()
        .map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn quantities_parse_with_either_prefix_case() {
        assert_eq!(parse_hex_u64("0x10", "t").unwrap(), 16);
        assert_eq!(parse_hex_u64("0X10", "t").unwrap(), 16);
        assert_eq!(parse_hex_u256("0x", "t").unwrap(), U256::ZERO);
        assert_eq!(
            parse_hex_u256("0x3b9aca00", "t").unwrap(),
            U256::from(1_000_000_000u64)
        );
        assert_matches!(parse_hex_u64("16", "t"), Err(ChainError::Decode { .. }));
        assert_matches!(parse_hex_u64("0xzz", "t"), Err(ChainError::Decode { .. }));
    }

    #[test]
    fn bytes_parse_and_reject_odd_length() {
        assert_eq!(parse_hex_bytes("0x", "t").unwrap(), Bytes::new());
        assert_eq!(
            parse_hex_bytes("0xdead", "t").unwrap(),
            Bytes::from(vec![0xde, 0xad])
        );
        assert_matches!(parse_hex_bytes("0xabc", "t"), Err(ChainError::Decode { .. }));
    }

    #[test]
    fn pending_logs_default_to_zero_position() {
        assert_eq!(parse_optional_quantity(None).unwrap(), 0);
        assert_eq!(parse_optional_quantity(Some("0x2a")).unwrap(), 42);
    }
}
