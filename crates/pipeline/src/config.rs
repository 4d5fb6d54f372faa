use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use keeper_chain::{ChainClient, JsonRpcClient, LocalSigner};
use keeper_core::registry::DaoRegistry;
use keeper_core::scheduling::{
    DEFAULT_BATCH_INTERVAL_SECS, DEFAULT_CONFIRMATIONS, DEFAULT_CONFIRMATION_TIMEOUT_SECS,
    DEFAULT_LOOKBACK_BLOCKS, DEFAULT_RECEIPT_POLL_INTERVAL_MS,
};

use crate::engine::ExecutionEngine;
use crate::executor::ProposalExecutor;
use crate::resolver::ProposalResolver;
use crate::scheduler::BatchScheduler;

/// Chain and scheduling configuration loaded from environment variables.
#[derive(Clone)]
pub struct EngineConfig {
    pub rpc_url: String,
    pub rpc_fallback_url: Option<String>,
    /// Pinned chain id; fetched from the node when absent.
    pub chain_id: Option<u64>,
    pub executor_private_key: Option<String>,
    pub lookback_blocks: u64,
    pub log_chunk_blocks: Option<u64>,
    pub confirmations: u64,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
    pub batch_interval_secs: u64,
    pub run_on_startup: bool,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                      |
    /// |-----------------------------|------------------------------|
    /// | `RPC_URL`                   | required                     |
    /// | `RPC_FALLBACK_URL`          | none                         |
    /// | `CHAIN_ID`                  | fetched via `eth_chainId`    |
    /// | `EXECUTOR_PRIVATE_KEY`      | none (executions fail)       |
    /// | `LOOKBACK_BLOCKS`           | `10000`                      |
    /// | `LOG_CHUNK_BLOCKS`          | whole window in one request  |
    /// | `CONFIRMATIONS`             | `1`                          |
    /// | `CONFIRMATION_TIMEOUT_SECS` | `600`                        |
    /// | `RECEIPT_POLL_INTERVAL_MS`  | `2000`                       |
    /// | `BATCH_INTERVAL_SECS`       | `86400`                      |
    /// | `RUN_ON_STARTUP`            | `false`                      |
    ///
    /// Panics on missing `RPC_URL`, malformed numbers, or a zero interval
    /// or timeout, so a bad deployment fails at startup rather than at the
    /// first scheduled run.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let rpc_url = var("RPC_URL").expect("RPC_URL must be set");

        Self {
            rpc_url,
            rpc_fallback_url: var("RPC_FALLBACK_URL"),
            chain_id: var("CHAIN_ID").map(|raw| parse_or_panic("CHAIN_ID", &raw)),
            executor_private_key: var("EXECUTOR_PRIVATE_KEY"),
            lookback_blocks: parse_with_default(
                "LOOKBACK_BLOCKS",
                var("LOOKBACK_BLOCKS"),
                DEFAULT_LOOKBACK_BLOCKS,
            ),
            log_chunk_blocks: var("LOG_CHUNK_BLOCKS")
                .map(|raw| parse_or_panic::<u64>("LOG_CHUNK_BLOCKS", &raw))
                .filter(|blocks| *blocks > 0),
            confirmations: parse_with_default(
                "CONFIRMATIONS",
                var("CONFIRMATIONS"),
                DEFAULT_CONFIRMATIONS,
            ),
            confirmation_timeout_secs: parse_nonzero_with_default(
                "CONFIRMATION_TIMEOUT_SECS",
                var("CONFIRMATION_TIMEOUT_SECS"),
                DEFAULT_CONFIRMATION_TIMEOUT_SECS,
            ),
            receipt_poll_interval_ms: parse_nonzero_with_default(
                "RECEIPT_POLL_INTERVAL_MS",
                var("RECEIPT_POLL_INTERVAL_MS"),
                DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            ),
            batch_interval_secs: parse_nonzero_with_default(
                "BATCH_INTERVAL_SECS",
                var("BATCH_INTERVAL_SECS"),
                DEFAULT_BATCH_INTERVAL_SECS,
            ),
            run_on_startup: var("RUN_ON_STARTUP")
                .map(|raw| parse_flag("RUN_ON_STARTUP", &raw))
                .unwrap_or(false),
        }
    }

    /// Load the executor key. A missing or unusable key is logged and
    /// yields `None`; the service still starts and every execution then
    /// reports a configuration error.
    pub fn load_signer(&self) -> Option<Arc<LocalSigner>> {
        let Some(raw) = self.executor_private_key.as_deref() else {
            tracing::warn!("EXECUTOR_PRIVATE_KEY not set, proposal execution is disabled");
            return None;
        };
        match LocalSigner::from_hex(raw) {
            Ok(signer) => {
                tracing::info!(executor = %signer.address(), "Executor signer loaded");
                Some(Arc::new(signer))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "EXECUTOR_PRIVATE_KEY is invalid, proposal execution is disabled"
                );
                None
            }
        }
    }

    pub fn chain_client(&self) -> JsonRpcClient {
        JsonRpcClient::new(self.rpc_url.clone())
            .with_fallback(self.rpc_fallback_url.clone())
            .with_chain_id(self.chain_id)
            .with_poll_interval(Duration::from_millis(self.receipt_poll_interval_ms))
    }

    /// Wire an engine over the given chain client and registry.
    pub fn build_engine_with(
        &self,
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn DaoRegistry>,
    ) -> ExecutionEngine {
        let resolver = ProposalResolver::new(Arc::clone(&chain))
            .with_lookback_blocks(self.lookback_blocks)
            .with_log_chunk_blocks(self.log_chunk_blocks);
        let executor = ProposalExecutor::new(chain, self.load_signer())
            .with_confirmations(self.confirmations)
            .with_confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs));
        ExecutionEngine::new(registry, resolver, executor)
    }

    /// Wire an engine over the configured JSON-RPC endpoint.
    pub fn build_engine(&self, registry: Arc<dyn DaoRegistry>) -> ExecutionEngine {
        self.build_engine_with(Arc::new(self.chain_client()), registry)
    }

    pub fn build_scheduler(&self, engine: Arc<ExecutionEngine>) -> BatchScheduler {
        BatchScheduler::new(engine, Duration::from_secs(self.batch_interval_secs))
            .with_run_on_startup(self.run_on_startup)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("rpc_url", &self.rpc_url)
            .field("rpc_fallback_url", &self.rpc_fallback_url)
            .field("chain_id", &self.chain_id)
            .field(
                "executor_private_key",
                &self.executor_private_key.as_ref().map(|_| "<redacted>"),
            )
            .field("lookback_blocks", &self.lookback_blocks)
            .field("log_chunk_blocks", &self.log_chunk_blocks)
            .field("confirmations", &self.confirmations)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("receipt_poll_interval_ms", &self.receipt_poll_interval_ms)
            .field("batch_interval_secs", &self.batch_interval_secs)
            .field("run_on_startup", &self.run_on_startup)
            .finish()
    }
}

fn parse_or_panic<T: FromStr>(key: &str, raw: &str) -> T {
    raw.parse()
        .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>()))
}

fn parse_with_default<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    raw.map(|raw| parse_or_panic(key, &raw)).unwrap_or(default)
}

fn parse_nonzero_with_default(key: &str, raw: Option<String>, default: u64) -> u64 {
    let value = parse_with_default(key, raw, default);
    if value == 0 {
        panic!("{key} must be greater than zero");
    }
    value
}

fn parse_flag(key: &str, raw: &str) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => panic!("{key} must be true or false"),
    }
}
