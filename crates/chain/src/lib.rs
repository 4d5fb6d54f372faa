//! Ethereum plumbing for the keeper: a [`ChainClient`] seam, its JSON-RPC
//! implementation, the Governor ABI bindings, EIP-1559 transaction encoding
//! and a local secp256k1 signer.

pub mod client;
pub mod error;
pub mod governor;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod rpc;
pub mod signer;
pub mod tx;

pub use client::{ChainClient, PendingTransaction, RawLog, TransactionReceipt};
pub use error::ChainError;
pub use rpc::JsonRpcClient;
pub use signer::LocalSigner;
