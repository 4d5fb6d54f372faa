#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use keeper_chain::mock::MockChainClient;
use keeper_chain::{ChainClient, LocalSigner};
use keeper_core::proposal::ProposalRecord;
use keeper_core::registry::{DaoRegistry, InMemoryDaoRegistry};
use keeper_pipeline::{ExecutionEngine, ProposalExecutor, ProposalResolver};

pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const DAO_A: &str = "0xabc0000000000000000000000000000000000001";
pub const DAO_B: &str = "0xabc0000000000000000000000000000000000002";

pub const SUCCEEDED: u8 = 4;
pub const DEFEATED: u8 = 3;
pub const EXECUTED: u8 = 7;

pub fn address(raw: &str) -> Address {
    Address::from_str(raw).unwrap()
}

pub fn proposal(id: u64, description: &str) -> ProposalRecord {
    ProposalRecord::new(
        U256::from(id),
        vec![Address::repeat_byte(0x10)],
        vec![U256::ZERO],
        vec![Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb, id as u8])],
        description.to_string(),
    )
    .unwrap()
}

pub fn signer() -> Option<Arc<LocalSigner>> {
    Some(Arc::new(LocalSigner::from_hex(DEV_KEY).unwrap()))
}

pub fn as_chain(mock: &Arc<MockChainClient>) -> Arc<dyn ChainClient> {
    Arc::clone(mock) as Arc<dyn ChainClient>
}

pub fn resolver(mock: &Arc<MockChainClient>) -> ProposalResolver {
    ProposalResolver::new(as_chain(mock))
}

pub fn executor(mock: &Arc<MockChainClient>) -> ProposalExecutor {
    ProposalExecutor::new(as_chain(mock), signer())
}

pub async fn registry_with(addresses: &[&str]) -> Arc<InMemoryDaoRegistry> {
    let registry = Arc::new(InMemoryDaoRegistry::new());
    for address in addresses {
        registry.add(address).await.unwrap();
    }
    registry
}

pub fn engine(mock: &Arc<MockChainClient>, registry: Arc<InMemoryDaoRegistry>) -> ExecutionEngine {
    ExecutionEngine::new(
        registry as Arc<dyn DaoRegistry>,
        resolver(mock),
        executor(mock),
    )
}
