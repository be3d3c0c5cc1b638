pub mod contracts;
pub mod error;
pub mod execution_rpc_client;
pub mod mock;
pub mod registry;
pub mod rpc_types;
pub mod utils;

use alloy_primitives::{Address, Bytes, U256};
use alloy_rpc_types_eth::{Filter, Log};
use async_trait::async_trait;

pub use crate::{
    error::ExecutionError, execution_rpc_client::ExecutionRpcClient, registry::ContractRegistry,
};

/// The slice of the execution JSON-RPC surface the relay reads from. Nothing here sends
/// transactions.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn block_number(&self) -> Result<u64, ExecutionError>;

    async fn is_synced(&self) -> Result<bool, ExecutionError>;

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ExecutionError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ExecutionError>;

    async fn balance(&self, address: Address) -> Result<U256, ExecutionError>;
}
