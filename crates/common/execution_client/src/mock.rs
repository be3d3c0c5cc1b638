use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
};

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_rpc_types_eth::{Filter, Log};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use depot_bls::PublicKey;

use crate::{
    ExecutionClient,
    contracts::{DepositContract, IMulticall3, Vault},
    error::ExecutionError,
    registry::ContractRegistry,
};

const MOCK_DEPOSIT_AMOUNT_GWEI: u64 = 32_000_000_000;

/// In-memory execution node that understands the handful of contract calls the relay makes.
#[derive(Debug)]
pub struct MockExecutionClient {
    registry: ContractRegistry,
    block_number: AtomicU64,
    not_synced: AtomicBool,
    deposit_root: Mutex<B256>,
    validators_root: Mutex<B256>,
    balances: Mutex<HashMap<Address, U256>>,
    logs: Mutex<Vec<Log>>,
    fail_logs_from_block: Mutex<Option<u64>>,
    log_queries: AtomicUsize,
}

impl MockExecutionClient {
    pub fn new(registry: ContractRegistry) -> Self {
        Self {
            registry,
            block_number: AtomicU64::new(0),
            not_synced: AtomicBool::new(false),
            deposit_root: Mutex::new(B256::ZERO),
            validators_root: Mutex::new(B256::ZERO),
            balances: Mutex::new(HashMap::new()),
            logs: Mutex::new(vec![]),
            fail_logs_from_block: Mutex::new(None),
            log_queries: AtomicUsize::new(0),
        }
    }

    pub fn set_block_number(&self, block_number: u64) {
        self.block_number.store(block_number, Ordering::SeqCst);
    }

    pub fn set_synced(&self, synced: bool) {
        self.not_synced.store(!synced, Ordering::SeqCst);
    }

    pub fn set_deposit_root(&self, root: B256) {
        if let Ok(mut deposit_root) = self.deposit_root.lock() {
            *deposit_root = root;
        }
    }

    pub fn set_validators_root(&self, root: B256) {
        if let Ok(mut validators_root) = self.validators_root.lock() {
            *validators_root = root;
        }
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        if let Ok(mut balances) = self.balances.lock() {
            balances.insert(address, balance);
        }
    }

    /// Any `eth_getLogs` whose range reaches `block` fails until cleared with `None`.
    pub fn fail_logs_from_block(&self, block: Option<u64>) {
        if let Ok(mut fail_from) = self.fail_logs_from_block.lock() {
            *fail_from = block;
        }
    }

    pub fn log_queries(&self) -> usize {
        self.log_queries.load(Ordering::SeqCst)
    }

    pub fn add_deposit(&self, public_key: &PublicKey, block_number: u64) {
        let event = DepositContract::DepositEvent {
            pubkey: Bytes::copy_from_slice(public_key.to_bytes()),
            withdrawal_credentials: Bytes::from(vec![0u8; 32]),
            amount: Bytes::copy_from_slice(&MOCK_DEPOSIT_AMOUNT_GWEI.to_le_bytes()),
            signature: Bytes::from(vec![0u8; 96]),
            index: Bytes::copy_from_slice(&block_number.to_le_bytes()),
        };
        let log = Log {
            inner: alloy_primitives::Log {
                address: self.registry.deposit_contract,
                data: event.encode_log_data(),
            },
            block_number: Some(block_number),
            ..Default::default()
        };
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(log);
        }
    }

    fn answer_call(&self, to: Address, data: &[u8]) -> Result<Bytes, ExecutionError> {
        let selector = data.get(..4).unwrap_or_default();
        if to == self.registry.multicall && selector == IMulticall3::aggregate3Call::SELECTOR {
            let calls = IMulticall3::aggregate3Call::abi_decode(data)?.calls;
            let results = calls
                .into_iter()
                .map(|call| match self.answer_call(call.target, &call.callData) {
                    Ok(return_data) => IMulticall3::Result {
                        success: true,
                        returnData: return_data,
                    },
                    Err(_) => IMulticall3::Result {
                        success: false,
                        returnData: Bytes::new(),
                    },
                })
                .collect::<Vec<_>>();
            return Ok(results.abi_encode().into());
        }
        if to == self.registry.deposit_contract
            && selector == DepositContract::get_deposit_rootCall::SELECTOR
        {
            let root = *self
                .deposit_root
                .lock()
                .map_err(|err| ExecutionError::ContractCall(err.to_string()))?;
            return Ok(root.abi_encode().into());
        }
        if to == self.registry.vault && selector == Vault::validatorsRootCall::SELECTOR {
            let root = *self
                .validators_root
                .lock()
                .map_err(|err| ExecutionError::ContractCall(err.to_string()))?;
            return Ok(root.abi_encode().into());
        }
        Err(ExecutionError::ContractCall(format!(
            "no mock for call to {to}"
        )))
    }
}

#[async_trait]
impl ExecutionClient for MockExecutionClient {
    async fn block_number(&self) -> Result<u64, ExecutionError> {
        Ok(self.block_number.load(Ordering::SeqCst))
    }

    async fn is_synced(&self) -> Result<bool, ExecutionError> {
        Ok(!self.not_synced.load(Ordering::SeqCst))
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ExecutionError> {
        self.log_queries.fetch_add(1, Ordering::SeqCst);
        let from_block = filter.get_from_block().unwrap_or_default();
        let to_block = filter.get_to_block().unwrap_or(u64::MAX);

        let fail_from = *self
            .fail_logs_from_block
            .lock()
            .map_err(|err| ExecutionError::ContractCall(err.to_string()))?;
        if let Some(fail_from) = fail_from
            && to_block >= fail_from
        {
            return Err(ExecutionError::ContractCall(format!(
                "mock eth_getLogs failure for blocks {from_block}..={to_block}"
            )));
        }

        let logs = self
            .logs
            .lock()
            .map_err(|err| ExecutionError::ContractCall(err.to_string()))?;
        Ok(logs
            .iter()
            .filter(|log| {
                log.block_number
                    .is_some_and(|block| block >= from_block && block <= to_block)
            })
            .filter(|log| {
                log.inner.data.topics().first()
                    == Some(&DepositContract::DepositEvent::SIGNATURE_HASH)
            })
            .cloned()
            .collect())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ExecutionError> {
        self.answer_call(to, &data)
    }

    async fn balance(&self, address: Address) -> Result<U256, ExecutionError> {
        let balances = self
            .balances
            .lock()
            .map_err(|err| ExecutionError::ContractCall(err.to_string()))?;
        Ok(balances.get(&address).copied().unwrap_or_default())
    }
}
