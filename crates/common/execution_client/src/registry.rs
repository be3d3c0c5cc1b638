use alloy_primitives::{Address, B256, Bytes};
use alloy_rpc_types_eth::Filter;
use alloy_sol_types::{SolCall, SolEvent};
use depot_bls::PublicKey;
use depot_network_spec::networks::NetworkSpec;
use tracing::warn;

use crate::{
    ExecutionClient,
    contracts::{
        DepositContract::{self, DepositEvent},
        IMulticall3::{self, Call3},
        Vault,
    },
    error::ExecutionError,
};

/// A deposit observed on the beacon deposit contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositEventLog {
    pub public_key: PublicKey,
    pub withdrawal_credentials: Bytes,
    pub amount: u64,
    pub index: u64,
    pub block_number: Option<u64>,
}

/// Contract addresses resolved once at startup. Every on-chain read goes through here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRegistry {
    pub deposit_contract: Address,
    pub vault: Address,
    pub multicall: Address,
}

impl ContractRegistry {
    pub fn new(network_spec: &NetworkSpec) -> Self {
        Self {
            deposit_contract: network_spec.deposit_contract_address,
            vault: network_spec.vault,
            multicall: network_spec.multicall_address,
        }
    }

    /// Runs all `calls` in one `aggregate3` round trip and returns their raw results in order.
    pub async fn multicall(
        &self,
        client: &dyn ExecutionClient,
        calls: Vec<Call3>,
    ) -> Result<Vec<Bytes>, ExecutionError> {
        let data = IMulticall3::aggregate3Call { calls }.abi_encode();
        let response = client.call(self.multicall, data.into()).await?;
        let results = IMulticall3::aggregate3Call::abi_decode_returns(&response)?;

        results
            .into_iter()
            .enumerate()
            .map(|(index, result)| {
                if result.success {
                    Ok(result.returnData)
                } else {
                    Err(ExecutionError::ContractCall(format!(
                        "multicall entry {index} reverted"
                    )))
                }
            })
            .collect()
    }

    pub async fn deposit_root(&self, client: &dyn ExecutionClient) -> Result<B256, ExecutionError> {
        let results = self
            .multicall(
                client,
                vec![Call3 {
                    target: self.deposit_contract,
                    allowFailure: false,
                    callData: DepositContract::get_deposit_rootCall {}.abi_encode().into(),
                }],
            )
            .await?;
        let data = first_result(results)?;
        Ok(DepositContract::get_deposit_rootCall::abi_decode_returns(&data)?)
    }

    /// Merkle root of the deposit-data set the vault currently accepts.
    pub async fn validators_root(
        &self,
        client: &dyn ExecutionClient,
    ) -> Result<B256, ExecutionError> {
        let results = self
            .multicall(
                client,
                vec![Call3 {
                    target: self.vault,
                    allowFailure: false,
                    callData: Vault::validatorsRootCall {}.abi_encode().into(),
                }],
            )
            .await?;
        let data = first_result(results)?;
        Ok(Vault::validatorsRootCall::abi_decode_returns(&data)?)
    }

    /// Deposit events emitted in `[from_block, to_block]`, inclusive.
    pub async fn deposit_events(
        &self,
        client: &dyn ExecutionClient,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DepositEventLog>, ExecutionError> {
        let filter = Filter::new()
            .address(self.deposit_contract)
            .event_signature(DepositEvent::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let mut events = vec![];
        for log in client.get_logs(&filter).await? {
            let block_number = log.block_number;
            let event = match log.log_decode::<DepositEvent>() {
                Ok(decoded) => decoded.inner.data,
                Err(err) => {
                    warn!(?block_number, "Skipping undecodable deposit log: {err}");
                    continue;
                }
            };
            let public_key = match PublicKey::from_bytes(&event.pubkey) {
                Ok(public_key) => public_key,
                Err(err) => {
                    warn!(?block_number, "Skipping deposit with malformed pubkey: {err}");
                    continue;
                }
            };
            events.push(DepositEventLog {
                public_key,
                withdrawal_credentials: event.withdrawal_credentials,
                amount: little_endian_u64(&event.amount),
                index: little_endian_u64(&event.index),
                block_number,
            });
        }
        Ok(events)
    }
}

fn first_result(results: Vec<Bytes>) -> Result<Bytes, ExecutionError> {
    results
        .into_iter()
        .next()
        .ok_or_else(|| ExecutionError::ContractCall("empty multicall response".to_string()))
}

/// The deposit contract emits amounts and indices as 8-byte little-endian blobs.
fn little_endian_u64(bytes: &[u8]) -> u64 {
    let mut buffer = [0u8; 8];
    let length = bytes.len().min(8);
    buffer[..length].copy_from_slice(&bytes[..length]);
    u64::from_le_bytes(buffer)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use depot_bls::PrivateKey;
    use depot_network_spec::networks::DEV;

    use super::*;
    use crate::mock::MockExecutionClient;

    #[tokio::test]
    async fn test_roots_through_multicall() {
        let registry = ContractRegistry::new(&DEV);
        let client = MockExecutionClient::new(registry.clone());
        client.set_deposit_root(B256::repeat_byte(0x11));
        client.set_validators_root(B256::repeat_byte(0x22));

        assert_eq!(
            registry.deposit_root(&client).await.unwrap(),
            B256::repeat_byte(0x11)
        );
        assert_eq!(
            registry.validators_root(&client).await.unwrap(),
            B256::repeat_byte(0x22)
        );
    }

    #[tokio::test]
    async fn test_deposit_events_in_range() {
        let registry = ContractRegistry::new(&DEV);
        let client = MockExecutionClient::new(registry.clone());
        let early = PrivateKey::generate().unwrap().public_key().unwrap();
        let late = PrivateKey::generate().unwrap().public_key().unwrap();
        client.add_deposit(&early, 100);
        client.add_deposit(&late, 9_000);

        let events = registry.deposit_events(&client, 0, 5_039).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].public_key, early);
        assert_eq!(events[0].amount, 32_000_000_000);
        assert_eq!(events[0].block_number, Some(100));
    }

    #[test]
    fn test_little_endian_u64() {
        assert_eq!(little_endian_u64(&[0x00, 0x40, 0x59, 0x73, 0x07, 0, 0, 0]), 32_000_000_000);
    }
}
