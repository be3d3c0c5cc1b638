use std::time::Duration;

use alloy_primitives::{Address, Bytes, U64, U256};
use alloy_rpc_types_eth::{Filter, Log};
use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{
    ExecutionClient,
    error::ExecutionError,
    rpc_types::EthSyncing,
    utils::{JsonRpcRequest, JsonRpcResponse},
};

#[derive(Clone)]
pub struct ExecutionRpcClient {
    http_client: Client,
    rpc_url: Url,
}

impl ExecutionRpcClient {
    pub fn new(rpc_url: Url, request_timeout: Duration) -> Result<Self, ExecutionError> {
        Ok(Self {
            http_client: Client::builder().timeout(request_timeout).build()?,
            rpc_url,
        })
    }

    pub fn build_request(&self, rpc_request: JsonRpcRequest) -> Result<Request, ExecutionError> {
        Ok(self
            .http_client
            .post(self.rpc_url.clone())
            .json(&rpc_request)
            .build()?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        rpc_request: JsonRpcRequest,
    ) -> Result<T, ExecutionError> {
        let response = self
            .http_client
            .execute(self.build_request(rpc_request)?)
            .await?;

        if !response.status().is_success() {
            return Err(ExecutionError::RequestFailed {
                status_code: response.status(),
            });
        }

        response.json::<JsonRpcResponse<T>>().await?.to_result()
    }

    pub async fn eth_syncing(&self) -> Result<EthSyncing, ExecutionError> {
        self.send(JsonRpcRequest::new("eth_syncing", vec![])).await
    }

    pub async fn eth_block_number(&self) -> Result<U64, ExecutionError> {
        self.send(JsonRpcRequest::new("eth_blockNumber", vec![]))
            .await
    }

    pub async fn eth_get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ExecutionError> {
        self.send(JsonRpcRequest::new("eth_getLogs", vec![json!(filter)]))
            .await
    }

    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, ExecutionError> {
        self.send(JsonRpcRequest::new(
            "eth_call",
            vec![json!({ "to": to, "data": data }), json!("latest")],
        ))
        .await
    }

    pub async fn eth_get_balance(&self, address: Address) -> Result<U256, ExecutionError> {
        self.send(JsonRpcRequest::new(
            "eth_getBalance",
            vec![json!(address), json!("latest")],
        ))
        .await
    }
}

#[async_trait]
impl ExecutionClient for ExecutionRpcClient {
    async fn block_number(&self) -> Result<u64, ExecutionError> {
        Ok(self.eth_block_number().await?.to::<u64>())
    }

    async fn is_synced(&self) -> Result<bool, ExecutionError> {
        Ok(!self.eth_syncing().await?.is_syncing())
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, ExecutionError> {
        self.eth_get_logs(filter).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ExecutionError> {
        self.eth_call(to, data).await
    }

    async fn balance(&self, address: Address) -> Result<U256, ExecutionError> {
        self.eth_get_balance(address).await
    }
}
