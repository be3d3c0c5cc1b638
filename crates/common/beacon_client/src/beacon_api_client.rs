use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use depot_api_types::beacon::{
    BeaconResponse, DataResponse, FinalityCheckpoints, Genesis, SyncStatus, ValidatorData,
    ValidatorsQuery,
};
use depot_bls::PublicKey;
use reqwest::{Response, Url};
use serde_json::Value;
use tracing::debug;

use crate::{ConsensusClient, error::ClientError, http_client::ClientWithBaseUrl};

/// Validator ids sent per `POST .../validators` call.
const VALIDATOR_QUERY_BATCH_SIZE: usize = 200;

#[derive(Clone)]
pub struct BeaconApiClient {
    http_client: ClientWithBaseUrl,
}

impl BeaconApiClient {
    pub fn new(beacon_api_endpoint: Url, request_timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            http_client: ClientWithBaseUrl::new(beacon_api_endpoint, request_timeout)?,
        })
    }

    pub async fn get_genesis(&self) -> Result<DataResponse<Genesis>, ClientError> {
        let response = self
            .http_client
            .execute(self.http_client.get("/eth/v1/beacon/genesis")?.build()?)
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    pub async fn get_state_validator_list(
        &self,
        state_id: &str,
        public_keys: &[PublicKey],
    ) -> Result<BeaconResponse<Vec<ValidatorData>>, ClientError> {
        let response = self
            .http_client
            .execute(
                self.http_client
                    .post(format!("/eth/v1/beacon/states/{state_id}/validators"))?
                    .json(&ValidatorsQuery {
                        ids: public_keys.iter().map(PublicKey::to_hex).collect(),
                    })
                    .build()?,
            )
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    pub async fn get_finality_checkpoints(
        &self,
        state_id: &str,
    ) -> Result<BeaconResponse<FinalityCheckpoints>, ClientError> {
        let response = self
            .http_client
            .execute(
                self.http_client
                    .get(format!("/eth/v1/beacon/states/{state_id}/finality_checkpoints"))?
                    .build()?,
            )
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    pub async fn get_node_syncing_status(&self) -> Result<DataResponse<SyncStatus>, ClientError> {
        let response = self
            .http_client
            .execute(self.http_client.get("/eth/v1/node/syncing")?.build()?)
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    pub async fn get_node_version(&self) -> Result<String, ClientError> {
        let response = self
            .http_client
            .execute(self.http_client.get("/eth/v1/node/version")?.build()?)
            .await?;

        let body: DataResponse<Value> = check_status(response)?.json().await?;
        body.data["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidResponse("missing version".to_string()))
    }
}

fn check_status(response: Response) -> Result<Response, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::RequestFailed {
            status_code: response.status(),
        });
    }
    Ok(response)
}

#[async_trait]
impl ConsensusClient for BeaconApiClient {
    async fn validator_statuses(
        &self,
        public_keys: &[PublicKey],
    ) -> Result<HashMap<PublicKey, ValidatorData>, ClientError> {
        let mut statuses = HashMap::with_capacity(public_keys.len());
        for batch in public_keys.chunks(VALIDATOR_QUERY_BATCH_SIZE) {
            let response = self.get_state_validator_list("head", batch).await?;
            for validator in response.data {
                statuses.insert(validator.validator.pubkey.clone(), validator);
            }
        }
        debug!(
            queried = public_keys.len(),
            found = statuses.len(),
            "Fetched validator statuses"
        );
        Ok(statuses)
    }

    async fn is_synced(&self) -> Result<bool, ClientError> {
        let status = self.get_node_syncing_status().await?.data;
        Ok(!status.is_syncing && !status.el_offline)
    }

    async fn finalized_epoch(&self) -> Result<u64, ClientError> {
        Ok(self.get_finality_checkpoints("head").await?.data.finalized.epoch)
    }

    async fn genesis(&self) -> Result<Genesis, ClientError> {
        Ok(self.get_genesis().await?.data)
    }
}
