use std::time::Duration;

use alloy_primitives::{Address, hex};
use anyhow::anyhow;
use async_trait::async_trait;
use depot_validator::deposit::ExtendedDepositData;
use depot_wallet::Wallet;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    AuthorizationService,
    error::NodeSetError,
    types::{
        DepositDataMeta, DepositDataSet, EncryptedExitData, LoginData, LoginRequest,
        NodeSetResponse, NonceData, RegisteredValidator, RegistrationStatus, SignatureOutcome,
        ValidatorsData, ValidatorsInfo, ValidatorsSignatureData, ValidatorsSignatureRequest,
    },
};

const UNREGISTERED_ADDRESS_KEY: &str = "unregistered_address";
const INVALID_SESSION_KEY: &str = "invalid_session";
const INVALID_PERMISSIONS_KEY: &str = "invalid_permissions";
const VAULT_NOT_FOUND_KEY: &str = "vault_not_found";

const NONCE_PATH: &str = "dev/nonce";
const LOGIN_PATH: &str = "dev/login";
const DEPOSIT_DATA_PATH: &str = "dev/deposit-data";
const DEPOSIT_DATA_META_PATH: &str = "dev/deposit-data/meta";
const VALIDATORS_PATH: &str = "dev/validators";
const VALIDATORS_INFO_PATH: &str = "dev/validators/info";
const VALIDATORS_SIGNATURE_PATH: &str = "dev/validators/signature";

fn login_message(nonce: &str, address: &str) -> String {
    format!(r#"{{"nonce":"{nonce}","address":"{address}"}}"#)
}

#[derive(Debug, Clone)]
pub struct NodeSetConfig {
    pub api_url: Url,
    pub network: String,
    pub deployment: String,
    pub vault: Address,
    pub request_timeout: Duration,
}

#[derive(Debug, Default)]
struct Session {
    token: Option<String>,
    status: RegistrationStatus,
}

/// HTTP client for the NodeSet API. Requests are serialized through the session lock so
/// a re-login never races another request.
pub struct NodeSetClient {
    http: Client,
    config: NodeSetConfig,
    wallet: Wallet,
    session: Mutex<Session>,
}

impl NodeSetClient {
    pub fn new(mut config: NodeSetConfig, wallet: Wallet) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| anyhow!("Failed to build HTTP client {err:?}"))?;
        if !config.api_url.path().ends_with('/') {
            let path = format!("{}/", config.api_url.path());
            config.api_url.set_path(&path);
        }

        Ok(Self {
            http,
            config,
            wallet,
            session: Mutex::new(Session::default()),
        })
    }

    fn vault_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vault", hex::encode(self.config.vault)),
            ("network", self.config.network.clone()),
        ]
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<(StatusCode, NodeSetResponse<T>), NodeSetError> {
        let url = self.config.api_url.join(path)?;
        let mut request = self.http.request(method, url).query(query);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(path, "Sending NodeSet server request");
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let parsed = serde_json::from_slice(&bytes).map_err(|err| {
            NodeSetError::InvalidResponse(format!(
                "NodeSet responded with {status} and an undecodable body ({err}): {}",
                String::from_utf8_lossy(&bytes)
            ))
        })?;
        Ok((status, parsed))
    }

    async fn login_with_session(&self, session: &mut Session) -> Result<(), NodeSetError> {
        let node_wallet = match self.wallet.node_wallet() {
            Ok(node_wallet) => node_wallet,
            Err(err) => {
                session.status = RegistrationStatus::NoWallet;
                return Err(err.into());
            }
        };
        info!("Not authenticated with the NodeSet server, logging in");

        let (status, response) = self
            .send::<NonceData>(Method::GET, NONCE_PATH, &[], None, None)
            .await?;
        let nonce = into_data(status, response)?;
        debug!(nonce = nonce.nonce, "Got nonce for login");

        let address = node_wallet.address().to_checksum(None);
        let signature = node_wallet.sign_message(login_message(&nonce.nonce, &address).as_bytes())?;
        let body = serde_json::to_value(LoginRequest {
            nonce: nonce.nonce,
            address,
            signature,
        })
        .map_err(anyhow::Error::from)?;

        let (status, response) = self
            .send::<LoginData>(Method::POST, LOGIN_PATH, &[], Some(&body), Some(&nonce.token))
            .await?;
        if status == StatusCode::UNAUTHORIZED && response.error == UNREGISTERED_ADDRESS_KEY {
            session.token = None;
            session.status = RegistrationStatus::Unregistered;
            return Err(NodeSetError::NotRegistered);
        }
        let login = into_data(status, response)?;
        session.token = Some(login.token);
        session.status = RegistrationStatus::Registered;
        info!("Logged into NodeSet server");
        Ok(())
    }

    /// Sends an authenticated request, logging in first when there is no session and once
    /// more when the server reports the session as expired.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<Value>,
    ) -> Result<(StatusCode, NodeSetResponse<T>), NodeSetError> {
        let mut session = self.session.lock().await;
        for attempt in 0..2 {
            if session.token.is_none() {
                self.login_with_session(&mut session).await?;
            }

            let (status, response) = self
                .send::<T>(
                    method.clone(),
                    path,
                    query,
                    body.as_ref(),
                    session.token.as_deref(),
                )
                .await?;
            if status == StatusCode::UNAUTHORIZED {
                match response.error.as_str() {
                    UNREGISTERED_ADDRESS_KEY => {
                        session.status = RegistrationStatus::Unregistered;
                        return Err(NodeSetError::NotRegistered);
                    }
                    INVALID_SESSION_KEY if attempt == 0 => {
                        debug!("NodeSet session expired");
                        session.token = None;
                        continue;
                    }
                    _ => {}
                }
            }

            debug!(%status, message = response.message, "NodeSet response");
            return Ok((status, response));
        }

        Err(NodeSetError::InvalidResponse(
            "NodeSet rejected a freshly issued session".to_string(),
        ))
    }
}

fn into_data<T>(status: StatusCode, response: NodeSetResponse<T>) -> Result<T, NodeSetError> {
    if status != StatusCode::OK {
        return Err(NodeSetError::RequestFailed {
            status,
            message: response.message,
        });
    }
    response.data.ok_or_else(|| {
        NodeSetError::InvalidResponse("NodeSet response is missing its data".to_string())
    })
}

fn expect_ok<T>(status: StatusCode, response: NodeSetResponse<T>) -> Result<(), NodeSetError> {
    if status != StatusCode::OK {
        return Err(NodeSetError::RequestFailed {
            status,
            message: response.message,
        });
    }
    Ok(())
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, NodeSetError> {
    Ok(serde_json::to_value(value).map_err(anyhow::Error::from)?)
}

#[async_trait]
impl AuthorizationService for NodeSetClient {
    async fn login(&self) -> Result<(), NodeSetError> {
        let mut session = self.session.lock().await;
        self.login_with_session(&mut session).await
    }

    async fn registration_status(&self) -> Result<RegistrationStatus, NodeSetError> {
        let mut session = self.session.lock().await;
        if !matches!(
            session.status,
            RegistrationStatus::Unknown | RegistrationStatus::NoWallet
        ) {
            return Ok(session.status);
        }

        match self.login_with_session(&mut session).await {
            Ok(()) | Err(NodeSetError::NotRegistered) | Err(NodeSetError::Wallet(_)) => {
                Ok(session.status)
            }
            Err(err) => Err(err),
        }
    }

    async fn deposit_data_version(&self) -> Result<u64, NodeSetError> {
        let (status, response) = self
            .request::<DepositDataMeta>(
                Method::GET,
                DEPOSIT_DATA_META_PATH,
                &self.vault_query(),
                None,
            )
            .await?;
        Ok(into_data(status, response)?.version)
    }

    async fn deposit_data_set(&self) -> Result<DepositDataSet, NodeSetError> {
        let (status, response) = self
            .request::<DepositDataSet>(Method::GET, DEPOSIT_DATA_PATH, &self.vault_query(), None)
            .await?;
        into_data(status, response)
    }

    async fn validators_info(&self) -> Result<ValidatorsInfo, NodeSetError> {
        let mut query = self.vault_query();
        query.push(("deployment", self.config.deployment.clone()));
        let (status, response) = self
            .request::<ValidatorsInfo>(Method::GET, VALIDATORS_INFO_PATH, &query, None)
            .await?;
        into_data(status, response)
    }

    async fn validators_manager_signature(
        &self,
        request: ValidatorsSignatureRequest,
    ) -> Result<SignatureOutcome, NodeSetError> {
        let body = to_body(&request)?;
        let (status, response) = match self
            .request::<ValidatorsSignatureData>(
                Method::POST,
                VALIDATORS_SIGNATURE_PATH,
                &[],
                Some(body),
            )
            .await
        {
            Ok(result) => result,
            Err(NodeSetError::NotRegistered) => return Ok(SignatureOutcome::NotRegistered),
            Err(err) => return Err(err),
        };

        match response.error.as_str() {
            INVALID_PERMISSIONS_KEY => Ok(SignatureOutcome::InvalidPermissions),
            VAULT_NOT_FOUND_KEY => Ok(SignatureOutcome::VaultNotFound),
            _ => Ok(SignatureOutcome::Signed(into_data(status, response)?.signature)),
        }
    }

    async fn registered_validators(&self) -> Result<Vec<RegisteredValidator>, NodeSetError> {
        let query = [("network", self.config.network.clone())];
        let (status, response) = self
            .request::<ValidatorsData>(Method::GET, VALIDATORS_PATH, &query, None)
            .await?;
        Ok(into_data(status, response)?.validators)
    }

    async fn upload_signed_exits(
        &self,
        exits: Vec<EncryptedExitData>,
    ) -> Result<(), NodeSetError> {
        let query = [("network", self.config.network.clone())];
        let (status, response) = self
            .request::<Value>(Method::PATCH, VALIDATORS_PATH, &query, Some(to_body(&exits)?))
            .await?;
        expect_ok(status, response)
    }

    async fn upload_deposit_data(
        &self,
        deposit_data: Vec<ExtendedDepositData>,
    ) -> Result<(), NodeSetError> {
        if deposit_data.is_empty() {
            warn!("Refusing to upload an empty deposit data set");
            return Ok(());
        }
        let (status, response) = self
            .request::<Value>(
                Method::POST,
                DEPOSIT_DATA_PATH,
                &[],
                Some(to_body(&deposit_data)?),
            )
            .await?;
        expect_ok(status, response)
    }
}
