use std::time::Instant;

use actix_web::{
    HttpResponse, post,
    web::{Data, Json},
};
use depot_api_types::{
    error::ApiError,
    relay::{ValidatorInfo, ValidatorsRequest, ValidatorsResponse},
};
use depot_key_manager::GetAvailableKeysOptions;
use depot_metrics::{RELAY_RESPONSES, inc_int_counter_vec};
use depot_nodeset::{
    exit::encrypt_exit_message,
    types::{SignatureOutcome, ValidatorsSignatureRequest},
};
use depot_validator::{deposit::generate_deposit_data, voluntary_exit::sign_voluntary_exit};
use tracing::{debug, error, info, warn};

use crate::{error::RelayError, state::RelayState};

/// Called by the Operator on `/validators` to get a batch of keys to deposit.
#[post("/validators")]
pub async fn post_validators(
    state: Data<RelayState>,
    request: Json<ValidatorsRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = match state.try_acquire() {
        Some(_busy) => get_validators(&state, request.into_inner()).await,
        None => Err(RelayError::Busy),
    };
    respond(result)
}

fn respond(result: Result<ValidatorsResponse, RelayError>) -> Result<HttpResponse, ApiError> {
    match result {
        Ok(response) => {
            inc_int_counter_vec(&RELAY_RESPONSES, &["200"]);
            info!(validators = response.validators.len(), "Responded with 200 OK");
            Ok(HttpResponse::Ok().json(response))
        }
        Err(err) => {
            let err = ApiError::from(err);
            let status = actix_web::ResponseError::status_code(&err);
            inc_int_counter_vec(&RELAY_RESPONSES, &[status.as_str()]);
            if status.is_server_error() {
                error!("Responded with {status}: {err}");
            } else {
                warn!("Responded with {status}: {err}");
            }
            Err(err)
        }
    }
}

async fn get_validators(
    state: &RelayState,
    request: ValidatorsRequest,
) -> Result<ValidatorsResponse, RelayError> {
    let start = Instant::now();
    let services = &state.services;
    let key_manager = &services.key_manager;
    let network_spec = &services.network_spec;

    if !key_manager.has_loaded_keys().await {
        state.start_key_loading();
        return Err(RelayError::KeysLoading);
    }
    if !key_manager.has_key_candidates().await {
        debug!("No candidate keys present");
        return Ok(ValidatorsResponse::default());
    }
    if request.vault != network_spec.vault {
        return Err(RelayError::VaultMismatch {
            requested: request.vault,
            configured: network_spec.vault,
        });
    }

    services.wallet.ensure_ready()?;
    debug!(elapsed = ?start.elapsed(), "Verified wallet status");

    let execution = services.execution.as_ref();
    let synced = execution
        .is_synced()
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to check execution client: {err}")))?;
    if !synced {
        return Err(RelayError::ExecutionClientNotSynced);
    }
    let deposit_root = services
        .registry
        .deposit_root(execution)
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to get deposit root: {err}")))?;
    let current_block = execution
        .block_number()
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to get block number: {err}")))?;
    debug!(elapsed = ?start.elapsed(), %deposit_root, current_block, "Got deposit root");

    let beacon_synced = services
        .consensus
        .is_synced()
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to check beacon node: {err}")))?;
    if !beacon_synced {
        return Err(RelayError::BeaconNodeNotSynced);
    }
    if state.is_lookback_running() {
        return Err(RelayError::LookbackScanRunning);
    }
    if key_manager.requires_lookback_scan(current_block).await {
        state.start_lookback_scan(deposit_root, current_block);
        return Err(RelayError::LookbackScanRequired);
    }

    let options = GetAvailableKeysOptions {
        skip_sync_check: true,
        do_lookback_scan: false,
    };
    let mut public_keys = key_manager
        .get_available_keys(deposit_root, current_block, options)
        .await?
        .available;
    if public_keys.is_empty() {
        debug!("No available keys");
        return Ok(ValidatorsResponse::default());
    }
    let batch_size = usize::try_from(request.validators_batch_size).unwrap_or(usize::MAX);
    if public_keys.len() > batch_size {
        debug!(
            available = public_keys.len(),
            requested = batch_size,
            "Clamping available keys to requested count"
        );
        public_keys.truncate(batch_size);
    }

    let quota = services.authorization.validators_info().await?.available;
    if quota == 0 {
        debug!("NodeSet has no room for more validators");
        return Ok(ValidatorsResponse::default());
    }
    let quota = usize::try_from(quota).unwrap_or(usize::MAX);
    if public_keys.len() > quota {
        debug!(
            available = public_keys.len(),
            quota, "Clamping available keys to NodeSet limit"
        );
        public_keys.truncate(quota);
    }
    if public_keys.is_empty() {
        return Ok(ValidatorsResponse::default());
    }
    debug!(elapsed = ?start.elapsed(), keys = ?public_keys, "Got available keys");

    let private_keys = key_manager.private_keys(&public_keys).await?;
    let deposit_data = private_keys
        .iter()
        .map(|private_key| generate_deposit_data(private_key, network_spec.vault, network_spec))
        .collect::<anyhow::Result<Vec<_>>>()?;
    debug!(elapsed = ?start.elapsed(), "Generated deposit data");

    let epoch = services
        .consensus
        .finalized_epoch()
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to get finalized epoch: {err}")))?;
    let domain = services
        .consensus
        .voluntary_exit_domain(network_spec.capella_fork_version)
        .await
        .map_err(|err| RelayError::Internal(format!("Failed to get exit domain: {err}")))?;
    let start_index = request.validators_start_index;
    let signed_exits = private_keys
        .iter()
        .enumerate()
        .map(|(offset, private_key)| -> Result<_, RelayError> {
            let validator_index = u64::try_from(offset)
                .ok()
                .and_then(|offset| start_index.checked_add(offset))
                .ok_or(RelayError::ValidatorIndexOverflow { start_index })?;
            Ok(sign_voluntary_exit(
                private_key,
                validator_index,
                epoch,
                domain,
            )?)
        })
        .collect::<Result<Vec<_>, RelayError>>()?;
    let encryption_public_key = services.encryption_public_key()?;
    let encrypted_exits = signed_exits
        .iter()
        .map(|signed_exit| encrypt_exit_message(signed_exit, encryption_public_key))
        .collect::<anyhow::Result<Vec<_>>>()?;
    debug!(elapsed = ?start.elapsed(), epoch, "Signed and encrypted exit messages");

    let outcome = services
        .authorization
        .validators_manager_signature(ValidatorsSignatureRequest {
            deployment: network_spec.deployment.clone(),
            vault: network_spec.vault,
            beacon_deposit_root: deposit_root,
            deposit_data: deposit_data.clone(),
            encrypted_exit_messages: encrypted_exits,
        })
        .await?;
    let signature = match outcome {
        SignatureOutcome::Signed(signature) => signature,
        SignatureOutcome::NotRegistered => return Err(RelayError::NotRegistered),
        SignatureOutcome::InvalidPermissions => return Err(RelayError::InvalidPermissions),
        SignatureOutcome::VaultNotFound => {
            return Err(RelayError::VaultNotFound {
                vault: network_spec.vault,
                deployment: network_spec.deployment.clone(),
            });
        }
    };
    debug!(elapsed = ?start.elapsed(), %signature, "Got validators signature from NodeSet");

    key_manager
        .set_last_deposit_root(&public_keys, deposit_root)
        .await?;
    debug!(elapsed = ?start.elapsed(), "Updated available keys with last deposit root");

    let validators = deposit_data
        .into_iter()
        .zip(signed_exits)
        .map(|(deposit, signed_exit)| ValidatorInfo {
            public_key: deposit.public_key,
            deposit_signature: deposit.signature.to_hex(),
            amount_gwei: deposit.amount,
            exit_signature: signed_exit.signature.to_hex(),
        })
        .collect();
    debug!(elapsed = ?start.elapsed(), "Relay processing complete");
    Ok(ValidatorsResponse {
        validators,
        validators_manager_signature: signature,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{
        App,
        http::StatusCode,
        test::{TestRequest, call_service, init_service, read_body_json},
    };
    use alloy_primitives::{Address, B256};
    use depot_api_types::error::ErrorResponse;
    use depot_node::mock::{MOCK_HEAD_BLOCK, MockServices};
    use tempdir::TempDir;

    use super::*;

    struct Relay {
        _dir: TempDir,
        services: MockServices,
        state: Data<RelayState>,
    }

    /// A relay whose keys are loaded and already covered by a lookback scan.
    async fn relay(keys: usize) -> Relay {
        let dir = TempDir::new("relay").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services.generate_keys(keys).await.unwrap();
        let key_manager = &services.provider.key_manager;
        key_manager.load_private_keys().await.unwrap();
        let options = GetAvailableKeysOptions {
            skip_sync_check: false,
            do_lookback_scan: true,
        };
        key_manager
            .get_available_keys(B256::ZERO, MOCK_HEAD_BLOCK, options)
            .await
            .unwrap();

        let state = Data::new(RelayState::new(services.provider.clone()));
        Relay {
            _dir: dir,
            services,
            state,
        }
    }

    fn request(relay: &Relay, batch_size: u64) -> ValidatorsRequest {
        ValidatorsRequest {
            vault: relay.services.provider.network_spec.vault,
            validators_start_index: 40,
            validators_batch_size: batch_size,
            validators_total: batch_size,
        }
    }

    macro_rules! call {
        ($app:expr, $request:expr) => {
            call_service(
                &$app,
                TestRequest::post()
                    .uri("/validators")
                    .set_json($request)
                    .to_request(),
            )
            .await
        };
    }

    macro_rules! app {
        ($relay:expr) => {
            init_service(
                App::new()
                    .app_data($relay.state.clone())
                    .service(post_validators),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_batch_is_clamped_to_available_keys() {
        let relay = relay(3).await;
        let app = app!(relay);

        let response = call!(app, &request(&relay, 10));
        assert_eq!(response.status(), StatusCode::OK);
        let body: ValidatorsResponse = read_body_json(response).await;
        assert_eq!(body.validators.len(), 3);
        assert_eq!(body.validators_manager_signature, "0xc0ffee");
        assert!(
            body.validators
                .iter()
                .all(|validator| validator.amount_gwei == 32_000_000_000)
        );

        let requests = relay.services.authorization.signature_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].deposit_data.len(), 3);
        assert_eq!(requests[0].encrypted_exit_messages.len(), 3);
    }

    #[actix_web::test]
    async fn test_keys_are_not_handed_out_twice_for_one_root() {
        let relay = relay(3).await;
        let app = app!(relay);

        let first: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 2))).await;
        assert_eq!(first.validators.len(), 2);
        let second: ValidatorsResponse =
            read_body_json(call!(app, &request(&relay, 2))).await;
        assert_eq!(second.validators.len(), 1);
        assert!(
            first
                .validators
                .iter()
                .all(|validator| validator.public_key != second.validators[0].public_key)
        );

        relay
            .services
            .execution
            .set_deposit_root(B256::repeat_byte(0x42));
        let third: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 10))).await;
        assert_eq!(third.validators.len(), 3);
    }

    #[actix_web::test]
    async fn test_zero_quota_returns_empty_list() {
        let relay = relay(2).await;
        relay.services.authorization.set_available(0);
        let app = app!(relay);

        let response = call!(app, &request(&relay, 10));
        assert_eq!(response.status(), StatusCode::OK);
        let body: ValidatorsResponse = read_body_json(response).await;
        assert!(body.validators.is_empty());
        assert!(relay.services.authorization.signature_requests().is_empty());
    }

    #[actix_web::test]
    async fn test_quota_clamps_batch() {
        let relay = relay(3).await;
        relay.services.authorization.set_available(1);
        let app = app!(relay);

        let body: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 10))).await;
        assert_eq!(body.validators.len(), 1);
    }

    #[actix_web::test]
    async fn test_validator_index_overflow_is_rejected() {
        let relay = relay(2).await;
        let app = app!(relay);
        let overflowing = ValidatorsRequest {
            validators_start_index: u64::MAX,
            ..request(&relay, 2)
        };

        let response = call!(app, &overflowing);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(relay.services.authorization.signature_requests().is_empty());

        let body: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 2))).await;
        assert_eq!(body.validators.len(), 2);
    }

    #[actix_web::test]
    async fn test_busy_relay_rejects_requests() {
        let relay = relay(1).await;
        let app = app!(relay);

        let _busy = relay.state.try_acquire().unwrap();
        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[actix_web::test]
    async fn test_unloaded_keys_answer_unavailable() {
        let dir = TempDir::new("relay").unwrap();
        let services = MockServices::new(dir.path()).unwrap();
        services.generate_keys(1).await.unwrap();
        let relay = Relay {
            _dir: dir,
            state: Data::new(RelayState::new(services.provider.clone())),
            services,
        };
        let app = app!(relay);

        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = read_body_json(response).await;
        assert!(body.error.contains("still being loaded"));
    }

    #[actix_web::test]
    async fn test_lookback_scan_runs_in_background() {
        let relay = relay(1).await;
        let fresh = relay.services.generate_keys(1).await.unwrap();
        let app = app!(relay);

        let response = call!(app, &request(&relay, 10));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        for _ in 0..500 {
            if !relay.state.is_lookback_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!relay.state.is_lookback_running());

        let body: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 10))).await;
        assert_eq!(body.validators.len(), 2);
        assert!(
            body.validators
                .iter()
                .any(|validator| validator.public_key == fresh[0])
        );
    }

    #[actix_web::test]
    async fn test_signature_outcomes_map_to_statuses() {
        let relay = relay(1).await;
        let app = app!(relay);

        relay
            .services
            .authorization
            .set_signature_outcome(SignatureOutcome::InvalidPermissions);
        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        relay
            .services
            .authorization
            .set_signature_outcome(SignatureOutcome::VaultNotFound);
        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        relay
            .services
            .authorization
            .set_signature_outcome(SignatureOutcome::NotRegistered);
        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // None of the failed requests provisioned the key.
        relay
            .services
            .authorization
            .set_signature_outcome(SignatureOutcome::Signed("0xbeef".to_string()));
        let body: ValidatorsResponse = read_body_json(call!(app, &request(&relay, 1))).await;
        assert_eq!(body.validators.len(), 1);
    }

    #[actix_web::test]
    async fn test_unsynced_execution_client_is_unprocessable() {
        let relay = relay(1).await;
        relay.services.execution.set_synced(false);
        let app = app!(relay);

        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_unregistered_node_is_unprocessable() {
        let relay = relay(1).await;
        relay
            .services
            .authorization
            .set_registration_status(depot_nodeset::types::RegistrationStatus::Unregistered);
        let app = app!(relay);

        let response = call!(app, &request(&relay, 1));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_other_vault_is_rejected() {
        let relay = relay(1).await;
        let app = app!(relay);

        let mut request = request(&relay, 1);
        request.vault = Address::repeat_byte(0x99);
        let response = call!(app, &request);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_no_keys_returns_empty_list() {
        let relay = relay(0).await;
        let app = app!(relay);

        let response = call!(app, &request(&relay, 5));
        assert_eq!(response.status(), StatusCode::OK);
        let body: ValidatorsResponse = read_body_json(response).await;
        assert!(body.validators.is_empty());
    }
}
