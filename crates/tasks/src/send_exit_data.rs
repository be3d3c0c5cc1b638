use std::sync::Arc;

use anyhow::anyhow;
use depot_bls::PublicKey;
use depot_node::ServiceProvider;
use depot_nodeset::{NodeSetError, exit::encrypt_exit_message, types::EncryptedExitData};
use depot_validator::voluntary_exit::sign_voluntary_exit;
use tracing::{debug, info, warn};

/// Uploads encrypted exits for registered validators that the beacon chain has indexed but
/// whose exit message the authorization service is still missing.
pub struct SendExitDataTask {
    services: Arc<ServiceProvider>,
}

impl SendExitDataTask {
    pub fn new(services: Arc<ServiceProvider>) -> Self {
        Self { services }
    }

    /// Returns how many exit messages were uploaded.
    pub async fn run(&self) -> anyhow::Result<usize> {
        info!("Checking for missing signed exit data");
        let services = &self.services;
        let registered = match services.authorization.registered_validators().await {
            Ok(registered) => registered,
            Err(NodeSetError::NotRegistered) => {
                warn!("Node is not registered with the NodeSet server yet");
                return Ok(0);
            }
            Err(err) => return Err(anyhow!("Failed to get registered validators: {err}")),
        };
        for validator in &registered {
            debug!(
                public_key = ?validator.pubkey,
                uploaded = validator.exit_message_uploaded,
                "Retrieved registered validator"
            );
        }

        let missing = registered
            .into_iter()
            .filter(|validator| !validator.exit_message_uploaded)
            .map(|validator| validator.pubkey)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return Ok(0);
        }

        let statuses = services
            .consensus
            .validator_statuses(&missing)
            .await
            .map_err(|err| anyhow!("Failed to get validator statuses: {err}"))?;
        let indexed = missing
            .into_iter()
            .filter_map(|public_key| match statuses.get(&public_key) {
                Some(status) => Some((public_key, status.index)),
                None => {
                    debug!(?public_key, "Validator doesn't have an index yet");
                    None
                }
            })
            .collect::<Vec<(PublicKey, u64)>>();
        if indexed.is_empty() {
            return Ok(0);
        }

        let epoch = services
            .consensus
            .finalized_epoch()
            .await
            .map_err(|err| anyhow!("Failed to get finalized epoch: {err}"))?;
        let domain = services
            .consensus
            .voluntary_exit_domain(services.network_spec.capella_fork_version)
            .await
            .map_err(|err| anyhow!("Failed to get voluntary exit domain: {err}"))?;
        let encryption_public_key = services.encryption_public_key()?;

        let wallet = services.wallet.clone();
        let public_keys = indexed
            .iter()
            .map(|(public_key, _)| public_key.clone())
            .collect::<Vec<_>>();
        let private_keys =
            tokio::task::spawn_blocking(move || wallet.validator_keys(&public_keys)).await??;

        let mut exits = vec![];
        for (public_key, validator_index) in indexed {
            info!(
                ?public_key,
                validator_index, "Validator is on the beacon chain but is missing a signed exit"
            );
            let Some(private_key) = private_keys.get(&public_key) else {
                warn!(?public_key, "Private key not found");
                continue;
            };
            let exit_message = sign_voluntary_exit(private_key, validator_index, epoch, domain)
                .and_then(|signed_exit| encrypt_exit_message(&signed_exit, encryption_public_key));
            match exit_message {
                Ok(exit_message) => exits.push(EncryptedExitData {
                    pubkey: public_key,
                    exit_message,
                }),
                Err(err) => warn!(?public_key, "Failed to build exit message: {err}"),
            }
        }
        if exits.is_empty() {
            return Ok(0);
        }

        let uploaded = exits
            .iter()
            .map(|exit| exit.pubkey.clone())
            .collect::<Vec<_>>();
        services
            .authorization
            .upload_signed_exits(exits)
            .await
            .map_err(|err| anyhow!("Failed to upload signed exit messages: {err}"))?;
        info!(public_keys = ?uploaded, "Uploaded exit messages");
        Ok(uploaded.len())
    }
}
