use std::collections::HashSet;

use alloy_primitives::U256;
use anyhow::anyhow;
use depot_bls::PublicKey;
use depot_node::ServiceProvider;
use depot_validator::{
    deposit::{ExtendedDepositData, generate_deposit_data},
    registerable::get_registerable_keys,
};
use tracing::{info, warn};

use crate::{cli::upload_deposit_data::UploadDepositDataConfig, commands::build_services};

#[derive(Debug, Default)]
pub struct UploadSummary {
    /// Validator keys in the wallet.
    pub total: usize,
    pub uploaded: Vec<PublicKey>,
    /// Unregistered keys the node balance could not pay for.
    pub remaining: Vec<PublicKey>,
    pub remaining_balance: U256,
}

pub async fn run_upload_deposit_data(config: UploadDepositDataConfig) -> anyhow::Result<()> {
    let services = build_services(&config.node)?;
    let summary = upload_deposit_data(&services).await?;
    info!(
        total = summary.total,
        uploaded = summary.uploaded.len(),
        remaining = summary.remaining.len(),
        remaining_balance = %summary.remaining_balance,
        "Deposit data upload finished"
    );
    Ok(())
}

/// Uploads deposit data for wallet keys NodeSet doesn't know yet, as many as the node
/// wallet's balance covers. Registered keys the beacon chain hasn't seen still reserve
/// their share of the balance.
pub async fn upload_deposit_data(services: &ServiceProvider) -> anyhow::Result<UploadSummary> {
    services.wallet.ensure_ready()?;
    let node_address = services.wallet.node_wallet()?.address();

    let registered = services
        .authorization
        .registered_validators()
        .await
        .map_err(|err| anyhow!("Failed to get registered validators: {err}"))?
        .into_iter()
        .map(|validator| validator.pubkey)
        .collect::<HashSet<_>>();

    let wallet = services.wallet.clone();
    let private_keys = tokio::task::spawn_blocking(move || wallet.all_validator_keys()).await??;
    let mut keys = Vec::with_capacity(private_keys.len());
    for private_key in private_keys {
        keys.push((private_key.public_key()?, private_key));
    }
    keys.sort_by_key(|(public_key, _)| public_key.to_hex());

    let unregistered = keys
        .iter()
        .map(|(public_key, _)| public_key)
        .filter(|public_key| !registered.contains(*public_key))
        .cloned()
        .collect::<Vec<_>>();
    let mut summary = UploadSummary {
        total: keys.len(),
        ..Default::default()
    };
    if unregistered.is_empty() {
        info!("All validator keys are already registered with NodeSet");
        return Ok(summary);
    }

    let registered = registered.into_iter().collect::<Vec<_>>();
    let on_beacon = services
        .consensus
        .validator_statuses(&registered)
        .await
        .map_err(|err| anyhow!("Failed to get validator statuses: {err}"))?;
    let pending = registered
        .into_iter()
        .filter(|public_key| !on_beacon.contains_key(public_key))
        .collect::<Vec<_>>();
    let balance = services
        .execution
        .balance(node_address)
        .await
        .map_err(|err| anyhow!("Failed to get node balance: {err}"))?;

    let (registerable, remaining, remaining_balance) =
        get_registerable_keys(&pending, &unregistered, balance);
    summary.remaining = remaining;
    summary.remaining_balance = remaining_balance;
    if registerable.is_empty() {
        warn!(
            %balance,
            pending = pending.len(),
            "Node balance does not cover another deposit, not uploading"
        );
        return Ok(summary);
    }

    let network_spec = &services.network_spec;
    let deposit_data = keys
        .iter()
        .filter(|(public_key, _)| registerable.contains(public_key))
        .map(|(_, private_key)| {
            generate_deposit_data(private_key, network_spec.vault, network_spec)
        })
        .collect::<anyhow::Result<Vec<ExtendedDepositData>>>()?;
    services
        .authorization
        .upload_deposit_data(deposit_data)
        .await
        .map_err(|err| anyhow!("Failed to upload deposit data: {err}"))?;
    info!(public_keys = ?registerable, "Uploaded deposit data");

    summary.uploaded = registerable;
    Ok(summary)
}
