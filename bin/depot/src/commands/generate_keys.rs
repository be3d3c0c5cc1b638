use depot_bls::PublicKey;
use depot_node::ServiceProvider;
use tracing::info;

use crate::{cli::generate_keys::GenerateKeysConfig, commands::build_services};

pub async fn run_generate_keys(config: GenerateKeysConfig) -> anyhow::Result<()> {
    let services = build_services(&config.node)?;
    let public_keys = generate_keys(&services, config.count).await?;
    for public_key in &public_keys {
        info!(?public_key, "Generated validator key");
    }
    info!(
        count = public_keys.len(),
        "Generated validator keys, run upload-deposit-data to register them"
    );
    Ok(())
}

/// Creates `count` keystores and adds each key to the available key list.
pub async fn generate_keys(
    services: &ServiceProvider,
    count: u64,
) -> anyhow::Result<Vec<PublicKey>> {
    services.wallet.ensure_ready()?;
    let mut public_keys = vec![];
    for _ in 0..count {
        let wallet = services.wallet.clone();
        let private_key = tokio::task::spawn_blocking(move || wallet.generate_validator_key())
            .await??;
        services.key_manager.add_new_key(&private_key).await?;
        public_keys.push(private_key.public_key()?);
    }
    Ok(public_keys)
}
