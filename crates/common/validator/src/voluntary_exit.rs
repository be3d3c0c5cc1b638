use alloy_primitives::B256;
use anyhow::anyhow;
use depot_bls::{PrivateKey, traits::Signable};
use depot_consensus::{
    misc::compute_signing_root,
    voluntary_exit::{SignedVoluntaryExit, VoluntaryExit},
};

/// Signs an exit for `validator_index` at `epoch`. `domain` comes from
/// `ConsensusClient::voluntary_exit_domain`, which pins it to the Capella fork.
pub fn sign_voluntary_exit(
    private_key: &PrivateKey,
    validator_index: u64,
    epoch: u64,
    domain: B256,
) -> anyhow::Result<SignedVoluntaryExit> {
    let voluntary_exit = VoluntaryExit {
        epoch,
        validator_index,
    };

    Ok(SignedVoluntaryExit {
        signature: private_key
            .sign(compute_signing_root(&voluntary_exit, domain).as_ref())
            .map_err(|err| anyhow!("Failed to sign voluntary exit: {err}"))?,
        message: voluntary_exit,
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::fixed_bytes;
    use depot_bls::traits::Verifiable;
    use depot_consensus::{constants::DOMAIN_VOLUNTARY_EXIT, misc::compute_domain};

    use super::*;

    #[test]
    fn test_exit_signature_verifies_under_its_domain() {
        let private_key = PrivateKey::generate().unwrap();
        let public_key = private_key.public_key().unwrap();
        let domain = compute_domain(
            DOMAIN_VOLUNTARY_EXIT,
            Some(fixed_bytes!("0x03000000")),
            Some(B256::repeat_byte(0x4b)),
        );

        let signed_exit = sign_voluntary_exit(&private_key, 1234, 300_000, domain).unwrap();
        let signing_root = compute_signing_root(&signed_exit.message, domain);
        assert!(signed_exit.signature.verify(&public_key, signing_root.as_ref()).unwrap());

        let other_domain = compute_domain(DOMAIN_VOLUNTARY_EXIT, None, None);
        let other_root = compute_signing_root(&signed_exit.message, other_domain);
        assert!(!signed_exit.signature.verify(&public_key, other_root.as_ref()).unwrap());
    }

    #[test]
    fn test_exit_message_json_uses_quoted_integers() {
        let private_key = PrivateKey::generate().unwrap();
        let signed_exit = sign_voluntary_exit(&private_key, 7, 9, B256::ZERO).unwrap();

        let json = serde_json::to_value(&signed_exit).unwrap();
        assert_eq!(json["message"]["epoch"], "9");
        assert_eq!(json["message"]["validator_index"], "7");
        assert!(json["signature"].as_str().unwrap().starts_with("0x"));
    }
}
