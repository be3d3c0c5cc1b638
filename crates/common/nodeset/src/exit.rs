use alloy_primitives::hex;
use anyhow::anyhow;
use depot_consensus::voluntary_exit::SignedVoluntaryExit;
use depot_keystore::envelope;

/// Encrypts a signed exit for the NodeSet key holder, returning `0x`-prefixed hex of the
/// envelope around its JSON form.
pub fn encrypt_exit_message(
    signed_exit: &SignedVoluntaryExit,
    recipient_public_key: &str,
) -> anyhow::Result<String> {
    let recipient = envelope::parse_recipient(recipient_public_key)?;
    let plaintext = serde_json::to_vec(signed_exit)
        .map_err(|err| anyhow!("Failed to serialize exit message: {err}"))?;
    Ok(hex::encode_prefixed(envelope::encrypt(&plaintext, &recipient)?))
}
