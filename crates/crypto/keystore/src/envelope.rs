//! Public-key encryption of small secrets (signed exit messages) for an external
//! recipient identified by a secp256k1 public key.
//!
//! Layout: `ephemeral_public_key (33) || iv (16) || ciphertext || tag (32)` where the
//! tag is HMAC-SHA256 over `iv || ciphertext`.

use anyhow::{anyhow, ensure};
use hkdf::Hkdf;
use k256::{PublicKey, SecretKey, ecdh::diffie_hellman, elliptic_curve::sec1::ToEncodedPoint};
use sha2::Sha256;

use crate::{cipher::aes128_ctr, kdf::hmac_sha256};

const COMPRESSED_POINT_LENGTH: usize = 33;
const IV_LENGTH: usize = 16;
const TAG_LENGTH: usize = 32;
const HKDF_INFO: &[u8] = b"depot exit message envelope";

fn derive_keys(secret: &SecretKey, peer: &PublicKey) -> anyhow::Result<([u8; 16], [u8; 16])> {
    let shared_secret = diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    let mut output_key_material = [0u8; 32];
    Hkdf::<Sha256>::new(None, shared_secret.raw_secret_bytes())
        .expand(HKDF_INFO, &mut output_key_material)
        .map_err(|err| anyhow!("Failed to expand envelope keys: {err}"))?;

    let mut encryption_key = [0u8; 16];
    let mut mac_key = [0u8; 16];
    encryption_key.copy_from_slice(&output_key_material[..16]);
    mac_key.copy_from_slice(&output_key_material[16..]);
    Ok((encryption_key, mac_key))
}

pub fn random_secret_key() -> SecretKey {
    loop {
        if let Ok(secret_key) = SecretKey::from_slice(&rand::random::<[u8; 32]>()) {
            return secret_key;
        }
    }
}

/// Compressed SEC1 hex of the public half of `secret_key`, as `parse_recipient` accepts it.
pub fn recipient_hex(secret_key: &SecretKey) -> String {
    alloy_primitives::hex::encode(secret_key.public_key().to_encoded_point(true).as_bytes())
}

/// Parses a SEC1 encoded (compressed or uncompressed) secp256k1 public key given as hex.
pub fn parse_recipient(recipient_hex: &str) -> anyhow::Result<PublicKey> {
    let bytes = alloy_primitives::hex::decode(recipient_hex.trim_start_matches("0x"))
        .map_err(|err| anyhow!("Recipient key is not valid hex: {err}"))?;
    PublicKey::from_sec1_bytes(&bytes).map_err(|err| anyhow!("Invalid recipient key: {err}"))
}

pub fn encrypt(plaintext: &[u8], recipient: &PublicKey) -> anyhow::Result<Vec<u8>> {
    let ephemeral_secret = random_secret_key();
    let (encryption_key, mac_key) = derive_keys(&ephemeral_secret, recipient)?;
    let initial_vector = rand::random::<[u8; IV_LENGTH]>();

    let mut ciphertext = plaintext.to_vec();
    aes128_ctr(&mut ciphertext, encryption_key, &initial_vector);
    let tag = hmac_sha256(&mac_key, &[&initial_vector[..], &ciphertext[..]].concat());

    let ephemeral_public_key = ephemeral_secret.public_key().to_encoded_point(true);
    Ok([
        ephemeral_public_key.as_bytes(),
        &initial_vector[..],
        &ciphertext[..],
        tag.as_slice(),
    ]
    .concat())
}

pub fn decrypt(envelope: &[u8], recipient_secret: &SecretKey) -> anyhow::Result<Vec<u8>> {
    ensure!(
        envelope.len() >= COMPRESSED_POINT_LENGTH + IV_LENGTH + TAG_LENGTH,
        "Envelope is too short"
    );
    let (ephemeral_public_key, rest) = envelope.split_at(COMPRESSED_POINT_LENGTH);
    let (initial_vector, rest) = rest.split_at(IV_LENGTH);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_LENGTH);

    let ephemeral_public_key = PublicKey::from_sec1_bytes(ephemeral_public_key)
        .map_err(|err| anyhow!("Invalid ephemeral key: {err}"))?;
    let (encryption_key, mac_key) = derive_keys(recipient_secret, &ephemeral_public_key)?;

    let expected_tag = hmac_sha256(&mac_key, &[initial_vector, ciphertext].concat());
    ensure!(expected_tag.as_slice() == tag, "Envelope authentication failed");

    let initial_vector: &[u8; IV_LENGTH] = initial_vector
        .try_into()
        .map_err(|err| anyhow!("Invalid initial vector: {err:?}"))?;
    let mut plaintext = ciphertext.to_vec();
    aes128_ctr(&mut plaintext, encryption_key, initial_vector);
    Ok(plaintext)
}
