use alloy_primitives::B256;
use sha2::{Digest, Sha256};

const SHA256_BLOCK_SIZE: usize = 64;
const INNER_PAD: u8 = 0x36;
const OUTER_PAD: u8 = 0x5c;

/// HMAC-SHA256 as defined in RFC 2104.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> B256 {
    let mut block_key = [0u8; SHA256_BLOCK_SIZE];
    if key.len() > SHA256_BLOCK_SIZE {
        block_key[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        block_key[..key.len()].copy_from_slice(key);
    }

    let inner_hash = Sha256::new()
        .chain_update(block_key.map(|byte| byte ^ INNER_PAD))
        .chain_update(message)
        .finalize();

    B256::from_slice(
        &Sha256::new()
            .chain_update(block_key.map(|byte| byte ^ OUTER_PAD))
            .chain_update(inner_hash)
            .finalize(),
    )
}

/// PBKDF2 with HMAC-SHA256 as the pseudo random function (RFC 8018 section 5.2).
pub fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32, length: usize) -> Vec<u8> {
    let mut derived_key = Vec::with_capacity(length);
    let mut block_index = 1u32;

    while derived_key.len() < length {
        let mut previous = hmac_sha256(password, &[salt, &block_index.to_be_bytes()].concat());
        let mut block = previous;
        for _ in 1..iterations {
            previous = hmac_sha256(password, previous.as_slice());
            block
                .iter_mut()
                .zip(previous.iter())
                .for_each(|(block_byte, previous_byte)| *block_byte ^= previous_byte);
        }

        let remaining = length - derived_key.len();
        derived_key.extend_from_slice(&block[..remaining.min(32)]);
        block_index += 1;
    }

    derived_key
}
