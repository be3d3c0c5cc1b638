use aes::{
    Aes128,
    cipher::{BlockEncrypt, KeyInit, generic_array::GenericArray},
};

/// AES-128 in counter mode. Encryption and decryption are the same operation.
pub fn aes128_ctr(buffer: &mut [u8], key: [u8; 16], initial_vector: &[u8; 16]) {
    let cipher = Aes128::new(&key.into());
    let mut counter = u128::from_be_bytes(*initial_vector);

    for chunk in buffer.chunks_mut(16) {
        let mut keystream = GenericArray::from(counter.to_be_bytes());
        cipher.encrypt_block(&mut keystream);
        chunk
            .iter_mut()
            .zip(keystream.iter())
            .for_each(|(byte, key_byte)| *byte ^= key_byte);
        counter = counter.wrapping_add(1);
    }
}
