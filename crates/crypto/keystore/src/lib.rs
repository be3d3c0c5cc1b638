pub mod cipher;
pub mod envelope;
pub mod hex_serde;
pub mod kdf;
pub mod keystore;
pub mod password;
