use alloy_primitives::{Address, B256, Bytes};
use depot_bls::PublicKey;
use depot_validator::deposit::ExtendedDepositData;
use serde::{Deserialize, Serialize};

/// Envelope shared by every NodeSet response. `data` is only present when `ok` is set.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct NodeSetResponse<T> {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStatus {
    #[default]
    Unknown,
    NoWallet,
    Unregistered,
    Registered,
}

#[derive(Debug, Deserialize)]
pub struct NonceData {
    pub nonce: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub nonce: String,
    pub address: String,
    pub signature: Bytes,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct DepositDataMeta {
    pub version: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositDataSet {
    pub version: u64,
    #[serde(rename = "depositData")]
    pub deposit_data: Vec<ExtendedDepositData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredValidator {
    pub pubkey: PublicKey,
    pub status: String,
    #[serde(rename = "exitMessage")]
    pub exit_message_uploaded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidatorsData {
    pub validators: Vec<RegisteredValidator>,
}

/// Registration quota for this node on the vault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorsInfo {
    pub active: u64,
    pub max: u64,
    pub available: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedExitData {
    pub pubkey: PublicKey,
    pub exit_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorsSignatureRequest {
    pub deployment: String,
    pub vault: Address,
    pub beacon_deposit_root: B256,
    pub deposit_data: Vec<ExtendedDepositData>,
    pub encrypted_exit_messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidatorsSignatureData {
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureOutcome {
    Signed(String),
    NotRegistered,
    InvalidPermissions,
    VaultNotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_without_data() {
        let response: NodeSetResponse<ValidatorsInfo> = serde_json::from_str(
            r#"{"ok":false,"message":"vault not found","error":"vault_not_found"}"#,
        )
        .unwrap();
        assert!(!response.ok);
        assert!(response.data.is_none());
        assert_eq!(response.error, "vault_not_found");
    }

    #[test]
    fn test_registered_validators_payload() {
        let response: NodeSetResponse<ValidatorsData> = serde_json::from_str(
            r#"{"ok":true,"data":{"validators":[{"pubkey":"0xa1d1ad0714035353258038e964ae9675dc0252ee22cea896825c01458e1807bfad2f9969338798548d9858a571f7425c","status":"REGISTERED","exitMessage":false}]}}"#,
        )
        .unwrap();
        let validators = response.data.unwrap().validators;
        assert_eq!(validators.len(), 1);
        assert!(!validators[0].exit_message_uploaded);
        assert_eq!(validators[0].status, "REGISTERED");
    }
}
