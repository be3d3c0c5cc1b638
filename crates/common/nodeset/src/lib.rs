pub mod client;
pub mod error;
pub mod exit;
pub mod mock;
pub mod types;

use async_trait::async_trait;
pub use client::{NodeSetClient, NodeSetConfig};
use depot_validator::deposit::ExtendedDepositData;
pub use error::NodeSetError;
use types::{
    DepositDataSet, EncryptedExitData, RegisteredValidator, RegistrationStatus, SignatureOutcome,
    ValidatorsInfo, ValidatorsSignatureRequest,
};

/// The external service that owns registration quotas, co-signs validator batches and
/// keeps the aggregated deposit-data set for the vault.
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn login(&self) -> Result<(), NodeSetError>;

    /// Logs in when the status is not known yet. A missing wallet or an unregistered node
    /// is reported through the status rather than as an error.
    async fn registration_status(&self) -> Result<RegistrationStatus, NodeSetError>;

    async fn deposit_data_version(&self) -> Result<u64, NodeSetError>;

    async fn deposit_data_set(&self) -> Result<DepositDataSet, NodeSetError>;

    async fn validators_info(&self) -> Result<ValidatorsInfo, NodeSetError>;

    async fn validators_manager_signature(
        &self,
        request: ValidatorsSignatureRequest,
    ) -> Result<SignatureOutcome, NodeSetError>;

    async fn registered_validators(&self) -> Result<Vec<RegisteredValidator>, NodeSetError>;

    async fn upload_signed_exits(&self, exits: Vec<EncryptedExitData>)
    -> Result<(), NodeSetError>;

    async fn upload_deposit_data(
        &self,
        deposit_data: Vec<ExtendedDepositData>,
    ) -> Result<(), NodeSetError>;
}
