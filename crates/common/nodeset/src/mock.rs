use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use depot_validator::deposit::ExtendedDepositData;

use crate::{
    AuthorizationService,
    error::NodeSetError,
    types::{
        DepositDataSet, EncryptedExitData, RegisteredValidator, RegistrationStatus,
        SignatureOutcome, ValidatorsInfo, ValidatorsSignatureRequest,
    },
};

#[derive(Debug)]
struct MockState {
    registration_status: RegistrationStatus,
    unreachable: bool,
    stalled: bool,
    info: ValidatorsInfo,
    signature_outcome: SignatureOutcome,
    deposit_data: DepositDataSet,
    registered: Vec<RegisteredValidator>,
    logins: usize,
    signature_requests: Vec<ValidatorsSignatureRequest>,
    uploaded_exits: Vec<EncryptedExitData>,
    uploaded_deposit_data: Vec<Vec<ExtendedDepositData>>,
}

/// In-memory authorization service with a registered node and a generous quota.
#[derive(Debug)]
pub struct MockAuthorizationService {
    state: Mutex<MockState>,
}

impl Default for MockAuthorizationService {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                registration_status: RegistrationStatus::Registered,
                unreachable: false,
                stalled: false,
                info: ValidatorsInfo {
                    active: 0,
                    max: 100,
                    available: 100,
                },
                signature_outcome: SignatureOutcome::Signed("0xc0ffee".to_string()),
                deposit_data: DepositDataSet::default(),
                registered: vec![],
                logins: 0,
                signature_requests: vec![],
                uploaded_exits: vec![],
                uploaded_deposit_data: vec![],
            }),
        }
    }
}

impl MockAuthorizationService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MockState>, NodeSetError> {
        self.state
            .lock()
            .map_err(|err| NodeSetError::InvalidResponse(err.to_string()))
    }

    fn reachable_state(&self) -> Result<MutexGuard<'_, MockState>, NodeSetError> {
        let state = self.state()?;
        if state.unreachable {
            return Err(NodeSetError::InvalidResponse(
                "NodeSet server unreachable".to_string(),
            ));
        }
        match state.registration_status {
            RegistrationStatus::Registered => Ok(state),
            _ => Err(NodeSetError::NotRegistered),
        }
    }

    /// Never returns while the service is stalled.
    async fn wait_while_stalled(&self) {
        let stalled = self.state().is_ok_and(|state| state.stalled);
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    fn update(&self, update: impl FnOnce(&mut MockState)) {
        if let Ok(mut state) = self.state.lock() {
            update(&mut state);
        }
    }

    pub fn set_registration_status(&self, status: RegistrationStatus) {
        self.update(|state| state.registration_status = status);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.update(|state| state.unreachable = unreachable);
    }

    /// Makes every call hang, like a server that accepts connections but never answers.
    pub fn set_stalled(&self, stalled: bool) {
        self.update(|state| state.stalled = stalled);
    }

    pub fn set_available(&self, available: u64) {
        self.update(|state| state.info.available = available);
    }

    pub fn set_signature_outcome(&self, outcome: SignatureOutcome) {
        self.update(|state| state.signature_outcome = outcome);
    }

    pub fn set_deposit_data(&self, version: u64, deposit_data: Vec<ExtendedDepositData>) {
        self.update(|state| {
            state.deposit_data = DepositDataSet {
                version,
                deposit_data,
            }
        });
    }

    pub fn set_registered_validators(&self, registered: Vec<RegisteredValidator>) {
        self.update(|state| state.registered = registered);
    }

    pub fn logins(&self) -> usize {
        self.state().map(|state| state.logins).unwrap_or_default()
    }

    pub fn signature_requests(&self) -> Vec<ValidatorsSignatureRequest> {
        self.state()
            .map(|state| state.signature_requests.clone())
            .unwrap_or_default()
    }

    pub fn uploaded_exits(&self) -> Vec<EncryptedExitData> {
        self.state()
            .map(|state| state.uploaded_exits.clone())
            .unwrap_or_default()
    }

    pub fn uploaded_deposit_data(&self) -> Vec<Vec<ExtendedDepositData>> {
        self.state()
            .map(|state| state.uploaded_deposit_data.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthorizationService for MockAuthorizationService {
    async fn login(&self) -> Result<(), NodeSetError> {
        self.wait_while_stalled().await;
        let mut state = self.state()?;
        state.logins += 1;
        if state.unreachable {
            return Err(NodeSetError::InvalidResponse(
                "NodeSet server unreachable".to_string(),
            ));
        }
        match state.registration_status {
            RegistrationStatus::Registered => Ok(()),
            _ => Err(NodeSetError::NotRegistered),
        }
    }

    async fn registration_status(&self) -> Result<RegistrationStatus, NodeSetError> {
        self.wait_while_stalled().await;
        let mut state = self.state()?;
        state.logins += 1;
        if state.unreachable {
            return Err(NodeSetError::InvalidResponse(
                "NodeSet server unreachable".to_string(),
            ));
        }
        Ok(state.registration_status)
    }

    async fn deposit_data_version(&self) -> Result<u64, NodeSetError> {
        self.wait_while_stalled().await;
        Ok(self.reachable_state()?.deposit_data.version)
    }

    async fn deposit_data_set(&self) -> Result<DepositDataSet, NodeSetError> {
        Ok(self.reachable_state()?.deposit_data.clone())
    }

    async fn validators_info(&self) -> Result<ValidatorsInfo, NodeSetError> {
        Ok(self.reachable_state()?.info)
    }

    async fn validators_manager_signature(
        &self,
        request: ValidatorsSignatureRequest,
    ) -> Result<SignatureOutcome, NodeSetError> {
        let mut state = match self.reachable_state() {
            Ok(state) => state,
            Err(NodeSetError::NotRegistered) => return Ok(SignatureOutcome::NotRegistered),
            Err(err) => return Err(err),
        };
        state.signature_requests.push(request);
        Ok(state.signature_outcome.clone())
    }

    async fn registered_validators(&self) -> Result<Vec<RegisteredValidator>, NodeSetError> {
        self.wait_while_stalled().await;
        Ok(self.reachable_state()?.registered.clone())
    }

    async fn upload_signed_exits(
        &self,
        exits: Vec<EncryptedExitData>,
    ) -> Result<(), NodeSetError> {
        let mut state = self.reachable_state()?;
        for exit in &exits {
            if let Some(registered) = state
                .registered
                .iter_mut()
                .find(|registered| registered.pubkey == exit.pubkey)
            {
                registered.exit_message_uploaded = true;
            }
        }
        state.uploaded_exits.extend(exits);
        Ok(())
    }

    async fn upload_deposit_data(
        &self,
        deposit_data: Vec<ExtendedDepositData>,
    ) -> Result<(), NodeSetError> {
        self.reachable_state()?
            .uploaded_deposit_data
            .push(deposit_data);
        Ok(())
    }
}
