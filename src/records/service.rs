//! Health-record operations against the on-chain module.
//!
//! Reads go straight to the chain. Writes require a connected session,
//! go through the transaction submitter, and only report success once the
//! transaction committed. Access toggles run one at a time so each one
//! settles the mirror against the value the previous one left behind.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::types::{AccountAddress, ChainError, SubmitError, TransactionPayload, TransactionResult};
use crate::blockchain::{ChainReader, TransactionSubmitter};
use crate::records::access::{AccessBook, AccessEntry};
use crate::records::types::{RecordLink, RecordReceipt, VaultError, VaultResult};
use crate::session::SessionState;
use crate::storage::{ContentId, ContentStore};

/// Name of the Move module holding records and grants.
pub const MODULE_NAME: &str = "health_record";

pub struct HealthVault {
    session: Arc<SessionState>,
    submitter: Arc<TransactionSubmitter>,
    reader: Arc<dyn ChainReader>,
    store: Arc<dyn ContentStore>,
    module_address: AccountAddress,
    access: AccessBook,
    toggles: Mutex<()>,
}

impl HealthVault {
    pub fn new(
        session: Arc<SessionState>,
        submitter: Arc<TransactionSubmitter>,
        reader: Arc<dyn ChainReader>,
        store: Arc<dyn ContentStore>,
        module_address: AccountAddress,
    ) -> Self {
        Self {
            session,
            submitter,
            reader,
            store,
            module_address,
            access: AccessBook::new(),
            toggles: Mutex::new(()),
        }
    }

    /// `<module address>::health_record::<member>`
    fn member(&self, name: &str) -> String {
        format!("{}::{}::{}", self.module_address, MODULE_NAME, name)
    }

    fn patient(&self) -> VaultResult<AccountAddress> {
        self.session.current().address.ok_or(VaultError::NotConnected)
    }

    fn payload(&self, entry: &str, arguments: Vec<Value>) -> VaultResult<TransactionPayload> {
        Ok(TransactionPayload::entry_function(self.member(entry), vec![], arguments)?)
    }

    /// Store the blob, then register its content id on chain.
    pub async fn upload_record(&self, bytes: Vec<u8>, name: &str) -> VaultResult<RecordReceipt> {
        let patient = self.patient()?;

        let cid = self.store.put(bytes, name).await?;
        let payload = self.payload("add_record", vec![json!(patient.to_hex()), json!(cid.as_str())])?;
        let transaction = self
            .submitter
            .submit_and_confirm(&payload)
            .await
            .map_err(|e| {
                tracing::warn!(cid = %cid, error = %e, "Content stored but not registered on chain");
                e
            })?;

        tracing::info!(patient = %patient, cid = %cid, hash = %transaction.hash, "Record added");
        Ok(RecordReceipt {
            gateway_url: self.store.gateway_url(&cid),
            cid,
            transaction,
        })
    }

    /// Records published under `patient`. An account that never stored one
    /// has no resource, which reads as an empty list.
    pub async fn list_records(&self, patient: &AccountAddress) -> VaultResult<Vec<RecordLink>> {
        let data = match self.reader.fetch_resource(patient, &self.member("HealthRecord")).await {
            Ok(data) => data,
            Err(ChainError::ResourceNotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let cids = data
            .get("cid")
            .and_then(Value::as_array)
            .ok_or_else(|| VaultError::Malformed("HealthRecord has no cid list".into()))?;

        cids.iter()
            .map(|value| {
                let raw = value
                    .as_str()
                    .ok_or_else(|| VaultError::Malformed(format!("cid entry is not a string: {}", value)))?;
                let cid: ContentId = raw
                    .parse()
                    .map_err(|_| VaultError::Malformed(format!("invalid cid '{}'", raw)))?;
                Ok(RecordLink {
                    gateway_url: self.store.gateway_url(&cid),
                    cid,
                })
            })
            .collect()
    }

    /// Download a record's bytes through the gateway.
    pub async fn fetch_record(&self, cid: &ContentId) -> VaultResult<Vec<u8>> {
        Ok(self.store.fetch(cid).await?)
    }

    pub async fn grant_access(&self, doctor: &AccountAddress) -> VaultResult<TransactionResult> {
        self.toggle_access(doctor, true).await
    }

    pub async fn revoke_access(&self, doctor: &AccountAddress) -> VaultResult<TransactionResult> {
        self.toggle_access(doctor, false).await
    }

    async fn toggle_access(&self, doctor: &AccountAddress, granted: bool) -> VaultResult<TransactionResult> {
        let patient = self.patient()?;
        let entry = if granted { "grant_access" } else { "revoke_access" };

        let payload = self.payload(entry, vec![json!(doctor.to_hex())])?;

        // held until the mirror is settled
        let _toggling = self.toggles.lock().await;
        let toggle = self.access.begin(patient, *doctor, granted);
        match self.submitter.submit_and_confirm(&payload).await {
            Ok(result) => {
                self.access.confirm(toggle);
                tracing::info!(patient = %patient, doctor = %doctor, granted, "Access updated");
                Ok(result)
            }
            Err(e @ SubmitError::Timeout { .. }) => {
                self.access.mark_unverified(toggle);
                Err(e.into())
            }
            Err(e) => {
                self.access.rollback(toggle);
                Err(e.into())
            }
        }
    }

    /// Ask the chain whether `doctor` may read `patient`'s records and
    /// store the answer in the mirror.
    pub async fn refresh_access(&self, patient: &AccountAddress, doctor: &AccountAddress) -> VaultResult<bool> {
        let values = self
            .reader
            .fetch_view(&self.member("has_access"), vec![json!(patient.to_hex()), json!(doctor.to_hex())])
            .await?;

        let granted = values
            .first()
            .and_then(Value::as_bool)
            .ok_or_else(|| VaultError::Malformed(format!("has_access returned {:?}", values)))?;

        self.access.record_observed(*patient, *doctor, granted);
        Ok(granted)
    }

    /// Last known grant state, if any operation touched the pair.
    pub fn access_entry(&self, patient: &AccountAddress, doctor: &AccountAddress) -> Option<AccessEntry> {
        self.access.get(patient, doctor)
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn reader(&self) -> &Arc<dyn ChainReader> {
        &self.reader
    }

    pub fn module_address(&self) -> AccountAddress {
        self.module_address
    }
}
