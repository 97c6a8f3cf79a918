//! Vault client: submit, list and retrieve confidential trips
//!
//! Each operation runs its steps strictly in order. A submit never reaches
//! the ledger before every numeric field has been encrypted, so a failed or
//! cancelled submit leaves no partial record.

mod state;
mod types;

use std::sync::Arc;

use alloy::primitives::Address;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use tripseal_storage::CapabilityStore;

use crate::capability::{CapabilitySigner, load_or_sign};
use crate::config::VaultSettings;
use crate::engine::{FheEngine, HandleRef};
use crate::error::{VaultError, VaultResult};
use crate::ledger::{LedgerWriteParams, TripLedger};
use crate::pipeline::EncryptionPipeline;
use crate::seal::PayloadSealer;

pub use state::{
    IllegalTransition, OperationKind, OperationPhase, OperationTracker, ProgressObserver,
};
pub use types::{
    DecryptedTrip, RoutePayload, SchedulePayload, SubmitReceipt, TravelStyle, TripDraft,
    TripSummary,
};

const MISSING_COLLABORATOR: &str = "Missing FHE instance or signer";

pub struct VaultClient {
    ledger: Arc<dyn TripLedger>,
    store: Arc<dyn CapabilityStore>,
    sealer: Arc<dyn PayloadSealer>,
    engine: Option<Arc<dyn FheEngine>>,
    signer: Option<Arc<dyn CapabilitySigner>>,
    settings: VaultSettings,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl VaultClient {
    pub fn new(
        ledger: Arc<dyn TripLedger>,
        store: Arc<dyn CapabilityStore>,
        sealer: Arc<dyn PayloadSealer>,
    ) -> Self {
        Self {
            ledger,
            store,
            sealer,
            engine: None,
            signer: None,
            settings: VaultSettings::default(),
            observer: None,
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn FheEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn CapabilitySigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_settings(mut self, settings: VaultSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    pub fn contract(&self) -> Address {
        self.ledger.contract_address()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    fn tracker(&self, kind: OperationKind) -> OperationTracker {
        OperationTracker::new(kind, self.observer.clone())
    }

    fn pipeline(&self) -> EncryptionPipeline {
        EncryptionPipeline::new(self.engine.clone())
            .with_retry(self.settings.retry.clone())
            .with_codec(self.settings.codec_mode())
    }

    fn collaborators(&self) -> VaultResult<(Arc<dyn FheEngine>, Arc<dyn CapabilitySigner>)> {
        match (&self.engine, &self.signer) {
            (Some(engine), Some(signer)) => Ok((engine.clone(), signer.clone())),
            _ => Err(VaultError::EngineUnavailable(MISSING_COLLABORATOR.into())),
        }
    }

    fn finish<T>(&self, tracker: &mut OperationTracker, result: VaultResult<T>) -> VaultResult<T> {
        match result {
            Ok(value) => {
                tracker.advance(OperationPhase::Done)?;
                Ok(value)
            }
            Err(e) => {
                warn!(kind = ?tracker.kind(), error_kind = %e.kind(), error = %e, "vault operation failed");
                tracker.fail();
                Err(e)
            }
        }
    }

    /// Seal, encrypt and write a trip
    pub async fn submit(&self, draft: &TripDraft) -> VaultResult<SubmitReceipt> {
        let mut tracker = self.tracker(OperationKind::Submit);
        let result = self.submit_inner(draft, &mut tracker).await;
        self.finish(&mut tracker, result)
    }

    async fn submit_inner(
        &self,
        draft: &TripDraft,
        tracker: &mut OperationTracker,
    ) -> VaultResult<SubmitReceipt> {
        let (params, owner) = self.prepare_inner(draft, tracker).await?;

        tracker.advance(OperationPhase::Submitting)?;
        let receipt = self.ledger.store_trip(owner, &params).await?;

        info!(
            %owner,
            record_id = ?receipt.record_id,
            tx = ?receipt.tx_hash,
            "trip submitted"
        );
        Ok(SubmitReceipt {
            record_id: receipt.record_id,
            tx_hash: receipt.tx_hash,
            nights: draft.nights(),
        })
    }

    /// Build the exact `storeTrip` arguments without writing them
    pub async fn prepare_submission(&self, draft: &TripDraft) -> VaultResult<LedgerWriteParams> {
        let mut tracker = self.tracker(OperationKind::Prepare);
        let result = self
            .prepare_inner(draft, &mut tracker)
            .await
            .map(|(params, _)| params);
        self.finish(&mut tracker, result)
    }

    async fn prepare_inner(
        &self,
        draft: &TripDraft,
        tracker: &mut OperationTracker,
    ) -> VaultResult<(LedgerWriteParams, Address)> {
        tracker.advance(OperationPhase::Preparing)?;
        draft.validate()?;
        let (_, signer) = self.collaborators()?;
        let owner = signer.address();

        let route = serde_json::to_vec(&draft.route_payload())
            .map_err(|e| VaultError::Payload(e.to_string()))?;
        let schedule = serde_json::to_vec(&draft.schedule_payload(Utc::now()))
            .map_err(|e| VaultError::Payload(e.to_string()))?;
        let route_ciphertext = self.sealer.seal(owner, &route)?;
        let schedule_ciphertext = self.sealer.seal(owner, &schedule)?;

        let pipeline = self.pipeline();
        let contract = self.contract();
        let nights = pipeline
            .encrypt_u32(contract, Some(owner), draft.nights(), |_| {
                tracker.note_remote_attempt()
            })
            .await?;
        let unit = pipeline
            .encrypt_u32(contract, Some(owner), 1, |_| tracker.note_remote_attempt())
            .await?;

        let params = LedgerWriteParams {
            route_ciphertext,
            schedule_ciphertext,
            title: draft.title.trim().to_string(),
            style: draft.style,
            nights,
            unit,
        };
        Ok((params, owner))
    }

    /// Caller's trips, newest first
    pub async fn list_trips(&self) -> VaultResult<Vec<TripSummary>> {
        let owner = self
            .signer_address()
            .ok_or_else(|| VaultError::EngineUnavailable(MISSING_COLLABORATOR.into()))?;

        let mut trips: Vec<TripSummary> = self
            .ledger
            .list_my_trips(owner)
            .await?
            .into_iter()
            .enumerate()
            .map(|(i, t)| TripSummary {
                id: i as u64,
                title: t.title,
                style: t.style,
                created_at: t.created_at,
            })
            .collect();
        trips.reverse();
        Ok(trips)
    }

    /// Fetch, authorize and decrypt one trip
    pub async fn retrieve(&self, record_id: u64) -> VaultResult<DecryptedTrip> {
        let mut tracker = self.tracker(OperationKind::Retrieve);
        let result = self.retrieve_inner(record_id, &mut tracker).await;
        self.finish(&mut tracker, result)
    }

    async fn retrieve_inner(
        &self,
        record_id: u64,
        tracker: &mut OperationTracker,
    ) -> VaultResult<DecryptedTrip> {
        tracker.advance(OperationPhase::Preparing)?;
        let (engine, signer) = self.collaborators()?;
        let contract = self.contract();
        let owner = signer.address();

        // Unknown ids fail here, before the wallet is asked for anything
        tracker.note_remote_attempt();
        let record = self.ledger.get_my_trip(owner, record_id).await?;

        tracker.note_remote_attempt();
        let capability = load_or_sign(
            engine.as_ref(),
            &[contract],
            signer.as_ref(),
            self.store.as_ref(),
            &self.settings.capability,
        )
        .await?
        .ok_or(VaultError::AuthorizationDenied)?;

        tracker.advance(OperationPhase::Decrypting)?;
        let route: RoutePayload =
            self.open_payload(owner, &record.route_ciphertext)?;
        let schedule: SchedulePayload =
            self.open_payload(owner, &record.schedule_ciphertext)?;

        let handles = [
            HandleRef {
                handle: record.nights_handle,
                contract,
            },
            HandleRef {
                handle: record.unit_handle,
                contract,
            },
        ];
        let (nights, unit) = match engine.user_decrypt(&handles, &capability).await {
            Ok(values) if values.len() == 2 => (Some(values[0]), Some(values[1])),
            Ok(values) => {
                warn!(got = values.len(), "engine returned unexpected value count");
                (None, None)
            }
            Err(e) => {
                warn!(error = %e, record_id, "numeric fields not decrypted");
                (None, None)
            }
        };

        Ok(DecryptedTrip {
            id: record_id,
            title: record.title,
            style: record.style,
            created_at: record.created_at,
            route,
            schedule,
            nights,
            unit,
        })
    }

    fn open_payload<T: DeserializeOwned>(&self, owner: Address, sealed: &[u8]) -> VaultResult<T> {
        let plaintext = self.sealer.unseal(owner, sealed)?;
        serde_json::from_slice(&plaintext).map_err(|e| VaultError::Payload(e.to_string()))
    }
}
