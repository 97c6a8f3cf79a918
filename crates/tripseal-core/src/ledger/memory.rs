//! In-memory ledger (for testing and the CLI demo)

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use alloy::primitives::{Address, PrimitiveSignature};
use async_trait::async_trait;
use tripseal_proto::decode_strict;

use crate::engine::input_proof_digest;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{LedgerReceipt, LedgerTrip, LedgerWriteParams, StoredRecord, TripLedger};
use crate::pipeline::EncryptedInput;

/// Behaves like the contract: records per sender, strict proof checks
///
/// When a coprocessor address is set, every input proof must carry a
/// signature from it over the handles and `(contract, sender)`.
pub struct InMemoryLedger {
    contract: Address,
    coprocessor: Option<Address>,
    records: RwLock<HashMap<Address, Vec<StoredRecord>>>,
    fail_next: Mutex<Option<String>>,
}

impl InMemoryLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            coprocessor: None,
            records: RwLock::new(HashMap::new()),
            fail_next: Mutex::new(None),
        }
    }

    pub fn with_coprocessor(mut self, coprocessor: Address) -> Self {
        self.coprocessor = Some(coprocessor);
        self
    }

    /// Make the next write revert with `message`
    pub fn fail_next_write(&self, message: impl Into<String>) {
        *self.fail_next.lock().unwrap() = Some(message.into());
    }

    /// Total records across all owners
    pub fn record_count(&self) -> usize {
        self.records.read().unwrap().values().map(Vec::len).sum()
    }

    fn verify_input(&self, from: Address, input: &EncryptedInput) -> LedgerResult<()> {
        let validated =
            decode_strict(&input.proof).map_err(|e| LedgerError::InvalidProof(e.to_string()))?;
        let frame = validated.frame;

        if !frame.contains_handle(&input.handle) {
            return Err(LedgerError::InvalidProof("handle not in proof".into()));
        }

        if let Some(coprocessor) = self.coprocessor {
            let digest = input_proof_digest(frame.handles(), self.contract, from);
            let signed = frame.signatures().iter().any(|sig| {
                PrimitiveSignature::try_from(&sig[..])
                    .ok()
                    .and_then(|s| s.recover_address_from_prehash(&digest).ok())
                    == Some(coprocessor)
            });
            if !signed {
                return Err(LedgerError::InvalidProof(
                    "no valid coprocessor signature".into(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TripLedger for InMemoryLedger {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn store_trip(
        &self,
        from: Address,
        params: &LedgerWriteParams,
    ) -> LedgerResult<LedgerReceipt> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(LedgerError::Transaction(message));
        }

        self.verify_input(from, &params.nights)?;
        self.verify_input(from, &params.unit)?;

        let record = StoredRecord {
            route_ciphertext: params.route_ciphertext.clone(),
            schedule_ciphertext: params.schedule_ciphertext.clone(),
            title: params.title.clone(),
            style: params.style,
            created_at: chrono::Utc::now().timestamp().max(0) as u64,
            nights_handle: params.nights.handle,
            unit_handle: params.unit.handle,
        };

        let mut records = self.records.write().unwrap();
        let owned = records.entry(from).or_default();
        owned.push(record);
        let id = (owned.len() - 1) as u64;

        tracing::debug!(%from, id, "trip stored in memory ledger");
        Ok(LedgerReceipt {
            record_id: Some(id),
            tx_hash: None,
        })
    }

    async fn list_my_trips(&self, owner: Address) -> LedgerResult<Vec<LedgerTrip>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .get(&owner)
            .map(|owned| {
                owned
                    .iter()
                    .map(|r| LedgerTrip {
                        title: r.title.clone(),
                        style: r.style,
                        created_at: r.created_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_my_trip(&self, owner: Address, id: u64) -> LedgerResult<StoredRecord> {
        self.records
            .read()
            .unwrap()
            .get(&owner)
            .and_then(|owned| owned.get(id as usize))
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripseal_proto::ProofFrame;

    const CONTRACT: Address = Address::repeat_byte(0xc0);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    fn input(handle: u8) -> EncryptedInput {
        EncryptedInput {
            handle: [handle; 32],
            proof: ProofFrame::new(vec![[handle; 32]], vec![[0u8; 65]])
                .unwrap()
                .encode(),
        }
    }

    fn params(title: &str) -> LedgerWriteParams {
        LedgerWriteParams {
            route_ciphertext: vec![1],
            schedule_ciphertext: vec![2],
            title: title.into(),
            style: 0,
            nights: input(1),
            unit: input(2),
        }
    }

    #[tokio::test]
    async fn test_records_are_per_owner() {
        let ledger = InMemoryLedger::new(CONTRACT);
        let r0 = ledger.store_trip(ALICE, &params("a")).await.unwrap();
        let r1 = ledger.store_trip(ALICE, &params("b")).await.unwrap();
        let rb = ledger.store_trip(BOB, &params("c")).await.unwrap();

        assert_eq!(r0.record_id, Some(0));
        assert_eq!(r1.record_id, Some(1));
        assert_eq!(rb.record_id, Some(0));

        let alice = ledger.list_my_trips(ALICE).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(ledger.get_my_trip(BOB, 0).await.unwrap().title, "c");
        assert!(matches!(
            ledger.get_my_trip(BOB, 1).await,
            Err(LedgerError::NotFound(1))
        ));
    }

    #[tokio::test]
    async fn test_legacy_proof_rejected() {
        let ledger = InMemoryLedger::new(CONTRACT);
        let mut p = params("a");
        p.nights.proof.push(0);

        let err = ledger.store_trip(ALICE, &p).await.unwrap_err();
        assert!(err.is_proof_rejection());
        assert_eq!(ledger.record_count(), 0);
    }

    #[tokio::test]
    async fn test_unsigned_proof_rejected_with_coprocessor() {
        let ledger = InMemoryLedger::new(CONTRACT).with_coprocessor(Address::repeat_byte(0xcc));
        let err = ledger.store_trip(ALICE, &params("a")).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidProof(_)));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let ledger = InMemoryLedger::new(CONTRACT);
        ledger.fail_next_write("execution reverted");

        assert!(matches!(
            ledger.store_trip(ALICE, &params("a")).await,
            Err(LedgerError::Transaction(_))
        ));
        assert!(ledger.store_trip(ALICE, &params("a")).await.is_ok());
    }
}
