//! Ledger collaborator: the confidential-storage contract
//!
//! The contract keys records by `msg.sender`; ids are per-owner insertion
//! indices. Only the call shapes matter here, not the contract's logic.

pub mod abi;
pub mod memory;
#[cfg(feature = "rpc")]
pub mod rpc;

use alloy::primitives::{Address, B256, Bytes, FixedBytes};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tripseal_proto::Handle;

use crate::error::LedgerResult;
use crate::pipeline::EncryptedInput;

pub use abi::ITripPlanner;
pub use memory::InMemoryLedger;
#[cfg(feature = "rpc")]
pub use rpc::EvmLedger;

/// Positional arguments of `storeTrip`, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerWriteParams {
    pub route_ciphertext: Vec<u8>,
    pub schedule_ciphertext: Vec<u8>,
    pub title: String,
    pub style: u8,
    pub nights: EncryptedInput,
    pub unit: EncryptedInput,
}

impl LedgerWriteParams {
    pub fn to_call(&self) -> ITripPlanner::storeTripCall {
        ITripPlanner::storeTripCall {
            routeCiphertext: Bytes::copy_from_slice(&self.route_ciphertext),
            scheduleCiphertext: Bytes::copy_from_slice(&self.schedule_ciphertext),
            title: self.title.clone(),
            style: self.style,
            nightsHandle: FixedBytes(self.nights.handle),
            nightsProof: Bytes::copy_from_slice(&self.nights.proof),
            unitHandle: FixedBytes(self.unit.handle),
            unitProof: Bytes::copy_from_slice(&self.unit.proof),
        }
    }

    /// ABI-encoded `storeTrip` calldata (selector included)
    pub fn calldata(&self) -> Vec<u8> {
        self.to_call().abi_encode()
    }
}

/// Full record as returned by `getMyTrip`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub route_ciphertext: Vec<u8>,
    pub schedule_ciphertext: Vec<u8>,
    pub title: String,
    pub style: u8,
    pub created_at: u64,
    pub nights_handle: Handle,
    pub unit_handle: Handle,
}

impl From<ITripPlanner::TripRecord> for StoredRecord {
    fn from(r: ITripPlanner::TripRecord) -> Self {
        Self {
            route_ciphertext: r.routeCiphertext.to_vec(),
            schedule_ciphertext: r.scheduleCiphertext.to_vec(),
            title: r.title,
            style: r.style,
            created_at: r.createdAt,
            nights_handle: r.nights.0,
            unit_handle: r.unit.0,
        }
    }
}

/// Plaintext listing entry as returned by `listMyTrips`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTrip {
    pub title: String,
    pub style: u8,
    pub created_at: u64,
}

impl From<ITripPlanner::TripSummary> for LedgerTrip {
    fn from(s: ITripPlanner::TripSummary) -> Self {
        Self {
            title: s.title,
            style: s.style,
            created_at: s.createdAt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    /// Known for ledgers that return the new index
    pub record_id: Option<u64>,
    pub tx_hash: Option<B256>,
}

#[async_trait]
pub trait TripLedger: Send + Sync {
    fn contract_address(&self) -> Address;

    /// Issue `storeTrip` as `from`
    async fn store_trip(&self, from: Address, params: &LedgerWriteParams)
    -> LedgerResult<LedgerReceipt>;

    async fn list_my_trips(&self, owner: Address) -> LedgerResult<Vec<LedgerTrip>>;

    async fn get_my_trip(&self, owner: Address, id: u64) -> LedgerResult<StoredRecord>;
}
