//! JSON-RPC ledger backed by an alloy provider

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{
    ITripPlanner, LedgerReceipt, LedgerTrip, LedgerWriteParams, StoredRecord, TripLedger,
};

/// Ledger talking to a deployed trip planner contract
pub struct EvmLedger {
    rpc_url: Url,
    contract: Address,
    signer: PrivateKeySigner,
}

impl EvmLedger {
    /// Fails with `LedgerError::Config` when `rpc_url` is not an http(s) URL
    pub fn new(rpc_url: &str, contract: Address, signer: PrivateKeySigner) -> LedgerResult<Self> {
        let rpc_url: Url = rpc_url
            .trim()
            .parse()
            .map_err(|e| LedgerError::Config(format!("Invalid RPC URL: {e}")))?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(LedgerError::Config(format!(
                "Unsupported RPC scheme: {}",
                rpc_url.scheme()
            )));
        }
        Ok(Self {
            rpc_url,
            contract,
            signer,
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// Address the ledger sends transactions from
    pub fn sender(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl TripLedger for EvmLedger {
    fn contract_address(&self) -> Address {
        self.contract
    }

    async fn store_trip(
        &self,
        from: Address,
        params: &LedgerWriteParams,
    ) -> LedgerResult<LedgerReceipt> {
        if from != self.signer.address() {
            return Err(LedgerError::Config(format!(
                "ledger wallet {} cannot send as {from}",
                self.signer.address()
            )));
        }

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .on_http(self.rpc_url.clone());
        let contract = ITripPlanner::new(self.contract, &provider);

        let call = params.to_call();
        let pending = contract
            .storeTrip(
                call.routeCiphertext,
                call.scheduleCiphertext,
                call.title,
                call.style,
                call.nightsHandle,
                call.nightsProof,
                call.unitHandle,
                call.unitProof,
            )
            .send()
            .await
            .map_err(|e| LedgerError::Transaction(format!("Failed to send transaction: {e}")))?;

        info!(tx = ?pending.tx_hash(), "storeTrip sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Transaction(format!("Failed to get receipt: {e}")))?;

        if !receipt.status() {
            return Err(LedgerError::Transaction(format!(
                "storeTrip reverted in tx {}",
                receipt.transaction_hash
            )));
        }

        info!(
            tx = %receipt.transaction_hash,
            block = receipt.block_number.unwrap_or(0),
            "trip stored on-chain"
        );

        Ok(LedgerReceipt {
            record_id: None,
            tx_hash: Some(receipt.transaction_hash),
        })
    }

    async fn list_my_trips(&self, owner: Address) -> LedgerResult<Vec<LedgerTrip>> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = ITripPlanner::new(self.contract, &provider);

        let result = contract
            .listMyTrips()
            .from(owner)
            .call()
            .await
            .map_err(|e| LedgerError::Call(e.to_string()))?;

        Ok(result._0.into_iter().map(LedgerTrip::from).collect())
    }

    async fn get_my_trip(&self, owner: Address, id: u64) -> LedgerResult<StoredRecord> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let contract = ITripPlanner::new(self.contract, &provider);

        let result = contract
            .getMyTrip(U256::from(id))
            .from(owner)
            .call()
            .await
            .map_err(|e| LedgerError::Call(e.to_string()))?;

        Ok(result._0.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EncryptedInput;

    const CONTRACT: Address = Address::repeat_byte(0xc0);

    #[test]
    fn test_rejects_bad_urls() {
        for url in ["not a url", "", "ws://localhost:8545", "file:///tmp/node"] {
            let err = EvmLedger::new(url, CONTRACT, PrivateKeySigner::random())
                .err()
                .unwrap();
            assert!(matches!(err, LedgerError::Config(_)), "{url}: {err}");
        }
    }

    #[test]
    fn test_accepts_http_endpoint() {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        let ledger = EvmLedger::new(" http://127.0.0.1:8545 ", CONTRACT, signer).unwrap();

        assert_eq!(ledger.rpc_url().as_str(), "http://127.0.0.1:8545/");
        assert_eq!(ledger.contract_address(), CONTRACT);
        assert_eq!(ledger.sender(), address);
    }

    #[tokio::test]
    async fn test_foreign_sender_refused_before_any_request() {
        // Port 9 (discard): reaching the network would fail differently
        let ledger =
            EvmLedger::new("http://127.0.0.1:9", CONTRACT, PrivateKeySigner::random()).unwrap();
        let params = LedgerWriteParams {
            route_ciphertext: vec![1],
            schedule_ciphertext: vec![2],
            title: "Oslo".into(),
            style: 0,
            nights: EncryptedInput {
                handle: [0x11; 32],
                proof: vec![1, 0],
            },
            unit: EncryptedInput {
                handle: [0x22; 32],
                proof: vec![1, 0],
            },
        };

        let err = ledger
            .store_trip(Address::repeat_byte(0x99), &params)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
