//! Property-based tests for capability validity and cache keys
//!
//! Capabilities are built unsigned: validity is a pure function of the
//! start timestamp and duration, and the cache key ignores the keypair.

use alloy::primitives::{Address, Bytes};
use proptest::prelude::*;
use tripseal_core::DecryptionCapability;
use tripseal_core::capability::{SECONDS_PER_DAY, capability_key, decryption_domain};

const DAY: u64 = SECONDS_PER_DAY;

fn capability(start: u64, days: u64) -> DecryptionCapability {
    DecryptionCapability {
        user_address: Address::repeat_byte(0x5e),
        contract_addresses: vec![Address::repeat_byte(0xc0)],
        public_key: Bytes::new(),
        private_key: Bytes::new(),
        signature: Bytes::new(),
        start_timestamp: start,
        duration_days: days,
    }
}

proptest! {
    /// Property: valid exactly on [start, start + days * 86400)
    #[test]
    fn prop_valid_inside_window(
        start in 0u64..4_000_000_000,
        days in 1u64..1000,
        offset in any::<u64>(),
    ) {
        let cap = capability(start, days);
        let now = start + offset % (days * DAY);

        prop_assert!(cap.is_valid_at(now));
        prop_assert_eq!(cap.expires_at(), start + days * DAY);
    }

    /// Property: the expiry instant and everything after it is invalid
    #[test]
    fn prop_invalid_from_expiry(
        start in 0u64..4_000_000_000,
        days in 0u64..1000,
        after in 0u64..10 * DAY,
    ) {
        let cap = capability(start, days);
        prop_assert!(!cap.is_valid_at(cap.expires_at() + after));
    }

    /// Property: a capability is never valid before it starts
    #[test]
    fn prop_invalid_before_start(start in 1u64..u64::MAX, days in any::<u64>(), early in 1u64..=DAY) {
        let cap = capability(start, days);
        prop_assert!(!cap.is_valid_at(start.saturating_sub(early)));
    }

    /// Property: huge durations saturate instead of wrapping
    #[test]
    fn prop_expiry_never_wraps(start in any::<u64>(), days in any::<u64>()) {
        let cap = capability(start, days);
        prop_assert!(cap.expires_at() >= start);
    }

    /// Property: the cache key ignores contract order and repeats
    #[test]
    fn prop_key_ignores_contract_order(
        bytes in prop::collection::vec(any::<u8>(), 1..6),
        chain_id in 1u64..100_000,
    ) {
        let domain = decryption_domain(chain_id, Address::repeat_byte(0xee));
        let user = Address::repeat_byte(0x5e);
        let contracts: Vec<Address> = bytes.iter().map(|b| Address::repeat_byte(*b)).collect();

        let mut reordered = contracts.clone();
        reordered.reverse();
        reordered.push(contracts[0]);

        prop_assert_eq!(
            capability_key(user, &contracts, &domain),
            capability_key(user, &reordered, &domain)
        );
    }
}
