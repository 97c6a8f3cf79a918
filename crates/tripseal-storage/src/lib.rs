//! tripseal-storage: Capability store backends
//!
//! A capability store is a string-keyed map of JSON documents. The client
//! keeps one entry per `(user, contract set)` pair; values are opaque here.
//! No signature or expiry logic lives in this crate.
//!
//! ## Backends
//!
//! | Backend                     | Use Case                  |
//! |-----------------------------|---------------------------|
//! | `InMemoryCapabilityStore`   | Unit tests, one-shot runs |
//! | `LocalFileCapabilityStore`  | CLI, survives restarts    |
//!
//! Every write replaces a whole record. The file backend writes to a
//! temporary file and renames it into place, so readers see either the old
//! record or the new one.
//!
//! ## Example
//!
//! ```rust
//! use tripseal_storage::{CapabilityStore, InMemoryCapabilityStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryCapabilityStore::new();
//!
//! store.set_item("0xabc:0x01", r#"{"durationDays":365}"#).await?;
//! assert!(store.get_item("0xabc:0x01").await?.is_some());
//! # Ok(())
//! # }
//! ```

mod error;
mod local;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use local::LocalFileCapabilityStore;
pub use memory::InMemoryCapabilityStore;
pub use traits::CapabilityStore;
