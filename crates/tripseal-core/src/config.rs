//! Vault runtime settings

use serde::{Deserialize, Serialize};
use tripseal_proto::CodecMode;

use crate::capability::CapabilityPolicy;
use crate::retry::RetryPolicy;

/// Tunables shared by all vault operations
///
/// Every field has a default, so a partial config file is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub retry: RetryPolicy,
    pub capability: CapabilityPolicy,
    /// Reject proofs carrying the legacy trailing byte
    pub strict_proofs: bool,
}

impl VaultSettings {
    pub fn codec_mode(&self) -> CodecMode {
        if self.strict_proofs {
            CodecMode::Strict
        } else {
            CodecMode::Tolerant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = VaultSettings::default();
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.base_delay_ms, 1000);
        assert_eq!(settings.capability.duration_days, 365);
        assert_eq!(settings.codec_mode(), CodecMode::Tolerant);
    }

    #[test]
    fn test_partial_override() {
        let settings: VaultSettings =
            serde_json::from_str(r#"{"retry": {"base_delay_ms": 10}, "strict_proofs": true}"#)
                .unwrap();
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.base_delay_ms, 10);
        assert_eq!(settings.codec_mode(), CodecMode::Strict);
    }
}
