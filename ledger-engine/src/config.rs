//! Configuration for the posting engine

use serde::{Deserialize, Serialize};

/// Posting engine limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum entries per posting request
    pub max_entries: usize,

    /// Maximum reference id length (`varchar(64)`)
    pub max_reference_len: usize,

    /// Maximum transaction type length (`varchar(32)`)
    pub max_tx_type_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            max_reference_len: 64,
            max_tx_type_len: 32,
        }
    }
}

impl EngineConfig {
    /// Reject limits that would refuse every request
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_entries < 2 {
            return Err(crate::Error::InvalidRequest(
                "engine.max_entries must be at least 2".to_string(),
            ));
        }
        if self.max_reference_len == 0 || self.max_tx_type_len == 0 {
            return Err(crate::Error::InvalidRequest(
                "engine length limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.max_reference_len, 64);
        assert_eq!(config.max_tx_type_len, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_entries": 10}"#).unwrap();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.max_reference_len, 64);
    }

    #[test]
    fn test_validate_rejects_tiny_limits() {
        let config = EngineConfig {
            max_entries: 1,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
