//! Configuration for the risk override engine

use crate::category::CategoryBackend;
use crate::limits::RatioLimits;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Category storage strategy
    pub category_backend: CategoryBackend,

    /// Ceilings for strict-debt overrides
    pub limits: RatioLimits,

    /// Fail resolution for accounts the ledger cannot resolve
    pub require_known_account: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            category_backend: CategoryBackend::Bitmap,
            limits: RatioLimits::default(),
            require_known_account: true,
        }
    }
}

impl EngineConfig {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::default().with_env()
    }

    /// Overlay environment variables on this configuration
    pub fn with_env(mut self) -> crate::Result<Self> {
        if let Ok(backend) = std::env::var("RISK_OVERRIDE_CATEGORY_BACKEND") {
            self.category_backend = backend.parse()?;
        }

        if let Ok(ratio) = std::env::var("RISK_OVERRIDE_MAX_MARGIN_RATIO") {
            self.limits.max_margin_ratio = parse_decimal("RISK_OVERRIDE_MAX_MARGIN_RATIO", &ratio)?;
        }

        if let Ok(reward) = std::env::var("RISK_OVERRIDE_MAX_LIQUIDATION_REWARD") {
            self.limits.max_liquidation_reward =
                parse_decimal("RISK_OVERRIDE_MAX_LIQUIDATION_REWARD", &reward)?;
        }

        if let Ok(flag) = std::env::var("RISK_OVERRIDE_REQUIRE_KNOWN_ACCOUNT") {
            self.require_known_account = flag.parse().map_err(|e| {
                crate::Error::Config(format!("RISK_OVERRIDE_REQUIRE_KNOWN_ACCOUNT: {}", e))
            })?;
        }

        Ok(self)
    }
}

fn parse_decimal(name: &str, value: &str) -> crate::Result<Decimal> {
    Decimal::from_str(value).map_err(|e| crate::Error::Config(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.category_backend, CategoryBackend::Bitmap);
        assert_eq!(config.limits.max_margin_ratio, Decimal::TWO);
        assert!(config.require_known_account);
    }

    #[test]
    fn test_parse_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            category_backend = "mapping"
            require_known_account = false

            [limits]
            max_margin_ratio = "1.5"
            "#,
        )
        .unwrap();

        assert_eq!(config.category_backend, CategoryBackend::Mapping);
        assert!(!config.require_known_account);
        assert_eq!(config.limits.max_margin_ratio, Decimal::new(15, 1));
        assert_eq!(config.limits.max_liquidation_reward, Decimal::new(15, 2));
    }

    #[test]
    fn test_parse_rejects_unknown_backend() {
        assert!(EngineConfig::from_toml_str(r#"category_backend = "redis""#).is_err());
    }
}
