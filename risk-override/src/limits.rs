//! Protocol-wide ceilings for override parameters

use crate::{Error, MarketId, Ratio, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ratio limit configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioLimits {
    /// Highest accepted margin ratio override
    pub max_margin_ratio: Decimal,

    /// Highest accepted liquidation reward override
    pub max_liquidation_reward: Decimal,
}

impl Default for RatioLimits {
    fn default() -> Self {
        Self {
            max_margin_ratio: Decimal::TWO,              // 200%
            max_liquidation_reward: Decimal::new(15, 2), // 15%
        }
    }
}

impl RatioLimits {
    /// Check a strict-debt margin ratio: must be in (0, max]
    pub fn check_margin_ratio(&self, market: MarketId, tier: usize, ratio: Ratio) -> Result<()> {
        if ratio.is_zero() {
            return Err(Error::InvalidMarginRatio { market, tier });
        }
        if ratio.value() > self.max_margin_ratio {
            return Err(Error::MarginRatioTooHigh { market, tier, ratio });
        }
        Ok(())
    }

    /// Check a strict-debt liquidation reward: must be in (0, max]
    pub fn check_liquidation_reward(
        &self,
        market: MarketId,
        tier: usize,
        reward: Ratio,
    ) -> Result<()> {
        if reward.is_zero() {
            return Err(Error::InvalidLiquidationReward { market, tier });
        }
        if reward.value() > self.max_liquidation_reward {
            return Err(Error::LiquidationRewardTooHigh { market, tier, reward });
        }
        Ok(())
    }
}
