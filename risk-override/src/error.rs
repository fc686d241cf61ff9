//! Error types for the risk override engine

use crate::types::{MarketId, Owner, Ratio, RiskFeature};
use rust_decimal::Decimal;
use thiserror::Error;

/// Risk override error
#[derive(Debug, Error)]
pub enum Error {
    // Configuration validation (raised by setters)
    /// Parallel input arrays differ in length or are both empty
    #[error("Invalid array length: {markets} markets, {values} values")]
    InvalidArrayLength {
        /// Number of market ids supplied
        markets: usize,
        /// Number of paired values supplied
        values: usize,
    },

    /// Market list must not be empty
    #[error("Invalid input length: market list is empty")]
    InvalidInputLength,

    /// Strict-debt tier list is empty
    #[error("Invalid risk structs for market {0}: tier list is empty")]
    InvalidRiskStructs(MarketId),

    /// Tier has no debt markets
    #[error("Invalid debt market ids for market {market}: tier {tier} is empty")]
    InvalidDebtMarketIds {
        /// Collateral market being configured
        market: MarketId,
        /// Tier index
        tier: usize,
    },

    /// Zero margin ratio in a tier
    #[error("Invalid margin ratio for market {market}, tier {tier}")]
    InvalidMarginRatio {
        /// Collateral market being configured
        market: MarketId,
        /// Tier index
        tier: usize,
    },

    /// Margin ratio above the protocol ceiling
    #[error("Margin ratio {ratio} too high for market {market}, tier {tier}")]
    MarginRatioTooHigh {
        /// Collateral market being configured
        market: MarketId,
        /// Tier index
        tier: usize,
        /// Supplied ratio
        ratio: Ratio,
    },

    /// Zero liquidation reward in a tier
    #[error("Invalid liquidation reward for market {market}, tier {tier}")]
    InvalidLiquidationReward {
        /// Collateral market being configured
        market: MarketId,
        /// Tier index
        tier: usize,
    },

    /// Liquidation reward above the protocol ceiling
    #[error("Liquidation reward {reward} too high for market {market}, tier {tier}")]
    LiquidationRewardTooHigh {
        /// Collateral market being configured
        market: MarketId,
        /// Tier index
        tier: usize,
        /// Supplied reward
        reward: Ratio,
    },

    /// Debt market ids are not strictly ascending (includes duplicates)
    #[error("Markets not ascending: {next} follows {previous}")]
    MarketsNotAscending {
        /// Earlier id in the list
        previous: MarketId,
        /// Id that failed to exceed it
        next: MarketId,
    },

    /// Payload supplied for a feature that takes none
    #[error("Invalid data for risk feature {feature} on market {market}")]
    InvalidDataForRiskFeature {
        /// Market being configured
        market: MarketId,
        /// Feature requested
        feature: RiskFeature,
    },

    /// Market does not carry the requested feature
    #[error("Invalid risk feature for market {market}: configured as {feature}")]
    InvalidRiskFeature {
        /// Market queried
        market: MarketId,
        /// Feature actually configured
        feature: RiskFeature,
    },

    /// Market has no active category
    #[error("No category found for market {0}")]
    NoCategoryFound(MarketId),

    /// Market id exceeds bitset capacity
    #[error("Market {0} out of range")]
    MarketOutOfRange(MarketId),

    /// Ratio below zero
    #[error("Negative ratio: {0}")]
    NegativeRatio(Decimal),

    // Resolution-time policy violations
    /// Borrow-only market held as collateral
    #[error("Market {0} is borrow only")]
    MarketIsBorrowOnly(MarketId),

    /// Strict-collateral market also borrowed
    ///
    /// Only reachable when the ledger reports separate collateral and debt
    /// entries for the same market instead of one netted balance.
    #[error("Market {0} is collateral only")]
    MarketIsCollateralOnly(MarketId),

    /// Debt not covered by any strict-debt tier of the collateral market
    #[error("Could not find risk param for collateral market {0}")]
    CouldNotFindRiskParam(MarketId),

    /// Account unknown to the accounting core
    #[error("Invalid account for debt: {owner} #{number}")]
    InvalidAccountForDebt {
        /// Account owner
        owner: Owner,
        /// Sub-account number
        number: u64,
    },

    // Ambient
    /// Invalid configuration file or value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Undecodable feature payload
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Resolution-time violation that must abort the triggering operation
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            Error::MarketIsBorrowOnly(_)
                | Error::MarketIsCollateralOnly(_)
                | Error::CouldNotFindRiskParam(_)
                | Error::InvalidAccountForDebt { .. }
        )
    }

    /// Rejected configuration write
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArrayLength { .. }
                | Error::InvalidInputLength
                | Error::InvalidRiskStructs(_)
                | Error::InvalidDebtMarketIds { .. }
                | Error::InvalidMarginRatio { .. }
                | Error::MarginRatioTooHigh { .. }
                | Error::InvalidLiquidationReward { .. }
                | Error::LiquidationRewardTooHigh { .. }
                | Error::MarketsNotAscending { .. }
                | Error::InvalidDataForRiskFeature { .. }
                | Error::MarketOutOfRange(_)
                | Error::NegativeRatio(_)
                | Error::Serialization(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
