//! Per-market risk features and single-collateral strict-debt tiers
//!
//! A market configured as `SINGLE_COLLATERAL_WITH_STRICT_DEBT` carries an
//! ordered list of tiers. When the market is an account's only collateral,
//! the first tier whose debt set covers all of the account's debt supplies
//! the overrides.
//!
//! Tiers arrive as an opaque `extra_data` payload (see
//! [`StrictDebtTier::encode_tiers`]) and are validated as a whole before the
//! market's previous configuration is replaced.

use crate::bitset::MarketBitset;
use crate::limits::RatioLimits;
use crate::{Error, MarketId, Ratio, Result, RiskFeature};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One strict-debt tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictDebtTier {
    /// Debt markets covered, strictly ascending
    pub debt_market_ids: Vec<MarketId>,

    /// Margin ratio override
    pub margin_ratio_override: Ratio,

    /// Liquidation reward override
    pub liquidation_reward_override: Ratio,
}

impl StrictDebtTier {
    /// Create tier
    pub fn new(
        debt_market_ids: Vec<MarketId>,
        margin_ratio_override: Ratio,
        liquidation_reward_override: Ratio,
    ) -> Self {
        Self {
            debt_market_ids,
            margin_ratio_override,
            liquidation_reward_override,
        }
    }

    /// Encode a tier list as `extra_data`
    pub fn encode_tiers(tiers: &[StrictDebtTier]) -> Result<Vec<u8>> {
        Ok(bincode::serialize(tiers)?)
    }

    /// Decode `extra_data`; an empty payload is an empty list
    pub fn decode_tiers(data: &[u8]) -> Result<Vec<StrictDebtTier>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        Ok(bincode::deserialize(data)?)
    }
}

#[derive(Debug, Clone)]
struct CompiledTier {
    tier: StrictDebtTier,
    debt_set: MarketBitset,
}

#[derive(Debug, Clone)]
enum FeatureEntry {
    BorrowOnly,
    SingleCollateral(Vec<CompiledTier>),
}

impl FeatureEntry {
    fn feature(&self) -> RiskFeature {
        match self {
            FeatureEntry::BorrowOnly => RiskFeature::BorrowOnly,
            FeatureEntry::SingleCollateral(_) => RiskFeature::SingleCollateralWithStrictDebt,
        }
    }
}

fn compile_tiers(
    market: MarketId,
    tiers: Vec<StrictDebtTier>,
    limits: &RatioLimits,
) -> Result<Vec<CompiledTier>> {
    if tiers.is_empty() {
        return Err(Error::InvalidRiskStructs(market));
    }

    let mut compiled = Vec::with_capacity(tiers.len());
    for (index, tier) in tiers.into_iter().enumerate() {
        if tier.debt_market_ids.is_empty() {
            return Err(Error::InvalidDebtMarketIds { market, tier: index });
        }
        limits.check_margin_ratio(market, index, tier.margin_ratio_override)?;
        limits.check_liquidation_reward(market, index, tier.liquidation_reward_override)?;

        // Strict ascension also rules out duplicates
        for pair in tier.debt_market_ids.windows(2) {
            if pair[0] >= pair[1] {
                return Err(Error::MarketsNotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        let debt_set = MarketBitset::mask_of(&tier.debt_market_ids)?;
        compiled.push(CompiledTier { tier, debt_set });
    }
    Ok(compiled)
}

/// Per-market risk feature table
#[derive(Debug, Clone, Default)]
pub struct RiskFeatureTable {
    entries: HashMap<MarketId, FeatureEntry>,
}

impl RiskFeatureTable {
    /// Create empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure a market's feature
    ///
    /// `extra_data` must be empty for `None` and `BorrowOnly`, and must decode
    /// to a valid tier list for `SingleCollateralWithStrictDebt`. The market's
    /// previous configuration is replaced only if validation succeeds.
    pub fn set_risk_feature(
        &mut self,
        market: MarketId,
        feature: RiskFeature,
        extra_data: &[u8],
        limits: &RatioLimits,
    ) -> Result<()> {
        match feature {
            RiskFeature::None | RiskFeature::BorrowOnly if !extra_data.is_empty() => {
                Err(Error::InvalidDataForRiskFeature { market, feature })
            }
            RiskFeature::None => {
                self.entries.remove(&market);
                Ok(())
            }
            RiskFeature::BorrowOnly => {
                self.entries.insert(market, FeatureEntry::BorrowOnly);
                Ok(())
            }
            RiskFeature::SingleCollateralWithStrictDebt => {
                let tiers = StrictDebtTier::decode_tiers(extra_data)?;
                let compiled = compile_tiers(market, tiers, limits)?;
                self.entries
                    .insert(market, FeatureEntry::SingleCollateral(compiled));
                Ok(())
            }
        }
    }

    /// Feature configured for a market
    pub fn risk_feature(&self, market: MarketId) -> RiskFeature {
        self.entries
            .get(&market)
            .map(FeatureEntry::feature)
            .unwrap_or(RiskFeature::None)
    }

    /// Tiers of a single-collateral market
    pub fn get_risk_feature_for_single_collateral(
        &self,
        market: MarketId,
    ) -> Result<Vec<StrictDebtTier>> {
        Ok(self
            .compiled_tiers(market)?
            .iter()
            .map(|c| c.tier.clone())
            .collect())
    }

    /// First tier (index and tier) covering every market in `debt_markets`
    pub fn find_tier(
        &self,
        market: MarketId,
        debt_markets: &[MarketId],
    ) -> Result<Option<(usize, &StrictDebtTier)>> {
        let tiers = self.compiled_tiers(market)?;
        // Debt beyond bitset capacity cannot be covered by any tier
        let Ok(debt) = MarketBitset::mask_of(debt_markets) else {
            return Ok(None);
        };
        Ok(debt
            .is_subset_of_any(tiers.iter().map(|c| &c.debt_set))
            .map(|index| (index, &tiers[index].tier)))
    }

    /// Markets carrying any feature, ascending
    pub fn configured_markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<MarketId> = self.entries.keys().copied().collect();
        markets.sort_unstable();
        markets
    }

    fn compiled_tiers(&self, market: MarketId) -> Result<&[CompiledTier]> {
        match self.entries.get(&market) {
            Some(FeatureEntry::SingleCollateral(tiers)) => Ok(tiers),
            other => Err(Error::InvalidRiskFeature {
                market,
                feature: other
                    .map(FeatureEntry::feature)
                    .unwrap_or(RiskFeature::None),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLATERAL: MarketId = MarketId(2);
    const USDC: MarketId = MarketId(5);
    const HONEY: MarketId = MarketId(7);

    fn tier(ids: &[MarketId], ratio: u32, reward: u32) -> StrictDebtTier {
        StrictDebtTier::new(
            ids.to_vec(),
            Ratio::from_percent(ratio),
            Ratio::from_percent(reward),
        )
    }

    fn configure(table: &mut RiskFeatureTable, tiers: &[StrictDebtTier]) -> Result<()> {
        let data = StrictDebtTier::encode_tiers(tiers)?;
        table.set_risk_feature(
            COLLATERAL,
            RiskFeature::SingleCollateralWithStrictDebt,
            &data,
            &RatioLimits::default(),
        )
    }

    #[test]
    fn test_ascending_tier_accepted() {
        let mut table = RiskFeatureTable::new();
        configure(&mut table, &[tier(&[USDC, HONEY], 105, 2)]).unwrap();

        assert_eq!(
            table.risk_feature(COLLATERAL),
            RiskFeature::SingleCollateralWithStrictDebt
        );
        let tiers = table.get_risk_feature_for_single_collateral(COLLATERAL).unwrap();
        assert_eq!(tiers, vec![tier(&[USDC, HONEY], 105, 2)]);
    }

    #[test]
    fn test_descending_and_duplicate_rejected() {
        let mut table = RiskFeatureTable::new();

        let result = configure(&mut table, &[tier(&[HONEY, USDC], 105, 2)]);
        assert!(matches!(
            result,
            Err(Error::MarketsNotAscending { previous: HONEY, next: USDC })
        ));

        let result = configure(&mut table, &[tier(&[USDC, USDC], 105, 2)]);
        assert!(matches!(result, Err(Error::MarketsNotAscending { .. })));

        assert_eq!(table.risk_feature(COLLATERAL), RiskFeature::None);
    }

    #[test]
    fn test_empty_structures_rejected() {
        let mut table = RiskFeatureTable::new();

        assert!(matches!(
            configure(&mut table, &[]),
            Err(Error::InvalidRiskStructs(COLLATERAL))
        ));
        assert!(matches!(
            table.set_risk_feature(
                COLLATERAL,
                RiskFeature::SingleCollateralWithStrictDebt,
                &[],
                &RatioLimits::default(),
            ),
            Err(Error::InvalidRiskStructs(COLLATERAL))
        ));
        assert!(matches!(
            configure(&mut table, &[tier(&[USDC], 105, 2), tier(&[], 105, 2)]),
            Err(Error::InvalidDebtMarketIds { tier: 1, .. })
        ));
    }

    #[test]
    fn test_ratio_bounds_rejected() {
        let mut table = RiskFeatureTable::new();

        assert!(matches!(
            configure(&mut table, &[tier(&[USDC], 0, 2)]),
            Err(Error::InvalidMarginRatio { .. })
        ));
        assert!(matches!(
            configure(&mut table, &[tier(&[USDC], 250, 2)]),
            Err(Error::MarginRatioTooHigh { .. })
        ));
        assert!(matches!(
            configure(&mut table, &[tier(&[USDC], 105, 0)]),
            Err(Error::InvalidLiquidationReward { .. })
        ));
        assert!(matches!(
            configure(&mut table, &[tier(&[USDC], 105, 20)]),
            Err(Error::LiquidationRewardTooHigh { .. })
        ));
    }

    #[test]
    fn test_payload_rejected_for_other_features() {
        let mut table = RiskFeatureTable::new();
        let data = StrictDebtTier::encode_tiers(&[tier(&[USDC], 105, 2)]).unwrap();

        for feature in [RiskFeature::None, RiskFeature::BorrowOnly] {
            let result =
                table.set_risk_feature(COLLATERAL, feature, &data, &RatioLimits::default());
            assert!(matches!(
                result,
                Err(Error::InvalidDataForRiskFeature { feature: f, .. }) if f == feature
            ));
        }
    }

    #[test]
    fn test_getter_rejects_other_features() {
        let mut table = RiskFeatureTable::new();
        table
            .set_risk_feature(COLLATERAL, RiskFeature::BorrowOnly, &[], &RatioLimits::default())
            .unwrap();

        assert!(matches!(
            table.get_risk_feature_for_single_collateral(COLLATERAL),
            Err(Error::InvalidRiskFeature { feature: RiskFeature::BorrowOnly, .. })
        ));
        assert!(matches!(
            table.get_risk_feature_for_single_collateral(USDC),
            Err(Error::InvalidRiskFeature { feature: RiskFeature::None, .. })
        ));
    }

    #[test]
    fn test_failed_update_keeps_previous_tiers() {
        let mut table = RiskFeatureTable::new();
        configure(&mut table, &[tier(&[USDC], 105, 2)]).unwrap();

        assert!(configure(&mut table, &[tier(&[USDC], 105, 2), tier(&[HONEY, USDC], 109, 4)]).is_err());
        let tiers = table.get_risk_feature_for_single_collateral(COLLATERAL).unwrap();
        assert_eq!(tiers.len(), 1);
    }

    #[test]
    fn test_find_tier_first_match() {
        let mut table = RiskFeatureTable::new();
        configure(
            &mut table,
            &[tier(&[USDC], 105, 2), tier(&[USDC, HONEY], 109, 4)],
        )
        .unwrap();

        let (index, found) = table.find_tier(COLLATERAL, &[USDC]).unwrap().unwrap();
        assert_eq!(index, 0);
        assert_eq!(found.margin_ratio_override, Ratio::from_percent(105));

        let (index, _) = table.find_tier(COLLATERAL, &[HONEY]).unwrap().unwrap();
        assert_eq!(index, 1);

        assert!(table.find_tier(COLLATERAL, &[MarketId(9)]).unwrap().is_none());
    }

    #[test]
    fn test_clearing_feature() {
        let mut table = RiskFeatureTable::new();
        configure(&mut table, &[tier(&[USDC], 105, 2)]).unwrap();
        table
            .set_risk_feature(COLLATERAL, RiskFeature::None, &[], &RatioLimits::default())
            .unwrap();

        assert_eq!(table.risk_feature(COLLATERAL), RiskFeature::None);
        assert!(table.configured_markets().is_empty());
    }
}
