//! Operator risk configuration snapshot
//!
//! A TOML document describing categories, market assignments, borrow-only
//! flags and risk features. Applying a snapshot goes through the engine's
//! validating setters, in dependency order: category params, assignments,
//! active list, borrow-only flags, risk features.
//!
//! ```toml
//! [[categories]]
//! category = "stable"
//! margin_ratio_override = "0.95"
//! liquidation_reward_override = "0.05"
//! active = true
//!
//! [[markets]]
//! id = 2
//! category = "stable"
//!
//! [[markets]]
//! id = 3
//! risk_feature = "single_collateral_with_strict_debt"
//!
//! [[markets.strict_debt_tiers]]
//! debt_market_ids = [1, 2]
//! margin_ratio_override = "1.05"
//! liquidation_reward_override = "0.02"
//! ```

use crate::engine::RiskOverrideEngine;
use crate::strict_debt::StrictDebtTier;
use crate::{Category, MarketId, Ratio, Result, RiskFeature};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Category entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    /// Category
    pub category: Category,

    /// Margin ratio override
    #[serde(default)]
    pub margin_ratio_override: Ratio,

    /// Liquidation reward override
    #[serde(default)]
    pub liquidation_reward_override: Ratio,

    /// Eligible for resolution
    #[serde(default)]
    pub active: bool,
}

/// Market entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Market
    pub id: MarketId,

    /// Category assignment
    #[serde(default)]
    pub category: Category,

    /// Borrow-only flag
    #[serde(default)]
    pub borrow_only: bool,

    /// Risk feature
    #[serde(default)]
    pub risk_feature: RiskFeature,

    /// Tiers for `single_collateral_with_strict_debt`
    #[serde(default)]
    pub strict_debt_tiers: Vec<StrictDebtTier>,
}

/// Full operator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskConfigSnapshot {
    /// Categories
    #[serde(default)]
    pub categories: Vec<CategorySnapshot>,

    /// Markets
    #[serde(default)]
    pub markets: Vec<MarketSnapshot>,
}

impl RiskConfigSnapshot {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply through the engine's setters
    ///
    /// Stops at the first rejected write. Wrap in
    /// [`SharedRiskOverrideEngine::update`](crate::SharedRiskOverrideEngine::update)
    /// to make the whole snapshot all-or-nothing.
    pub fn apply(&self, engine: &mut RiskOverrideEngine) -> Result<()> {
        for entry in &self.categories {
            engine.set_category_param(
                entry.category,
                entry.margin_ratio_override,
                entry.liquidation_reward_override,
            );
        }

        let (markets, categories): (Vec<MarketId>, Vec<Category>) = self
            .markets
            .iter()
            .filter(|m| m.category != Category::None)
            .map(|m| (m.id, m.category))
            .unzip();
        if !markets.is_empty() {
            engine.set_categories(&markets, &categories)?;
        }

        let active: Vec<Category> = self
            .categories
            .iter()
            .filter(|c| c.active)
            .map(|c| c.category)
            .collect();
        engine.set_active_categories(&active);

        let flagged: Vec<MarketId> = self
            .markets
            .iter()
            .filter(|m| m.borrow_only)
            .map(|m| m.id)
            .collect();
        if !flagged.is_empty() {
            engine.set_borrow_only_batch(&flagged, &vec![true; flagged.len()])?;
        }

        for market in &self.markets {
            if market.risk_feature == RiskFeature::None && market.strict_debt_tiers.is_empty() {
                continue;
            }
            let data = if market.strict_debt_tiers.is_empty() {
                Vec::new()
            } else {
                StrictDebtTier::encode_tiers(&market.strict_debt_tiers)?
            };
            engine.set_risk_feature(market.id, market.risk_feature, &data)?;
        }

        info!(
            categories = self.categories.len(),
            markets = self.markets.len(),
            "Risk configuration snapshot applied"
        );
        Ok(())
    }
}
