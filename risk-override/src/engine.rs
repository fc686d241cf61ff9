//! Account risk override resolution
//!
//! # Decision order
//!
//! For one account, evaluated fresh on every call:
//!
//! 1. Privileged or null owner: no override
//! 2. Unknown account: `InvalidAccountForDebt` (when configured)
//! 3. No used markets: no override
//! 4. Any borrow-only market held as collateral: `MarketIsBorrowOnly`
//! 5. Single-collateral strict-debt market held as collateral: the first
//!    tier covering all debt, or `CouldNotFindRiskParam`
//! 6. All used markets in one active category: that category's overrides
//! 7. Otherwise: no override
//!
//! Steps 4 → 5 → 6 run in this order even when a market is configured in
//! more than one table.

use crate::borrow_only::BorrowOnlyRegistry;
use crate::category::CategoryStore;
use crate::config::EngineConfig;
use crate::ledger::{AccountLedger, AccountPosition};
use crate::strict_debt::{RiskFeatureTable, StrictDebtTier};
use crate::{
    AccountId, Category, CategoryMask, CategoryParam, Error, MarketId, Ratio, Result, RiskFeature,
    RiskOverride,
};
use tracing::{debug, info, warn};

/// Risk override engine
///
/// Owns the operator configuration tables. Balances are read from the
/// [`AccountLedger`] passed to [`RiskOverrideEngine::resolve`].
#[derive(Debug, Clone)]
pub struct RiskOverrideEngine {
    config: EngineConfig,
    categories: Box<dyn CategoryStore>,
    borrow_only: BorrowOnlyRegistry,
    features: RiskFeatureTable,
}

impl RiskOverrideEngine {
    /// Create engine with the configured category backend
    pub fn new(config: EngineConfig) -> Self {
        let categories = config.category_backend.build();
        Self::with_category_store(config, categories)
    }

    /// Create engine with an explicit category store
    pub fn with_category_store(config: EngineConfig, categories: Box<dyn CategoryStore>) -> Self {
        Self {
            config,
            categories,
            borrow_only: BorrowOnlyRegistry::new(),
            features: RiskFeatureTable::new(),
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Effective overrides for an account
    pub fn resolve<L>(&self, ledger: &L, account: &AccountId) -> Result<RiskOverride>
    where
        L: AccountLedger + ?Sized,
    {
        if account.owner.is_null() || ledger.is_privileged_account(&account.owner) {
            debug!(%account, "Privileged account, no override");
            return Ok(RiskOverride::NONE);
        }

        let balances = match ledger.account_balances(account) {
            Some(balances) => balances,
            None if self.config.require_known_account => {
                warn!(%account, "Account unknown to ledger");
                return Err(Error::InvalidAccountForDebt {
                    owner: account.owner,
                    number: account.number,
                });
            }
            None => Vec::new(),
        };

        let position = AccountPosition::from_balances(&balances);
        self.resolve_position(&position).map_err(|e| {
            warn!(%account, error = %e, "Risk override resolution rejected");
            e
        })
    }

    /// Effective overrides for an already collected position
    pub fn resolve_position(&self, position: &AccountPosition) -> Result<RiskOverride> {
        if position.is_empty() {
            return Ok(RiskOverride::NONE);
        }

        self.check_borrow_only(position)?;

        if let Some(found) = self.resolve_strict_debt(position)? {
            return Ok(found);
        }

        self.resolve_category(position)
    }

    fn is_borrow_only(&self, market: MarketId) -> bool {
        self.borrow_only.is_borrow_only(market)
            || self.features.risk_feature(market) == RiskFeature::BorrowOnly
    }

    fn check_borrow_only(&self, position: &AccountPosition) -> Result<()> {
        match position
            .collateral_markets
            .iter()
            .find(|m| self.is_borrow_only(**m))
        {
            Some(&market) => Err(Error::MarketIsBorrowOnly(market)),
            None => Ok(()),
        }
    }

    fn resolve_strict_debt(&self, position: &AccountPosition) -> Result<Option<RiskOverride>> {
        let Some(&collateral) = position.collateral_markets.iter().find(|m| {
            self.features.risk_feature(**m) == RiskFeature::SingleCollateralWithStrictDebt
        }) else {
            return Ok(None);
        };

        // A strict-debt collateral must be the only collateral
        if let Some(&other) = position
            .collateral_markets
            .iter()
            .find(|m| **m != collateral)
        {
            return Err(Error::MarketIsBorrowOnly(other));
        }

        if position.debt_markets.contains(&collateral) {
            return Err(Error::MarketIsCollateralOnly(collateral));
        }

        match self.features.find_tier(collateral, &position.debt_markets)? {
            Some((index, tier)) => {
                debug!(market = %collateral, tier = index, "Strict-debt tier matched");
                Ok(Some(RiskOverride::new(
                    tier.margin_ratio_override,
                    tier.liquidation_reward_override,
                )))
            }
            None => Err(Error::CouldNotFindRiskParam(collateral)),
        }
    }

    fn resolve_category(&self, position: &AccountPosition) -> Result<RiskOverride> {
        let used = position.used_markets();
        let mask = self.categories.category_mask_of(&used)?;
        if mask.is_none() {
            debug!(markets = used.len(), "No shared active category, no override");
            return Ok(RiskOverride::NONE);
        }

        let param = self.categories.get_category_param(used[0])?;
        debug!(category = %param.category, "Category override applied");
        Ok(param.into())
    }

    // Category table

    /// Assign a market to a category
    pub fn set_category(&mut self, market: MarketId, category: Category) -> Result<()> {
        self.categories.set_category(market, category)?;
        info!(market = %market, category = %category, "Category set");
        Ok(())
    }

    /// Assign markets to categories over parallel slices
    pub fn set_categories(&mut self, markets: &[MarketId], categories: &[Category]) -> Result<()> {
        self.categories.set_categories(markets, categories)?;
        info!(count = markets.len(), "Categories set");
        Ok(())
    }

    /// Store a category's override parameters
    ///
    /// Accepted verbatim: zero is a valid "no override" value here, unlike
    /// strict-debt tiers.
    pub fn set_category_param(
        &mut self,
        category: Category,
        margin_ratio_override: Ratio,
        liquidation_reward_override: Ratio,
    ) {
        self.categories.set_category_param(CategoryParam {
            category,
            margin_ratio_override,
            liquidation_reward_override,
        });
        info!(
            category = %category,
            margin_ratio = %margin_ratio_override,
            liquidation_reward = %liquidation_reward_override,
            "Category param set"
        );
    }

    /// Replace the active category list
    pub fn set_active_categories(&mut self, categories: &[Category]) {
        self.categories.set_active_categories(categories);
        info!(active = ?self.categories.active_categories(), "Active categories set");
    }

    /// Category assigned to a market
    pub fn category_of(&self, market: MarketId) -> Category {
        self.categories.category_of(market)
    }

    /// Active categories
    pub fn active_categories(&self) -> Vec<Category> {
        self.categories.active_categories()
    }

    /// Stored parameters of a category
    pub fn category_param(&self, category: Category) -> Option<CategoryParam> {
        self.categories.category_param(category)
    }

    /// Shared active category mask of `markets`
    pub fn category_mask_of(&self, markets: &[MarketId]) -> Result<CategoryMask> {
        self.categories.category_mask_of(markets)
    }

    /// Parameters of a market's active category
    pub fn get_category_param(&self, market: MarketId) -> Result<CategoryParam> {
        self.categories.get_category_param(market)
    }

    // Borrow-only registry

    /// Set or clear a market's borrow-only flag
    pub fn set_borrow_only(&mut self, market: MarketId, borrow_only: bool) -> Result<()> {
        self.borrow_only.set_borrow_only(market, borrow_only)?;
        info!(market = %market, borrow_only, "Borrow-only flag set");
        Ok(())
    }

    /// Set borrow-only flags over parallel slices
    pub fn set_borrow_only_batch(&mut self, markets: &[MarketId], flags: &[bool]) -> Result<()> {
        self.borrow_only.set_borrow_only_batch(markets, flags)?;
        info!(count = markets.len(), "Borrow-only flags set");
        Ok(())
    }

    /// Check whether a market may only be borrowed (flag or feature)
    pub fn is_market_borrow_only(&self, market: MarketId) -> bool {
        self.is_borrow_only(market)
    }

    // Risk features

    /// Configure a market's risk feature
    pub fn set_risk_feature(
        &mut self,
        market: MarketId,
        feature: RiskFeature,
        extra_data: &[u8],
    ) -> Result<()> {
        self.features
            .set_risk_feature(market, feature, extra_data, &self.config.limits)?;
        info!(market = %market, feature = %feature, "Risk feature set");
        Ok(())
    }

    /// Configure single-collateral tiers from typed values
    pub fn set_single_collateral_tiers(
        &mut self,
        market: MarketId,
        tiers: &[StrictDebtTier],
    ) -> Result<()> {
        let data = StrictDebtTier::encode_tiers(tiers)?;
        self.set_risk_feature(market, RiskFeature::SingleCollateralWithStrictDebt, &data)
    }

    /// Feature configured for a market
    pub fn risk_feature(&self, market: MarketId) -> RiskFeature {
        self.features.risk_feature(market)
    }

    /// Tiers of a single-collateral market
    pub fn get_risk_feature_for_single_collateral(
        &self,
        market: MarketId,
    ) -> Result<Vec<StrictDebtTier>> {
        self.features.get_risk_feature_for_single_collateral(market)
    }
}
