//! Property-based tests for override resolution invariants
//!
//! - Determinism: same configuration and balances → same result
//! - Conservatism: no shared active category and no strict-debt path → no override
//! - Backend equivalence: bitmap and mapping stores agree
//! - Ascending order: tier debt lists must be strictly ascending

use proptest::prelude::*;
use risk_override::{
    AccountPosition, Category, CategoryBackend, EngineConfig, Error, MarketBalance, MarketId,
    Ratio, RiskOverrideEngine, StrictDebtTier,
};
use rust_decimal::Decimal;

const MARKET_COUNT: u32 = 12;

/// Strategy for generating a category
fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::None),
        Just(Category::Bera),
        Just(Category::Btc),
        Just(Category::Eth),
        Just(Category::Stable),
    ]
}

/// Strategy for generating nonzero signed balances over a small market space
fn balances_strategy() -> impl Strategy<Value = Vec<MarketBalance>> {
    prop::collection::btree_map(
        0..MARKET_COUNT,
        prop_oneof![-1_000_000i64..-1, 1i64..1_000_000],
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(market, par)| MarketBalance::new(MarketId(market), Decimal::from(par)))
            .collect()
    })
}

fn engine_with(
    backend: CategoryBackend,
    assignments: &[Category],
    active: &[Category],
) -> RiskOverrideEngine {
    let mut engine = RiskOverrideEngine::new(EngineConfig {
        category_backend: backend,
        ..EngineConfig::default()
    });
    let markets: Vec<MarketId> = (0..assignments.len() as u32).map(MarketId).collect();
    engine.set_categories(&markets, assignments).unwrap();
    for (offset, category) in Category::ASSIGNABLE.iter().enumerate() {
        let offset = offset as u32;
        engine.set_category_param(
            *category,
            Ratio::from_percent(80 + offset),
            Ratio::from_percent(2 + offset),
        );
    }
    engine.set_active_categories(active);
    engine
}

fn categories_strategy() -> impl Strategy<Value = (Vec<Category>, Vec<Category>)> {
    (
        prop::collection::vec(category_strategy(), MARKET_COUNT as usize),
        prop::collection::vec(category_strategy(), 0..5),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: resolution has no hidden state
    #[test]
    fn prop_resolution_deterministic(
        (assignments, active) in categories_strategy(),
        balances in balances_strategy(),
    ) {
        let engine = engine_with(CategoryBackend::Bitmap, &assignments, &active);
        let position = AccountPosition::from_balances(&balances);

        let first = engine.resolve_position(&position).unwrap();
        let second = engine.resolve_position(&position).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: an override is returned only when every used market shares one active category
    #[test]
    fn prop_resolution_conservative(
        (assignments, active) in categories_strategy(),
        balances in balances_strategy(),
    ) {
        let engine = engine_with(CategoryBackend::Mapping, &assignments, &active);
        let position = AccountPosition::from_balances(&balances);
        let result = engine.resolve_position(&position).unwrap();

        let used = position.used_markets();
        let shared = used
            .first()
            .map(|m| assignments[m.get() as usize])
            .filter(|c| *c != Category::None && active.contains(c))
            .filter(|c| used.iter().all(|m| assignments[m.get() as usize] == *c));

        match shared {
            Some(category) => {
                let param = engine.category_param(category).unwrap();
                prop_assert_eq!(result.margin_ratio_override, param.margin_ratio_override);
            }
            None => prop_assert!(result.is_none()),
        }
    }

    /// Property: both category backends resolve identically
    #[test]
    fn prop_backends_agree(
        (assignments, active) in categories_strategy(),
        balances in balances_strategy(),
    ) {
        let bitmap = engine_with(CategoryBackend::Bitmap, &assignments, &active);
        let mapping = engine_with(CategoryBackend::Mapping, &assignments, &active);
        let position = AccountPosition::from_balances(&balances);

        prop_assert_eq!(
            bitmap.resolve_position(&position).unwrap(),
            mapping.resolve_position(&position).unwrap()
        );

        let used = position.used_markets();
        if !used.is_empty() {
            prop_assert_eq!(
                bitmap.category_mask_of(&used).unwrap(),
                mapping.category_mask_of(&used).unwrap()
            );
        }
    }

    /// Property: tier debt lists are accepted exactly when strictly ascending
    #[test]
    fn prop_tier_ascending_order(ids in prop::collection::vec(0u32..64, 1..8)) {
        let mut engine = RiskOverrideEngine::new(EngineConfig::default());
        let debt: Vec<MarketId> = ids.iter().copied().map(MarketId).collect();
        let ascending = debt.windows(2).all(|pair| pair[0] < pair[1]);

        let result = engine.set_single_collateral_tiers(
            MarketId(100),
            &[StrictDebtTier::new(debt.clone(), Ratio::from_percent(105), Ratio::from_percent(2))],
        );

        if ascending {
            prop_assert!(result.is_ok());
            let tiers = engine.get_risk_feature_for_single_collateral(MarketId(100)).unwrap();
            prop_assert_eq!(&tiers[0].debt_market_ids, &debt);
        } else {
            prop_assert!(matches!(result, Err(Error::MarketsNotAscending { .. })), "unexpected result: {:?}", result);
        }
    }

    /// Property: any borrow-only collateral fails resolution whatever else is configured
    #[test]
    fn prop_borrow_only_collateral_always_fails(
        (assignments, active) in categories_strategy(),
        balances in balances_strategy(),
        flagged in 0..MARKET_COUNT,
    ) {
        let mut engine = engine_with(CategoryBackend::Bitmap, &assignments, &active);
        engine.set_borrow_only(MarketId(flagged), true).unwrap();

        let mut balances = balances;
        balances.retain(|b| b.market != MarketId(flagged));
        balances.push(MarketBalance::new(MarketId(flagged), Decimal::from(100)));
        let position = AccountPosition::from_balances(&balances);

        let result = engine.resolve_position(&position);
        prop_assert!(matches!(result, Err(Error::MarketIsBorrowOnly(_))));
    }
}
