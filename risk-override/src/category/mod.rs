//! Category table: market → category assignments and per-category overrides
//!
//! Two storage strategies sit behind [`CategoryStore`]:
//!
//! - [`BitmapCategoryStore`]: one packed member set per category; the shared
//!   category of a market list is found with a single subset test per
//!   category. Suited to large, dense market spaces.
//! - [`MappingCategoryStore`]: hash maps keyed by market and category.
//!   Suited to sparse or frequently changing configuration.
//!
//! Both accept category parameters verbatim, zero included. A zero override
//! on an active category resolves to "no override".

pub mod bitmap;
pub mod mapping;

pub use bitmap::BitmapCategoryStore;
pub use mapping::MappingCategoryStore;

use crate::{Category, CategoryMask, CategoryParam, Error, MarketId, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBackend {
    /// Packed bitset per category
    #[default]
    Bitmap,
    /// Hash maps
    Mapping,
}

impl CategoryBackend {
    /// Build an empty store for this backend
    pub fn build(&self) -> Box<dyn CategoryStore> {
        match self {
            CategoryBackend::Bitmap => Box::new(BitmapCategoryStore::new()),
            CategoryBackend::Mapping => Box::new(MappingCategoryStore::new()),
        }
    }
}

impl std::str::FromStr for CategoryBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bitmap" => Ok(CategoryBackend::Bitmap),
            "mapping" => Ok(CategoryBackend::Mapping),
            other => Err(Error::Config(format!("Unknown category backend: {}", other))),
        }
    }
}

/// Category storage capability
pub trait CategoryStore: fmt::Debug + Send + Sync {
    /// Assign a market to a category; `Category::None` clears the assignment
    fn set_category(&mut self, market: MarketId, category: Category) -> Result<()>;

    /// Store override parameters for a category
    fn set_category_param(&mut self, param: CategoryParam);

    /// Replace the active category list
    fn set_active_categories(&mut self, categories: &[Category]);

    /// Category assigned to a market
    fn category_of(&self, market: MarketId) -> Category;

    /// Check if a category is active
    fn is_active(&self, category: Category) -> bool;

    /// Stored parameters, active or not
    fn category_param(&self, category: Category) -> Option<CategoryParam>;

    /// Mask of the single active category shared by every market in `markets`
    ///
    /// Returns [`CategoryMask::NONE`] for mixed, uncategorized or inactive
    /// markets. An empty list is rejected with [`Error::InvalidInputLength`].
    fn category_mask_of(&self, markets: &[MarketId]) -> Result<CategoryMask>;

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn CategoryStore>;

    /// Batched assignment over parallel slices
    fn set_categories(&mut self, markets: &[MarketId], categories: &[Category]) -> Result<()> {
        check_parallel_lengths(markets.len(), categories.len())?;
        for (&market, &category) in markets.iter().zip(categories) {
            self.set_category(market, category)?;
        }
        Ok(())
    }

    /// Active categories in declaration order
    fn active_categories(&self) -> Vec<Category> {
        Category::ASSIGNABLE
            .iter()
            .copied()
            .filter(|c| self.is_active(*c))
            .collect()
    }

    /// Parameters of a market's active category
    fn get_category_param(&self, market: MarketId) -> Result<CategoryParam> {
        let category = self.category_of(market);
        if category == Category::None || !self.is_active(category) {
            return Err(Error::NoCategoryFound(market));
        }
        Ok(self.category_param(category).unwrap_or(CategoryParam {
            category,
            ..CategoryParam::default()
        }))
    }
}

impl Clone for Box<dyn CategoryStore> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Parallel arrays must match in length and not both be empty
pub(crate) fn check_parallel_lengths(markets: usize, values: usize) -> Result<()> {
    if markets != values || markets == 0 {
        return Err(Error::InvalidArrayLength { markets, values });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ratio;

    fn stores() -> Vec<Box<dyn CategoryStore>> {
        vec![
            CategoryBackend::Bitmap.build(),
            CategoryBackend::Mapping.build(),
        ]
    }

    fn stable_param() -> CategoryParam {
        CategoryParam {
            category: Category::Stable,
            margin_ratio_override: Ratio::from_percent(95),
            liquidation_reward_override: Ratio::from_percent(5),
        }
    }

    #[test]
    fn test_batched_assignment_lengths() {
        for mut store in stores() {
            assert!(matches!(
                store.set_categories(&[MarketId(1), MarketId(2)], &[Category::Eth]),
                Err(Error::InvalidArrayLength { markets: 2, values: 1 })
            ));
            assert!(matches!(
                store.set_categories(&[], &[]),
                Err(Error::InvalidArrayLength { markets: 0, values: 0 })
            ));

            store
                .set_categories(&[MarketId(1), MarketId(2)], &[Category::Eth, Category::Btc])
                .unwrap();
            assert_eq!(store.category_of(MarketId(1)), Category::Eth);
            assert_eq!(store.category_of(MarketId(2)), Category::Btc);
        }
    }

    #[test]
    fn test_mask_requires_single_active_category() {
        for mut store in stores() {
            store.set_category(MarketId(1), Category::Stable).unwrap();
            store.set_category(MarketId(2), Category::Stable).unwrap();
            store.set_category(MarketId(3), Category::Eth).unwrap();
            store.set_active_categories(&[Category::Stable, Category::Eth]);

            assert_eq!(
                store.category_mask_of(&[MarketId(1)]).unwrap(),
                Category::Stable.mask()
            );
            assert_eq!(
                store.category_mask_of(&[MarketId(1), MarketId(2)]).unwrap(),
                Category::Stable.mask()
            );
            assert!(store
                .category_mask_of(&[MarketId(1), MarketId(3)])
                .unwrap()
                .is_none());
            assert!(store
                .category_mask_of(&[MarketId(1), MarketId(9)])
                .unwrap()
                .is_none());
            assert!(matches!(
                store.category_mask_of(&[]),
                Err(Error::InvalidInputLength)
            ));
        }
    }

    #[test]
    fn test_inactive_category_unreachable() {
        for mut store in stores() {
            store.set_category(MarketId(1), Category::Stable).unwrap();
            store.set_category_param(stable_param());

            assert!(store.category_mask_of(&[MarketId(1)]).unwrap().is_none());
            assert!(matches!(
                store.get_category_param(MarketId(1)),
                Err(Error::NoCategoryFound(MarketId(1)))
            ));

            store.set_active_categories(&[Category::Stable]);
            assert_eq!(store.get_category_param(MarketId(1)).unwrap(), stable_param());

            store.set_active_categories(&[Category::Eth]);
            assert!(store.get_category_param(MarketId(1)).is_err());
            assert_eq!(store.active_categories(), vec![Category::Eth]);
        }
    }

    #[test]
    fn test_zero_params_accepted_verbatim() {
        for mut store in stores() {
            let zero = CategoryParam {
                category: Category::Btc,
                ..CategoryParam::default()
            };
            store.set_category_param(zero);
            store.set_category(MarketId(4), Category::Btc).unwrap();
            store.set_active_categories(&[Category::Btc]);

            let param = store.get_category_param(MarketId(4)).unwrap();
            assert!(param.margin_ratio_override.is_zero());
            assert!(param.liquidation_reward_override.is_zero());
        }
    }

    #[test]
    fn test_uncategorized_market_has_no_param() {
        for mut store in stores() {
            store.set_active_categories(&[Category::Stable]);
            assert!(matches!(
                store.get_category_param(MarketId(5)),
                Err(Error::NoCategoryFound(MarketId(5)))
            ));
        }
    }

    #[test]
    fn test_reassignment_and_clearing() {
        for mut store in stores() {
            store.set_category(MarketId(1), Category::Stable).unwrap();
            store.set_category(MarketId(1), Category::Eth).unwrap();
            store.set_active_categories(&[Category::Stable, Category::Eth]);
            assert_eq!(store.category_of(MarketId(1)), Category::Eth);
            assert_eq!(
                store.category_mask_of(&[MarketId(1)]).unwrap(),
                Category::Eth.mask()
            );

            store.set_category(MarketId(1), Category::None).unwrap();
            assert_eq!(store.category_of(MarketId(1)), Category::None);
            assert!(store.category_mask_of(&[MarketId(1)]).unwrap().is_none());
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("bitmap".parse::<CategoryBackend>().unwrap(), CategoryBackend::Bitmap);
        assert_eq!("Mapping".parse::<CategoryBackend>().unwrap(), CategoryBackend::Mapping);
        assert!("redis".parse::<CategoryBackend>().is_err());
    }
}
