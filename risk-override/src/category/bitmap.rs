//! Packed category storage

use super::{check_parallel_lengths, CategoryStore};
use crate::bitset::MarketBitset;
use crate::{Category, CategoryMask, CategoryParam, Error, MarketId, Result};

const SLOTS: usize = 5;

/// Category store backed by one [`MarketBitset`] per category
#[derive(Debug, Clone, Default)]
pub struct BitmapCategoryStore {
    members: [MarketBitset; SLOTS],
    params: [Option<CategoryParam>; SLOTS],
    active: CategoryMask,
}

impl BitmapCategoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Member set of a category
    pub fn members(&self, category: Category) -> &MarketBitset {
        &self.members[category.index()]
    }
}

fn assign(members: &mut [MarketBitset; SLOTS], market: MarketId, category: Category) -> Result<()> {
    if category != Category::None {
        // Reject before touching existing membership
        members[category.index()].insert(market)?;
    }
    for other in Category::ASSIGNABLE {
        if other != category {
            members[other.index()].remove(market);
        }
    }
    Ok(())
}

impl CategoryStore for BitmapCategoryStore {
    fn set_category(&mut self, market: MarketId, category: Category) -> Result<()> {
        assign(&mut self.members, market, category)
    }

    fn set_categories(&mut self, markets: &[MarketId], categories: &[Category]) -> Result<()> {
        check_parallel_lengths(markets.len(), categories.len())?;
        // Stage on a copy so a rejected id leaves every assignment untouched
        let mut staged = self.members;
        for (&market, &category) in markets.iter().zip(categories) {
            assign(&mut staged, market, category)?;
        }
        self.members = staged;
        Ok(())
    }

    fn set_category_param(&mut self, param: CategoryParam) {
        self.params[param.category.index()] = Some(param);
    }

    fn set_active_categories(&mut self, categories: &[Category]) {
        self.active = CategoryMask::from_categories(categories);
    }

    fn category_of(&self, market: MarketId) -> Category {
        Category::ASSIGNABLE
            .iter()
            .copied()
            .find(|c| self.members[c.index()].contains(market))
            .unwrap_or(Category::None)
    }

    fn is_active(&self, category: Category) -> bool {
        self.active.includes(category)
    }

    fn category_param(&self, category: Category) -> Option<CategoryParam> {
        self.params[category.index()]
    }

    fn category_mask_of(&self, markets: &[MarketId]) -> Result<CategoryMask> {
        if markets.is_empty() {
            return Err(Error::InvalidInputLength);
        }
        // Markets beyond capacity can never be assigned, so they are uncategorized
        let Ok(wanted) = MarketBitset::mask_of(markets) else {
            return Ok(CategoryMask::NONE);
        };
        let shared = Category::ASSIGNABLE
            .iter()
            .copied()
            .filter(|c| self.is_active(*c))
            .find(|c| wanted.is_subset_of(&self.members[c.index()]));

        Ok(shared.map(|c| c.mask()).unwrap_or(CategoryMask::NONE))
    }

    fn clone_box(&self) -> Box<dyn CategoryStore> {
        Box::new(self.clone())
    }
}
