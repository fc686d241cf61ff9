//! Hash-map category storage

use super::CategoryStore;
use crate::{Category, CategoryMask, CategoryParam, Error, MarketId, Result};
use std::collections::{HashMap, HashSet};

/// Category store backed by hash maps
#[derive(Debug, Clone, Default)]
pub struct MappingCategoryStore {
    // Map: market -> category
    assignments: HashMap<MarketId, Category>,
    // Map: category -> overrides
    params: HashMap<Category, CategoryParam>,
    active: HashSet<Category>,
}

impl MappingCategoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of categorized markets
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }
}

impl CategoryStore for MappingCategoryStore {
    fn set_category(&mut self, market: MarketId, category: Category) -> Result<()> {
        if category == Category::None {
            self.assignments.remove(&market);
        } else {
            self.assignments.insert(market, category);
        }
        Ok(())
    }

    fn set_category_param(&mut self, param: CategoryParam) {
        self.params.insert(param.category, param);
    }

    fn set_active_categories(&mut self, categories: &[Category]) {
        self.active = categories
            .iter()
            .copied()
            .filter(|c| *c != Category::None)
            .collect();
    }

    fn category_of(&self, market: MarketId) -> Category {
        self.assignments
            .get(&market)
            .copied()
            .unwrap_or(Category::None)
    }

    fn is_active(&self, category: Category) -> bool {
        self.active.contains(&category)
    }

    fn category_param(&self, category: Category) -> Option<CategoryParam> {
        self.params.get(&category).copied()
    }

    fn category_mask_of(&self, markets: &[MarketId]) -> Result<CategoryMask> {
        let (first, rest) = markets.split_first().ok_or(Error::InvalidInputLength)?;

        let category = self.category_of(*first);
        if category == Category::None || !self.is_active(category) {
            return Ok(CategoryMask::NONE);
        }
        if rest.iter().any(|m| self.category_of(*m) != category) {
            return Ok(CategoryMask::NONE);
        }
        Ok(category.mask())
    }

    fn clone_box(&self) -> Box<dyn CategoryStore> {
        Box::new(self.clone())
    }
}
