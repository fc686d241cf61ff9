//! Registry of markets that may be borrowed but never pledged

use crate::bitset::MarketBitset;
use crate::category::check_parallel_lengths;
use crate::{MarketId, Result};

/// Borrow-only flags, one bit per market
#[derive(Debug, Clone, Default)]
pub struct BorrowOnlyRegistry {
    flags: MarketBitset,
}

impl BorrowOnlyRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear a market's flag
    pub fn set_borrow_only(&mut self, market: MarketId, borrow_only: bool) -> Result<()> {
        if borrow_only {
            self.flags.insert(market)?;
        } else {
            self.flags.remove(market);
        }
        Ok(())
    }

    /// Batched update over parallel slices
    ///
    /// All ids are checked before any flag changes.
    pub fn set_borrow_only_batch(&mut self, markets: &[MarketId], flags: &[bool]) -> Result<()> {
        check_parallel_lengths(markets.len(), flags.len())?;
        let mut staged = self.flags;
        for (&market, &flag) in markets.iter().zip(flags) {
            if flag {
                staged.insert(market)?;
            } else {
                staged.remove(market);
            }
        }
        self.flags = staged;
        Ok(())
    }

    /// Check a market's flag
    pub fn is_borrow_only(&self, market: MarketId) -> bool {
        self.flags.contains(market)
    }

    /// Flagged markets in ascending order
    pub fn markets(&self) -> Vec<MarketId> {
        self.flags.iter().collect()
    }
}
