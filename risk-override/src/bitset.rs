//! Fixed-width packed set of market identifiers
//!
//! Every set has room for [`MAX_MARKETS`] markets, packed into 64-bit words.
//! Membership queries are total: an id beyond capacity is never a member.
//! Construction from an id beyond capacity is rejected with
//! [`Error::MarketOutOfRange`].

use crate::{Error, MarketId, Result};
use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;
const WORDS: usize = 4;

/// Number of market ids a bitset can hold
pub const MAX_MARKETS: u32 = (WORD_BITS * WORDS) as u32;

/// Packed market set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketBitset {
    words: [u64; WORDS],
}

impl MarketBitset {
    /// Empty set
    pub const EMPTY: MarketBitset = MarketBitset { words: [0; WORDS] };

    /// Build a set from a list of ids
    pub fn mask_of(ids: &[MarketId]) -> Result<Self> {
        let mut set = Self::EMPTY;
        for &id in ids {
            set.insert(id)?;
        }
        Ok(set)
    }

    fn slot(id: MarketId) -> Option<(usize, u64)> {
        let raw = id.get() as usize;
        if raw >= MAX_MARKETS as usize {
            return None;
        }
        Some((raw / WORD_BITS, 1u64 << (raw % WORD_BITS)))
    }

    /// Add a market
    pub fn insert(&mut self, id: MarketId) -> Result<()> {
        let (word, bit) = Self::slot(id).ok_or(Error::MarketOutOfRange(id))?;
        self.words[word] |= bit;
        Ok(())
    }

    /// Remove a market
    pub fn remove(&mut self, id: MarketId) {
        if let Some((word, bit)) = Self::slot(id) {
            self.words[word] &= !bit;
        }
    }

    /// Membership test
    pub fn contains(&self, id: MarketId) -> bool {
        match Self::slot(id) {
            Some((word, bit)) => self.words[word] & bit != 0,
            None => false,
        }
    }

    /// Check every id is a member
    pub fn contains_all(&self, ids: &[MarketId]) -> bool {
        ids.iter().all(|&id| self.contains(id))
    }

    /// Set union
    pub fn union(&self, other: &MarketBitset) -> MarketBitset {
        let mut words = self.words;
        for (word, theirs) in words.iter_mut().zip(other.words.iter()) {
            *word |= theirs;
        }
        MarketBitset { words }
    }

    /// Check `self ⊆ other`
    pub fn is_subset_of(&self, other: &MarketBitset) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(mine, theirs)| mine & !theirs == 0)
    }

    /// Index of the first set in `sets` containing `self`
    ///
    /// Order is preserved: the first match wins even if a later set is a
    /// tighter fit.
    pub fn is_subset_of_any<'a, I>(&self, sets: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a MarketBitset>,
    {
        sets.into_iter().position(|set| self.is_subset_of(set))
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = MarketId> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| MarketId((index * WORD_BITS + bit) as u32))
        })
    }
}
