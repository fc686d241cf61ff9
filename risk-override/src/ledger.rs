//! Interface to the margin accounting core
//!
//! The engine never stores balances. Every resolution reads them fresh
//! through [`AccountLedger`].

use crate::{AccountId, MarketId, Owner};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Signed balance of one market (positive = collateral, negative = debt)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBalance {
    /// Market
    pub market: MarketId,

    /// Signed par amount
    pub par: Decimal,
}

impl MarketBalance {
    /// Create balance
    pub fn new(market: MarketId, par: Decimal) -> Self {
        Self { market, par }
    }
}

/// Read access to the accounting core
pub trait AccountLedger {
    /// Nonzero balances of an account, `None` if the account is unknown
    fn account_balances(&self, account: &AccountId) -> Option<Vec<MarketBalance>>;

    /// Protocol administrative accounts governed by base parameters only
    fn is_privileged_account(&self, owner: &Owner) -> bool;
}

/// Markets an account uses, split by side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPosition {
    /// Markets with a positive balance, ascending
    pub collateral_markets: Vec<MarketId>,

    /// Markets with a negative balance, ascending
    pub debt_markets: Vec<MarketId>,
}

impl AccountPosition {
    /// Partition balances; zero balances are ignored
    pub fn from_balances(balances: &[MarketBalance]) -> Self {
        let mut position = Self::default();
        for balance in balances {
            if balance.par > Decimal::ZERO {
                position.collateral_markets.push(balance.market);
            } else if balance.par < Decimal::ZERO {
                position.debt_markets.push(balance.market);
            }
        }
        position.collateral_markets.sort_unstable();
        position.collateral_markets.dedup();
        position.debt_markets.sort_unstable();
        position.debt_markets.dedup();
        position
    }

    /// Check if the account uses no market
    pub fn is_empty(&self) -> bool {
        self.collateral_markets.is_empty() && self.debt_markets.is_empty()
    }

    /// Collateral ∪ debt, ascending
    pub fn used_markets(&self) -> Vec<MarketId> {
        let mut markets: Vec<MarketId> = self
            .collateral_markets
            .iter()
            .chain(self.debt_markets.iter())
            .copied()
            .collect();
        markets.sort_unstable();
        markets.dedup();
        markets
    }
}

/// In-memory accounting core
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    // Map: account -> (market -> par)
    accounts: HashMap<AccountId, BTreeMap<MarketId, Decimal>>,
    privileged: HashSet<Owner>,
}

impl InMemoryLedger {
    /// Create empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with no balances
    pub fn open_account(&mut self, account: AccountId) {
        self.accounts.entry(account).or_default();
    }

    /// Set a market balance, opening the account if needed
    pub fn set_balance(&mut self, account: AccountId, market: MarketId, par: Decimal) {
        let balances = self.accounts.entry(account).or_default();
        if par.is_zero() {
            balances.remove(&market);
        } else {
            balances.insert(market, par);
        }
    }

    /// Mark an owner as privileged
    pub fn add_privileged(&mut self, owner: Owner) {
        self.privileged.insert(owner);
    }
}

impl AccountLedger for InMemoryLedger {
    fn account_balances(&self, account: &AccountId) -> Option<Vec<MarketBalance>> {
        self.accounts.get(account).map(|balances| {
            balances
                .iter()
                .map(|(market, par)| MarketBalance::new(*market, *par))
                .collect()
        })
    }

    fn is_privileged_account(&self, owner: &Owner) -> bool {
        self.privileged.contains(owner)
    }
}
