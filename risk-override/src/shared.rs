//! Thread-safe engine handle
//!
//! Readers hold a read lock for the duration of one resolution, so they never
//! observe a configuration write half-applied. [`SharedRiskOverrideEngine::update`]
//! stages a batch of writes on a copy and publishes it only if every write
//! succeeded.

use crate::engine::RiskOverrideEngine;
use crate::ledger::AccountLedger;
use crate::{AccountId, Result, RiskOverride};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, cloneable engine handle
#[derive(Debug, Clone)]
pub struct SharedRiskOverrideEngine {
    inner: Arc<RwLock<RiskOverrideEngine>>,
}

impl SharedRiskOverrideEngine {
    /// Wrap an engine
    pub fn new(engine: RiskOverrideEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Resolve against the committed configuration
    pub fn resolve<L>(&self, ledger: &L, account: &AccountId) -> Result<RiskOverride>
    where
        L: AccountLedger + ?Sized,
    {
        self.inner.read().resolve(ledger, account)
    }

    /// Apply a batch of configuration writes atomically
    ///
    /// The closure runs against a copy of the engine. On error nothing is
    /// published and the error is returned.
    pub fn update<F, T>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut RiskOverrideEngine) -> Result<T>,
    {
        let mut guard = self.inner.write();
        let mut staged = guard.clone();
        let output = apply(&mut staged)?;
        *guard = staged;
        Ok(output)
    }

    /// Run a read-only closure against the committed configuration
    pub fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&RiskOverrideEngine) -> T,
    {
        f(&self.inner.read())
    }
}
