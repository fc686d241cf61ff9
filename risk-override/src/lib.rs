//! Account Risk Override Engine
//!
//! Computes the effective margin ratio and liquidation reward for a margin
//! account from what it holds and what the operator has configured.
//!
//! # Configuration tables
//!
//! - **Categories**: market → category assignments with per-category
//!   overrides and an active list (bitmap or hash-map backend)
//! - **Borrow-only registry**: markets that may never back debt
//! - **Risk features**: per-market `BORROW_ONLY` or
//!   `SINGLE_COLLATERAL_WITH_STRICT_DEBT` with ordered debt tiers
//!
//! # Example
//!
//! ```
//! use risk_override::{
//!     AccountId, Category, EngineConfig, InMemoryLedger, MarketId, Owner, Ratio,
//!     RiskOverrideEngine,
//! };
//! use rust_decimal::Decimal;
//!
//! let honey = MarketId(1);
//! let usdc = MarketId(2);
//!
//! let mut engine = RiskOverrideEngine::new(EngineConfig::default());
//! engine.set_categories(&[honey, usdc], &[Category::Stable, Category::Stable])?;
//! engine.set_category_param(Category::Stable, Ratio::from_percent(95), Ratio::from_percent(5));
//! engine.set_active_categories(&[Category::Stable]);
//!
//! let account = AccountId::new(Owner::from_bytes([1; 20]), 0);
//! let mut ledger = InMemoryLedger::new();
//! ledger.set_balance(account, honey, Decimal::from(1000));
//! ledger.set_balance(account, usdc, Decimal::from(-500));
//!
//! let result = engine.resolve(&ledger, &account)?;
//! assert_eq!(result.margin_ratio_override, Ratio::from_percent(95));
//! # Ok::<(), risk_override::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod bitset;
pub mod borrow_only;
pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod limits;
pub mod shared;
pub mod snapshot;
pub mod strict_debt;
pub mod types;

// Re-exports
pub use bitset::{MarketBitset, MAX_MARKETS};
pub use category::{CategoryBackend, CategoryStore};
pub use config::EngineConfig;
pub use engine::RiskOverrideEngine;
pub use error::{Error, Result};
pub use ledger::{AccountLedger, AccountPosition, InMemoryLedger, MarketBalance};
pub use limits::RatioLimits;
pub use shared::SharedRiskOverrideEngine;
pub use snapshot::RiskConfigSnapshot;
pub use strict_debt::StrictDebtTier;
pub use types::*;
