//! Core types for the risk override engine

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market identifier assigned by the margin accounting core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketId(pub u32);

impl MarketId {
    /// Raw identifier
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl From<u32> for MarketId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account owner (20-byte address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Owner([u8; 20]);

impl Owner {
    /// The null identity
    pub const NULL: Owner = Owner([0u8; 20]);

    /// Create owner from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check for the null identity
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Owner {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| Error::Config(format!("Invalid owner {}: {}", s, e)))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::Config(format!("Owner {} is not 20 bytes", s)))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Owner {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Owner> for String {
    fn from(owner: Owner) -> Self {
        owner.to_string()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Margin account: owner plus sub-account number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId {
    /// Owning identity
    pub owner: Owner,

    /// Sub-account number
    pub number: u64,
}

impl AccountId {
    /// Create new account identifier
    pub fn new(owner: Owner, number: u64) -> Self {
        Self { owner, number }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.number)
    }
}

/// Non-negative fixed-point fraction (1 = 100%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Ratio(Decimal);

impl Ratio {
    /// Zero ratio, meaning "no override"
    pub const ZERO: Ratio = Ratio(Decimal::ZERO);

    /// Create ratio, rejecting negative values
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            return Err(Error::NegativeRatio(value));
        }
        Ok(Self(value))
    }

    /// Ratio from whole percent (e.g. 95 -> 0.95)
    pub fn from_percent(percent: u32) -> Self {
        Self(Decimal::new(i64::from(percent), 2))
    }

    /// Underlying decimal
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Ratio {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Ratio::new(value)
    }
}

impl From<Ratio> for Decimal {
    fn from(ratio: Ratio) -> Self {
        ratio.0
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

/// Category of correlated assets (e-mode group)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Uncategorized
    #[default]
    None,
    /// Native chain asset and derivatives
    Bera,
    /// Bitcoin and wrapped bitcoin
    Btc,
    /// Ether and liquid staking tokens
    Eth,
    /// Stablecoins
    Stable,
}

impl Category {
    /// All categories that can carry parameters
    pub const ASSIGNABLE: [Category; 4] = [
        Category::Bera,
        Category::Btc,
        Category::Eth,
        Category::Stable,
    ];

    /// Bit for this category (NONE has no bit)
    pub fn mask(&self) -> CategoryMask {
        match self {
            Category::None => CategoryMask::NONE,
            Category::Bera => CategoryMask(1 << 0),
            Category::Btc => CategoryMask(1 << 1),
            Category::Eth => CategoryMask(1 << 2),
            Category::Stable => CategoryMask(1 << 3),
        }
    }

    /// Slot in fixed-size per-category tables
    pub(crate) fn index(&self) -> usize {
        match self {
            Category::None => 0,
            Category::Bera => 1,
            Category::Btc => 2,
            Category::Eth => 3,
            Category::Stable => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::None => "NONE",
            Category::Bera => "BERA",
            Category::Btc => "BTC",
            Category::Eth => "ETH",
            Category::Stable => "STABLE",
        };
        write!(f, "{}", name)
    }
}

/// Bitmask of categories; zero means "no shared category"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMask(pub u8);

impl CategoryMask {
    /// Empty mask
    pub const NONE: CategoryMask = CategoryMask(0);

    /// Raw bits
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Check if empty
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Check if every bit of `category` is set
    pub fn includes(&self, category: Category) -> bool {
        let bit = category.mask().0;
        bit != 0 && self.0 & bit == bit
    }

    /// Mask of a list of categories
    pub fn from_categories(categories: &[Category]) -> Self {
        Self(categories.iter().fold(0, |acc, c| acc | c.mask().0))
    }

    /// Category when exactly one bit is set
    pub fn category(&self) -> Option<Category> {
        Category::ASSIGNABLE
            .iter()
            .copied()
            .find(|c| c.mask() == *self)
    }
}

/// Per-market risk feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFeature {
    /// No feature
    #[default]
    None,
    /// Market may only be borrowed
    BorrowOnly,
    /// Market is the sole collateral and debt is limited to configured tiers
    SingleCollateralWithStrictDebt,
}

impl fmt::Display for RiskFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskFeature::None => "NONE",
            RiskFeature::BorrowOnly => "BORROW_ONLY",
            RiskFeature::SingleCollateralWithStrictDebt => "SINGLE_COLLATERAL_WITH_STRICT_DEBT",
        };
        write!(f, "{}", name)
    }
}

/// Override parameters owned by a category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryParam {
    /// Category these parameters belong to
    pub category: Category,

    /// Margin ratio override
    pub margin_ratio_override: Ratio,

    /// Liquidation reward override
    pub liquidation_reward_override: Ratio,
}

/// Effective overrides for one account; zero means system defaults apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskOverride {
    /// Margin ratio override
    pub margin_ratio_override: Ratio,

    /// Liquidation reward override
    pub liquidation_reward_override: Ratio,
}

impl RiskOverride {
    /// No override
    pub const NONE: RiskOverride = RiskOverride {
        margin_ratio_override: Ratio::ZERO,
        liquidation_reward_override: Ratio::ZERO,
    };

    /// Create override
    pub fn new(margin_ratio_override: Ratio, liquidation_reward_override: Ratio) -> Self {
        Self {
            margin_ratio_override,
            liquidation_reward_override,
        }
    }

    /// Check if system defaults apply
    pub fn is_none(&self) -> bool {
        self.margin_ratio_override.is_zero() && self.liquidation_reward_override.is_zero()
    }
}

impl From<CategoryParam> for RiskOverride {
    fn from(param: CategoryParam) -> Self {
        Self::new(param.margin_ratio_override, param.liquidation_reward_override)
    }
}
