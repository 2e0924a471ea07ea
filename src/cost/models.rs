//! Data models for cost estimation
//!
//! Prices per tier, money amounts that may be unavailable, and the reports
//! produced by the cost engine.

use crate::analysis::Tier;
use crate::utils::format::format_currency;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Price coefficients of one tier in one region (US dollars)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierPrices {
    pub storage_cost_per_gb_month: f64,
    pub write_ops_cost_per_10k: f64,
    pub read_ops_cost_per_10k: f64,
    pub data_retrieval_cost_per_gb: f64,
    pub data_write_cost_per_gb: f64,
}

impl TierPrices {
    pub const fn new(
        storage_cost_per_gb_month: f64,
        write_ops_cost_per_10k: f64,
        read_ops_cost_per_10k: f64,
        data_retrieval_cost_per_gb: f64,
        data_write_cost_per_gb: f64,
    ) -> Self {
        Self {
            storage_cost_per_gb_month,
            write_ops_cost_per_10k,
            read_ops_cost_per_10k,
            data_retrieval_cost_per_gb,
            data_write_cost_per_gb,
        }
    }

    /// All coefficients are finite and non-negative
    pub fn is_valid(&self) -> bool {
        [
            self.storage_cost_per_gb_month,
            self.write_ops_cost_per_10k,
            self.read_ops_cost_per_10k,
            self.data_retrieval_cost_per_gb,
            self.data_write_cost_per_gb,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Regional price table. A tier without an entry is unsupported or unpriced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    region: String,
    tiers: BTreeMap<Tier, TierPrices>,
}

impl PriceTable {
    pub fn new<S: Into<String>>(region: S) -> Self {
        Self {
            region: region.into(),
            tiers: BTreeMap::new(),
        }
    }

    pub fn with_tier(mut self, tier: Tier, prices: TierPrices) -> Self {
        self.tiers.insert(tier, prices);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn get(&self, tier: Tier) -> Option<&TierPrices> {
        self.tiers.get(&tier)
    }

    pub fn is_priced(&self, tier: Tier) -> bool {
        self.tiers.contains_key(&tier)
    }
}

/// A money amount that is either known or cannot be computed for lack of prices.
///
/// Arithmetic involving an unavailable amount is unavailable. Values keep
/// full precision; rounding to cents only happens when displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
    Known(f64),
    Unavailable,
}

impl Amount {
    pub const ZERO: Amount = Amount::Known(0.0);

    pub fn value(&self) -> Option<f64> {
        match self {
            Amount::Known(v) => Some(*v),
            Amount::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Amount::Known(_))
    }
}

impl From<Option<f64>> for Amount {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Amount::Unavailable, Amount::Known)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        match (self, rhs) {
            (Amount::Known(a), Amount::Known(b)) => Amount::Known(a + b),
            _ => Amount::Unavailable,
        }
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        match (self, rhs) {
            (Amount::Known(a), Amount::Known(b)) => Amount::Known(a - b),
            _ => Amount::Unavailable,
        }
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Known(v) => f.write_str(&format_currency(*v)),
            Amount::Unavailable => f.write_str("--"),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Known(v) => serializer.serialize_f64(*v),
            Amount::Unavailable => serializer.serialize_none(),
        }
    }
}

/// Outcome of a scenario: either estimated or impossible for lack of prices
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario<T> {
    Available(T),
    Unavailable { tier: Tier },
}

impl<T> Scenario<T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Scenario::Available(value) => Some(value),
            Scenario::Unavailable { .. } => None,
        }
    }
}

/// Monthly costs of the objects held in one tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCostLine {
    pub tier: Tier,
    pub count: u64,
    pub total_size_bytes: u64,
    pub storage_cost: Amount,
    pub read_cost: Amount,
}

impl TierCostLine {
    pub fn empty(tier: Tier) -> Self {
        Self {
            tier,
            count: 0,
            total_size_bytes: 0,
            storage_cost: Amount::ZERO,
            read_cost: Amount::ZERO,
        }
    }

    pub fn total_cost(&self) -> Amount {
        self.storage_cost + self.read_cost
    }
}

/// Sum of several cost lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostTotals {
    pub count: u64,
    pub total_size_bytes: u64,
    pub storage_cost: Amount,
    pub read_cost: Amount,
}

impl CostTotals {
    pub fn of(lines: &[TierCostLine]) -> Self {
        Self {
            count: lines.iter().map(|l| l.count).sum(),
            total_size_bytes: lines.iter().map(|l| l.total_size_bytes).sum(),
            storage_cost: lines.iter().map(|l| l.storage_cost).sum(),
            read_cost: lines.iter().map(|l| l.read_cost).sum(),
        }
    }

    pub fn total_cost(&self) -> Amount {
        self.storage_cost + self.read_cost
    }
}

/// Costs paid once when objects change tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneTimeCost {
    pub tier_change: Amount,
    pub data_transfer: Amount,
}

impl OneTimeCost {
    pub fn total(&self) -> Amount {
        self.tier_change + self.data_transfer
    }
}

/// Monthly savings of a migration (negative means it costs more)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Savings {
    pub storage: Amount,
    pub read: Amount,
    pub net_monthly: Amount,
}

/// Cost of moving the matching objects of `source_tiers` into `target_tier`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub region: String,
    pub source_tiers: Vec<Tier>,
    pub target_tier: Tier,
    pub read_percent_per_month: f64,
    pub current: Vec<TierCostLine>,
    pub current_totals: CostTotals,
    pub after_migration: Vec<TierCostLine>,
    pub after_migration_totals: CostTotals,
    pub one_time: OneTimeCost,
    pub savings: Savings,
    /// Tiers involved in the scenario that have no prices in the region
    pub missing_prices: Vec<Tier>,
}

impl CostReport {
    /// Every figure of the report could be computed
    pub fn is_complete(&self) -> bool {
        self.missing_prices.is_empty()
    }

    pub fn current_line(&self, tier: Tier) -> Option<&TierCostLine> {
        self.current.iter().find(|l| l.tier == tier)
    }

    pub fn after_migration_line(&self, tier: Tier) -> Option<&TierCostLine> {
        self.after_migration.iter().find(|l| l.tier == tier)
    }
}

pub type ScenarioEstimate = Scenario<CostReport>;

/// Cost of uploading objects into a tier and keeping them there
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadEstimate {
    pub tier: Tier,
    pub count: u64,
    pub total_size_bytes: u64,
    pub upload_cost: Amount,
    /// Extra one-time cost of moving uploaded objects into the tier (Archive only)
    pub tier_change_cost: Amount,
    pub storage_cost: Amount,
    pub read_cost: Amount,
}

impl UploadEstimate {
    pub fn one_time_cost(&self) -> Amount {
        self.upload_cost + self.tier_change_cost
    }

    pub fn monthly_cost(&self) -> Amount {
        self.storage_cost + self.read_cost
    }
}

pub type UploadScenario = Scenario<UploadEstimate>;
