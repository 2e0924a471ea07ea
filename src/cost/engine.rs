//! Tier migration cost model
//!
//! All figures are US dollars per month unless noted. Sizes are converted to
//! GB with 1 GB = 2^30 bytes. Nothing is rounded here.

use crate::analysis::{Tier, TierBuckets, Transition};
use crate::cost::models::{
    Amount, CostReport, CostTotals, OneTimeCost, PriceTable, Savings, Scenario,
    ScenarioEstimate, TierCostLine, UploadEstimate, UploadScenario,
};
use crate::error::{BlobTierError, Result};
use tracing::debug;

pub const BYTES_PER_GB: f64 = 1_073_741_824.0;
const OPS_UNIT: f64 = 10_000.0;

fn gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}

/// Monthly read volume of `count` objects totalling `size` bytes when
/// `read_percent` of the data is read each month.
///
/// Returns `(read_transactions, read_bytes)`. Empty inputs read nothing.
pub fn read_volume(count: u64, size: u64, read_percent: f64) -> (f64, f64) {
    if count == 0 || size == 0 {
        return (0.0, 0.0);
    }
    let read_bytes = size as f64 * read_percent / 100.0;
    let average_size = size as f64 / count as f64;
    (read_bytes / average_size, read_bytes)
}

fn validate_read_percent(read_percent: f64) -> Result<()> {
    if !read_percent.is_finite() || read_percent < 0.0 {
        return Err(BlobTierError::invalid_argument(format!(
            "Read percentage must be a non-negative number, got {read_percent}"
        )));
    }
    Ok(())
}

/// Cost calculator over one regional price table
#[derive(Debug, Clone, Copy)]
pub struct CostEngine<'a> {
    prices: &'a PriceTable,
}

impl<'a> CostEngine<'a> {
    pub fn new(prices: &'a PriceTable) -> Self {
        Self { prices }
    }

    pub fn prices(&self) -> &PriceTable {
        self.prices
    }

    fn storage_cost(&self, tier: Tier, size: u64) -> Amount {
        self.prices
            .get(tier)
            .map(|p| gb(size) * p.storage_cost_per_gb_month)
            .into()
    }

    /// Cost of `read_transactions` reads totalling `read_bytes` from `tier`.
    ///
    /// Archive reads pay retrieval and read operations in Archive, a read
    /// operation in Hot (free when Hot is unpriced) and a write operation in
    /// Archive for the rehydration.
    pub fn read_cost(&self, tier: Tier, read_transactions: f64, read_bytes: f64) -> Amount {
        let Some(prices) = self.prices.get(tier) else {
            return Amount::Unavailable;
        };
        let operations = read_transactions / OPS_UNIT;
        let retrieval = prices.data_retrieval_cost_per_gb * read_bytes / BYTES_PER_GB;

        let cost = match tier {
            Tier::Hot | Tier::Cool => prices.read_ops_cost_per_10k * operations + retrieval,
            Tier::Archive => {
                let hot_read = self
                    .prices
                    .get(Tier::Hot)
                    .map_or(0.0, |hot| hot.read_ops_cost_per_10k);
                retrieval
                    + prices.read_ops_cost_per_10k * operations
                    + hot_read * operations
                    + prices.write_ops_cost_per_10k * operations
            }
        };
        Amount::Known(cost)
    }

    fn current_line(&self, tier: Tier, count: u64, size: u64, read_percent: f64) -> TierCostLine {
        let (transactions, bytes) = read_volume(count, size, read_percent);
        TierCostLine {
            tier,
            count,
            total_size_bytes: size,
            storage_cost: self.storage_cost(tier, size),
            read_cost: self.read_cost(tier, transactions, bytes),
        }
    }

    /// Estimate moving the matching objects of `source_tiers` into `target`.
    ///
    /// The target tier's own matching objects are included in the current
    /// and post-migration figures but pay no one-time cost.
    pub fn estimate(
        &self,
        matching: &TierBuckets,
        source_tiers: &[Tier],
        target: Tier,
        read_percent: f64,
    ) -> Result<ScenarioEstimate> {
        validate_read_percent(read_percent)?;
        if source_tiers.contains(&target) {
            return Err(BlobTierError::invalid_argument(format!(
                "Target tier {target} cannot also be a source tier"
            )));
        }
        for (i, tier) in source_tiers.iter().enumerate() {
            if source_tiers[..i].contains(tier) {
                return Err(BlobTierError::invalid_argument(format!(
                    "Source tier {tier} is listed more than once"
                )));
            }
        }

        let Some(target_prices) = self.prices.get(target) else {
            debug!("No {} prices in {}", target, self.prices.region());
            return Ok(Scenario::Unavailable { tier: target });
        };

        let considered: Vec<Tier> = source_tiers
            .iter()
            .copied()
            .chain(std::iter::once(target))
            .collect();

        let mut current = Vec::with_capacity(considered.len());
        let mut missing_prices = Vec::new();
        let mut tier_change = Amount::ZERO;
        let mut data_transfer = Amount::ZERO;
        let mut combined_count = 0u64;
        let mut combined_size = 0u64;

        for &tier in &considered {
            let stats = matching.get(tier);
            current.push(self.current_line(tier, stats.count, stats.total_size_bytes, read_percent));
            combined_count += stats.count;
            combined_size += stats.total_size_bytes;

            let source_prices = self.prices.get(tier);
            if source_prices.is_none() {
                missing_prices.push(tier);
            }

            let count = stats.count as f64;
            let size_gb = gb(stats.total_size_bytes);
            match tier.transition_to(target) {
                Some(Transition::Cooling) => {
                    tier_change += Amount::Known(count * target_prices.write_ops_cost_per_10k / OPS_UNIT);
                    data_transfer += Amount::Known(size_gb * target_prices.data_write_cost_per_gb);
                }
                Some(Transition::Warming) => {
                    tier_change += source_prices
                        .map(|p| count * p.read_ops_cost_per_10k / OPS_UNIT)
                        .into();
                    data_transfer +=
                        Amount::Known(size_gb * target_prices.data_retrieval_cost_per_gb);
                }
                None => {}
            }
        }

        let (transactions, bytes) = read_volume(combined_count, combined_size, read_percent);
        let target_line = TierCostLine {
            tier: target,
            count: combined_count,
            total_size_bytes: combined_size,
            storage_cost: Amount::Known(gb(combined_size) * target_prices.storage_cost_per_gb_month),
            read_cost: self.read_cost(target, transactions, bytes),
        };
        let after_migration: Vec<TierCostLine> = considered
            .iter()
            .map(|&tier| {
                if tier == target {
                    target_line.clone()
                } else {
                    TierCostLine::empty(tier)
                }
            })
            .collect();

        let current_totals = CostTotals::of(&current);
        let after_migration_totals = CostTotals::of(&after_migration);
        let savings = Savings {
            storage: current_totals.storage_cost - after_migration_totals.storage_cost,
            read: current_totals.read_cost - after_migration_totals.read_cost,
            net_monthly: current_totals.total_cost() - after_migration_totals.total_cost(),
        };

        Ok(Scenario::Available(CostReport {
            region: self.prices.region().to_string(),
            source_tiers: source_tiers.to_vec(),
            target_tier: target,
            read_percent_per_month: read_percent,
            current,
            current_totals,
            after_migration,
            after_migration_totals,
            one_time: OneTimeCost {
                tier_change,
                data_transfer,
            },
            savings,
            missing_prices,
        }))
    }

    /// Estimate uploading `count` local objects totalling `size` bytes into `tier`.
    ///
    /// Uploads into Archive are written as Hot and then moved, so they pay a
    /// Hot write plus an Archive write per object.
    pub fn estimate_upload(
        &self,
        count: u64,
        size: u64,
        tier: Tier,
        read_percent: f64,
    ) -> Result<UploadScenario> {
        validate_read_percent(read_percent)?;
        let Some(prices) = self.prices.get(tier) else {
            return Ok(Scenario::Unavailable { tier });
        };

        let objects = count as f64;
        let (upload_cost, tier_change_cost) = match tier {
            Tier::Hot | Tier::Cool => (
                objects * prices.write_ops_cost_per_10k / OPS_UNIT,
                0.0,
            ),
            Tier::Archive => {
                let hot_write = self
                    .prices
                    .get(Tier::Hot)
                    .map_or(0.0, |hot| hot.write_ops_cost_per_10k);
                (
                    objects * hot_write / OPS_UNIT,
                    objects * prices.write_ops_cost_per_10k / OPS_UNIT,
                )
            }
        };

        let (transactions, bytes) = read_volume(count, size, read_percent);
        Ok(Scenario::Available(UploadEstimate {
            tier,
            count,
            total_size_bytes: size,
            upload_cost: Amount::Known(upload_cost),
            tier_change_cost: Amount::Known(tier_change_cost),
            storage_cost: Amount::Known(gb(size) * prices.storage_cost_per_gb_month),
            read_cost: self.read_cost(tier, transactions, bytes),
        }))
    }
}
