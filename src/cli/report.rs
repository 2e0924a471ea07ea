//! Report rendering
//!
//! Table rows and text sections for statistics, migration scenarios and
//! upload scenarios, plus the serializable reports behind `--format json`.

use crate::analysis::{ContainerStatistics, Tier};
use crate::cost::{CostReport, CostTotals, Savings, ScenarioEstimate, TierCostLine, UploadEstimate, UploadScenario};
use crate::migration::MigrationOutcome;
use crate::utils::format::{format_count_size, format_size, format_table, format_thousands, DisplayUtils};
use serde::Serialize;
use tabled::{Table, Tabled};

pub const FOOTNOTES: [&str; 4] = [
    "All currency values are in US dollars, rounded to the nearest cent.",
    "Read costs do not include data egress charges.",
    "Storage costs do not include metadata charges.",
    "Reading a blob from the Archive tier may take up to 15 hours.",
];

/// Per-tier statistics of one container
#[derive(Debug, Clone, Tabled)]
pub struct TierStatisticsRow {
    #[tabled(rename = "Access Tier")]
    pub tier: String,
    #[tabled(rename = "Total Objects Count/Size")]
    pub all: String,
    #[tabled(rename = "Matching Objects Count/Size")]
    pub matching: String,
}

/// Totals of one source
#[derive(Debug, Clone, Tabled)]
pub struct SourceStatisticsRow {
    #[tabled(rename = "Source")]
    pub name: String,
    #[tabled(rename = "Total Files Count/Size")]
    pub all: String,
    #[tabled(rename = "Matching Files Count/Size")]
    pub matching: String,
}

#[derive(Debug, Clone, Tabled)]
pub struct CostRow {
    #[tabled(rename = "Access Tier")]
    pub tier: String,
    #[tabled(rename = "Objects")]
    pub count: String,
    #[tabled(rename = "Capacity")]
    pub capacity: String,
    #[tabled(rename = "Storage Cost/Month")]
    pub storage: String,
    #[tabled(rename = "Read Cost/Month")]
    pub read: String,
    #[tabled(rename = "Total Cost/Month")]
    pub total: String,
}

impl CostRow {
    fn line(line: &TierCostLine) -> Self {
        Self {
            tier: line.tier.to_string(),
            count: format_thousands(line.count),
            capacity: format_size(line.total_size_bytes),
            storage: line.storage_cost.to_string(),
            read: line.read_cost.to_string(),
            total: line.total_cost().to_string(),
        }
    }

    fn totals(totals: &CostTotals) -> Self {
        Self {
            tier: "Total".to_string(),
            count: format_thousands(totals.count),
            capacity: format_size(totals.total_size_bytes),
            storage: totals.storage_cost.to_string(),
            read: totals.read_cost.to_string(),
            total: totals.total_cost().to_string(),
        }
    }

    fn savings(savings: &Savings) -> Self {
        Self {
            tier: "Savings".to_string(),
            count: "--".to_string(),
            capacity: "--".to_string(),
            storage: savings.storage.to_string(),
            read: savings.read.to_string(),
            total: savings.net_monthly.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct RegionRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Default")]
    #[serde(rename = "default")]
    pub is_default: bool,
}

/// `bta local` output for the structured formats
#[derive(Debug, Serialize)]
pub struct LocalReport<'a> {
    pub region: &'a str,
    pub read_percent_per_month: f64,
    pub folders: &'a [ContainerStatistics],
    pub summary: &'a ContainerStatistics,
    pub uploads: &'a [UploadScenario],
    /// Sources whose listing stopped early
    pub incomplete: &'a [String],
}

/// `bta analyze` output for the structured formats
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub account: &'a str,
    pub containers: &'a [ContainerStatistics],
    pub summary: &'a ContainerStatistics,
    pub scenario: &'a ScenarioEstimate,
    pub migration: Option<&'a MigrationOutcome>,
    pub incomplete: &'a [String],
}

pub fn tier_statistics_rows(statistics: &ContainerStatistics) -> Vec<TierStatisticsRow> {
    Tier::ALL
        .iter()
        .map(|&tier| {
            let all = statistics.all.get(tier);
            let matching = statistics.matching.get(tier);
            TierStatisticsRow {
                tier: tier.to_string(),
                all: format_count_size(all.count, all.total_size_bytes),
                matching: format_count_size(matching.count, matching.total_size_bytes),
            }
        })
        .collect()
}

/// One row per source followed by the summary row
pub fn source_statistics_rows(
    statistics: &[ContainerStatistics],
    summary: &ContainerStatistics,
) -> Vec<SourceStatisticsRow> {
    statistics
        .iter()
        .chain(std::iter::once(summary))
        .map(|stats| SourceStatisticsRow {
            name: stats.name.clone(),
            all: format_count_size(stats.all.total_count(), stats.all.total_size_bytes()),
            matching: format_count_size(
                stats.matching.total_count(),
                stats.matching.total_size_bytes(),
            ),
        })
        .collect()
}

pub fn render_tier_statistics(statistics: &ContainerStatistics, no_color: bool) -> String {
    format_table(Table::new(tier_statistics_rows(statistics)), no_color)
}

fn tier_list(tiers: &[Tier]) -> String {
    tiers.iter().map(Tier::to_string).collect::<Vec<_>>().join(", ")
}

pub fn unavailable_message(tier: Tier) -> String {
    format!("No prices are defined for the {tier} tier in this region; the scenario cannot be estimated.")
}

/// Current costs, costs after migration, savings and one-time costs
pub fn render_cost_report(report: &CostReport, display: &DisplayUtils, no_color: bool) -> String {
    let mut current: Vec<CostRow> = report.current.iter().map(CostRow::line).collect();
    current.push(CostRow::totals(&report.current_totals));

    let mut after: Vec<CostRow> = report.after_migration.iter().map(CostRow::line).collect();
    after.push(CostRow::totals(&report.after_migration_totals));
    after.push(CostRow::savings(&report.savings));

    let summary = display.format_key_value_pairs(&[
        ("One-time tier change cost", report.one_time.tier_change.to_string()),
        ("One-time data transfer cost", report.one_time.data_transfer.to_string()),
        ("Total one-time cost", report.one_time.total().to_string()),
        ("Net savings per month", report.savings.net_monthly.to_string()),
    ]);

    let mut out = format!(
        "Scenario: move matching objects from {} to {} ({}, {}% read per month)\n\n\
         Current costs:\n{}\n\nCosts after migration:\n{}\n\n{}",
        tier_list(&report.source_tiers),
        report.target_tier,
        report.region,
        report.read_percent_per_month,
        format_table(Table::new(current), no_color),
        format_table(Table::new(after), no_color),
        summary
    );

    if !report.is_complete() {
        out.push_str(&format!(
            "\n\nNo prices for {} in {}; figures marked -- could not be computed.",
            tier_list(&report.missing_prices),
            report.region
        ));
    }
    out
}

/// Key/value block of one upload scenario
pub fn render_upload_estimate(estimate: &UploadEstimate, display: &DisplayUtils) -> String {
    let mut pairs = vec![("One-time upload cost", estimate.upload_cost.to_string())];
    if estimate.tier == Tier::Archive {
        pairs.push((
            "One-time Hot to Archive change cost",
            estimate.tier_change_cost.to_string(),
        ));
    }
    pairs.push(("Storage cost/month", estimate.storage_cost.to_string()));
    pairs.push(("Read cost/month", estimate.read_cost.to_string()));
    pairs.push(("Total cost/month", estimate.monthly_cost().to_string()));
    display.format_key_value_pairs(&pairs)
}

pub fn render_outcome_summary(outcome: &MigrationOutcome, display: &DisplayUtils) -> String {
    display.format_key_value_pairs(&[
        ("Target tier", outcome.target.to_string()),
        ("Planned", format_thousands(outcome.planned as u64)),
        (
            "Moved",
            format!("{} ({:.2}%)", outcome.succeeded.len(), outcome.success_percent()),
        ),
        (
            "Failed",
            format!("{} ({:.2}%)", outcome.failed.len(), outcome.failure_percent()),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::{builtin_price_table, CostEngine};

    const GB: u64 = 1 << 30;

    fn statistics() -> ContainerStatistics {
        let mut stats = ContainerStatistics::new("logs");
        stats.all.record(Tier::Hot, GB, None);
        stats.all.record(Tier::Cool, 2 * GB, None);
        stats.matching.record(Tier::Cool, 2 * GB, None);
        stats
    }

    #[test]
    fn test_tier_rows_cover_every_tier() {
        let rows = tier_statistics_rows(&statistics());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].tier, "Hot");
        assert_eq!(rows[0].all, "1/1.00 GB");
        assert_eq!(rows[0].matching, "0/0 B");
        assert_eq!(rows[1].matching, "1/2.00 GB");
    }

    #[test]
    fn test_source_rows_end_with_summary() {
        let stats = vec![statistics(), statistics()];
        let summary = ContainerStatistics::summary(&stats);
        let rows = source_statistics_rows(&stats, &summary);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].name, "Summary");
        assert_eq!(rows[2].all, "4/6.00 GB");
    }

    #[test]
    fn test_cost_report_rendering() {
        let prices = builtin_price_table();
        let stats = statistics();
        let report = CostEngine::new(&prices)
            .estimate(&stats.matching, &[Tier::Hot, Tier::Cool], Tier::Archive, 100.0)
            .unwrap();
        let report = report.available().unwrap();

        let text = render_cost_report(report, &DisplayUtils::new(true), true);
        assert!(text.contains("from Hot, Cool to Archive"));
        assert!(text.contains("Savings"));
        assert!(text.contains("Net savings per month"));
        assert!(!text.contains("could not be computed"));
    }

    #[test]
    fn test_upload_rendering_mentions_tier_change_only_for_archive() {
        let prices = builtin_price_table();
        let engine = CostEngine::new(&prices);
        let display = DisplayUtils::new(true);

        let hot = engine.estimate_upload(10, GB, Tier::Hot, 100.0).unwrap();
        let archive = engine.estimate_upload(10, GB, Tier::Archive, 100.0).unwrap();

        let hot_text = render_upload_estimate(hot.available().unwrap(), &display);
        let archive_text = render_upload_estimate(archive.available().unwrap(), &display);
        assert!(!hot_text.contains("Archive change"));
        assert!(archive_text.contains("Hot to Archive change cost"));
    }
}
