//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use crate::analysis::{aggregate_sources, Aggregation, ContainerStatistics, FilterCriteria, Tier};
use crate::blob::{BlobManager, StorageConnection, ALL_CONTAINERS};
use crate::cli::report::{
    render_cost_report, render_outcome_summary, render_tier_statistics, render_upload_estimate,
    source_statistics_rows, unavailable_message, AnalysisReport, LocalReport, RegionRow, FOOTNOTES,
};
use crate::config::{init_default_config, Config};
use crate::cost::{
    list_regions, load_price_table, CostEngine, PriceTable, Scenario, ScenarioEstimate, DEFAULT_REGION,
};
use crate::error::{BlobTierError, Result};
use crate::migration::{apply_moves, MigrationExecutor, MigrationPlan};
use crate::source::{LocalSource, ObjectSource};
use crate::utils::format::{format_size, format_table, to_structured, DisplayUtils, OutputFormat, TableFormatter};
use crate::utils::interactive::{migration_progress_bar, InteractivePrompt};
use crate::utils::parse::{date_arg, read_percentage_arg, size_arg};
use crate::utils::sanitizer::validate_container_name;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tabled::Table;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bta")]
#[command(about = "Analyze storage tiers and estimate the cost of moving blobs between them")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which objects count as candidates for a tier change
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Match objects last modified at least this many days ago
    #[arg(long)]
    pub days: Option<u32>,

    /// Match objects at least this large (bytes, or with a unit: 500MB, 1.5GB)
    #[arg(long, value_parser = size_arg)]
    pub size: Option<u64>,

    /// Only count modification dates on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    pub modified_after: Option<DateTime<Utc>>,

    /// Replace the --days cutoff with an explicit date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    pub modified_before: Option<DateTime<Utc>>,
}

impl FilterArgs {
    pub fn criteria(&self, config: &Config, now: DateTime<Utc>) -> FilterCriteria {
        let mut criteria = FilterCriteria::older_than_days(
            self.days.unwrap_or(config.days),
            self.size.unwrap_or(config.min_size),
            now,
        );
        if let Some(before) = self.modified_before {
            criteria.modified_before = Some(before);
        }
        criteria.modified_after = self.modified_after;
        criteria
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PricingArgs {
    /// Azure region whose prices are used
    #[arg(long)]
    pub region: Option<String>,

    /// Share of the data read each month, in percent (100 = everything once)
    #[arg(long, value_parser = read_percentage_arg)]
    pub read_percentage: Option<f64>,

    /// Directory holding <region>.json price files
    #[arg(long)]
    pub price_data_dir: Option<PathBuf>,
}

impl PricingArgs {
    fn region(&self, config: &Config) -> String {
        self.region.clone().unwrap_or_else(|| config.region.clone())
    }

    fn read_percentage(&self, config: &Config) -> f64 {
        self.read_percentage.unwrap_or(config.read_percentage)
    }

    async fn load_prices(&self, config: &Config) -> Result<PriceTable> {
        let data_dir = self.price_data_dir.clone().or_else(|| config.price_data_dir.clone());
        load_price_table(data_dir.as_deref(), &self.region(config)).await
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze local folders and estimate the cost of uploading them
    Local {
        /// Folders to analyze
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        pricing: PricingArgs,
    },
    /// Analyze blob containers and estimate the cost of changing their tier
    Analyze {
        /// Container name, or * for every container in the account
        #[arg(long, short)]
        container: Option<String>,
        /// Storage account connection string
        #[arg(long)]
        connection_string: Option<String>,
        /// Storage account name (authenticates with Azure AD)
        #[arg(long)]
        account: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Leave objects in the Cool tier out of the matching set
        #[arg(long)]
        ignore_cool: bool,
        /// Tier the matching objects would move to (prompted when omitted)
        #[arg(long, value_enum)]
        target_tier: Option<Tier>,
        #[command(flatten)]
        pricing: PricingArgs,
        /// Show statistics for every container
        #[arg(long)]
        show_container_stats: bool,
        /// Move the matching objects to the target tier after the analysis
        #[arg(long)]
        change_tier: bool,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// List regions with price data
    Regions {
        /// Directory holding <region>.json price files
        #[arg(long)]
        price_data_dir: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Setting name
        key: String,
        /// Setting value
        value: String,
    },
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init,
}

/// Options of `bta analyze` after parsing
struct AnalyzeOptions {
    container: Option<String>,
    connection_string: Option<String>,
    account: Option<String>,
    filter: FilterArgs,
    ignore_cool: bool,
    target_tier: Option<Tier>,
    pricing: PricingArgs,
    show_container_stats: bool,
    change_tier: bool,
    yes: bool,
}

/// Where and how command output goes
struct Output {
    format: OutputFormat,
    no_color: bool,
    display: DisplayUtils,
}

impl Output {
    fn new(format: OutputFormat, no_color: bool) -> Self {
        Self {
            format,
            no_color,
            display: DisplayUtils::new(no_color),
        }
    }

    fn is_table(&self) -> bool {
        self.format == OutputFormat::Table
    }

    /// Warnings go to the terminal in table mode and to the log otherwise
    fn warning(&self, message: &str) {
        if self.is_table() {
            self.display.print_warning(message);
        } else {
            warn!("{}", message);
        }
    }
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        // CLI flags override config/env
        config.debug |= self.debug;
        config.no_color |= self.no_color;
        let format = if config.output_json && self.format == OutputFormat::Table {
            OutputFormat::Json
        } else {
            self.format
        };
        let output = Output::new(format, config.no_color);

        match self.command {
            Commands::Local {
                paths,
                filter,
                pricing,
            } => execute_local(&paths, &filter, &pricing, &output, &config).await,
            Commands::Analyze {
                container,
                connection_string,
                account,
                filter,
                ignore_cool,
                target_tier,
                pricing,
                show_container_stats,
                change_tier,
                yes,
            } => {
                let options = AnalyzeOptions {
                    container,
                    connection_string,
                    account,
                    filter,
                    ignore_cool,
                    target_tier,
                    pricing,
                    show_container_stats,
                    change_tier,
                    yes,
                };
                execute_analyze(options, &output, &config).await
            }
            Commands::Regions { price_data_dir } => {
                let data_dir = price_data_dir.or_else(|| config.price_data_dir.clone());
                execute_regions(data_dir, &output).await
            }
            Commands::Config { command } => execute_config_command(command, config, &output).await,
            Commands::Version => execute_version_command(&output),
        }
    }
}

/// Token cancelled on Ctrl-C; enumeration and migration stop at the next object
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping after the current object");
            child.cancel();
        }
    });
    token
}

/// Split aggregations into statistics and the names of sources that stopped early
fn collect_statistics(aggregations: Vec<Aggregation>, output: &Output) -> (Vec<ContainerStatistics>, Vec<String>) {
    let mut statistics = Vec::with_capacity(aggregations.len());
    let mut incomplete = Vec::new();

    for aggregation in aggregations {
        if let Some(e) = &aggregation.error {
            output.warning(&format!(
                "Statistics for '{}' are partial: {}",
                aggregation.statistics.name, e
            ));
        } else if aggregation.cancelled {
            output.warning(&format!(
                "Analysis of '{}' was interrupted; statistics are partial",
                aggregation.statistics.name
            ));
        }
        if !aggregation.is_complete() {
            incomplete.push(aggregation.statistics.name.clone());
        }
        statistics.push(aggregation.statistics);
    }

    (statistics, incomplete)
}

fn print_footnotes() {
    println!();
    for note in FOOTNOTES {
        println!("* {note}");
    }
}

async fn execute_local(
    paths: &[PathBuf],
    filter: &FilterArgs,
    pricing: &PricingArgs,
    output: &Output,
    config: &Config,
) -> Result<()> {
    let criteria = filter.criteria(config, Utc::now());
    let read_percentage = pricing.read_percentage(config);
    let prices = pricing.load_prices(config).await?;

    let sources: Vec<Box<dyn ObjectSource>> = paths
        .iter()
        .map(|path| Box::new(LocalSource::new(path)) as Box<dyn ObjectSource>)
        .collect();

    info!("Analyzing {} local folders", sources.len());
    let cancel = cancel_on_ctrl_c();
    let aggregations =
        aggregate_sources(&sources, &criteria, config.max_concurrent_sources, &cancel).await;
    let (statistics, incomplete) = collect_statistics(aggregations, output);
    let summary = ContainerStatistics::summary(&statistics);

    let engine = CostEngine::new(&prices);
    let count = summary.matching.total_count();
    let size = summary.matching.total_size_bytes();
    let uploads = Tier::ALL
        .iter()
        .map(|&tier| engine.estimate_upload(count, size, tier, read_percentage))
        .collect::<Result<Vec<_>>>()?;

    let report = LocalReport {
        region: prices.region(),
        read_percent_per_month: read_percentage,
        folders: &statistics,
        summary: &summary,
        uploads: &uploads,
        incomplete: &incomplete,
    };
    if let Some(text) = to_structured(output.format, &report)? {
        println!("{text}");
        return Ok(());
    }

    output.display.print_header("Folder statistics");
    let rows = source_statistics_rows(&statistics, &summary);
    println!("{}", format_table(Table::new(rows), output.no_color));
    println!();

    output.display.print_header(&format!(
        "Upload cost estimate ({}, {} matching files, {}, {}% read per month)",
        prices.region(),
        count,
        format_size(size),
        read_percentage
    ));
    for (scenario, tier) in uploads.iter().zip(Tier::ALL) {
        println!();
        println!("Upload files and keep them in the {tier} tier");
        match scenario {
            Scenario::Available(estimate) => {
                println!("{}", render_upload_estimate(estimate, &output.display))
            }
            Scenario::Unavailable { tier } => output.warning(&unavailable_message(*tier)),
        }
    }
    print_footnotes();

    Ok(())
}

/// Target tier from the flag, a prompt, or Archive
/// Why a requested tier change must not run, if it must not
fn migration_blocker(cancelled: bool, scenario: &ScenarioEstimate) -> Option<String> {
    if cancelled {
        return Some("Analysis was interrupted; no objects will be moved".to_string());
    }
    match scenario {
        Scenario::Available(_) => None,
        Scenario::Unavailable { tier } => Some(format!(
            "No {tier} prices for this region; refusing to move objects into {tier}"
        )),
    }
}

fn resolve_target_tier(requested: Option<Tier>, output: &Output) -> Result<Tier> {
    if let Some(tier) = requested {
        return Ok(tier);
    }
    if output.is_table() && InteractivePrompt::is_available() {
        return InteractivePrompt::new().select_target_tier();
    }
    Ok(Tier::Archive)
}

async fn execute_analyze(options: AnalyzeOptions, output: &Output, config: &Config) -> Result<()> {
    let storage = config.storage();
    let connection = StorageConnection::from_settings(
        options
            .connection_string
            .as_deref()
            .or(storage.connection_string.as_deref()),
        options.account.as_deref().or(storage.account_name.as_deref()),
    )?;
    let selector = options
        .container
        .clone()
        .or(storage.default_container)
        .unwrap_or_else(|| ALL_CONTAINERS.to_string());

    let criteria = options
        .filter
        .criteria(config, Utc::now())
        .ignoring_cool_tier(options.ignore_cool);
    let read_percentage = options.pricing.read_percentage(config);
    let prices = options.pricing.load_prices(config).await?;

    validate_container_name(&selector)?;
    let manager = BlobManager::new(&connection)?;
    manager.validate_connection(&selector).await?;
    let containers = manager.resolve_containers(&selector).await?;
    if containers.is_empty() {
        output.warning(&format!(
            "Storage account '{}' has no containers",
            manager.account_name()
        ));
        return Ok(());
    }

    let sources: Vec<Box<dyn ObjectSource>> = containers
        .iter()
        .map(|name| Box::new(manager.container_source(name)) as Box<dyn ObjectSource>)
        .collect();

    info!("Analyzing {} containers", sources.len());
    let cancel = cancel_on_ctrl_c();
    let aggregations =
        aggregate_sources(&sources, &criteria, config.max_concurrent_sources, &cancel).await;
    let (mut statistics, incomplete) = collect_statistics(aggregations, output);
    let mut summary = ContainerStatistics::summary(&statistics);
    let show_containers = options.show_container_stats || config.show_container_statistics;

    if output.is_table() {
        if show_containers {
            for stats in &statistics {
                output.display.print_header(&format!("Container '{}'", stats.name));
                println!("{}", render_tier_statistics(stats, output.no_color));
                println!();
            }
        }
        output.display.print_header("Summary for all containers");
        println!("{}", render_tier_statistics(&summary, output.no_color));
        println!();
    }

    let target = resolve_target_tier(options.target_tier, output)?;
    let source_tiers = Tier::others(target);
    let scenario = CostEngine::new(&prices).estimate(
        &summary.matching,
        &source_tiers,
        target,
        read_percentage,
    )?;

    if output.is_table() {
        match &scenario {
            Scenario::Available(report) => {
                println!("{}", render_cost_report(report, &output.display, output.no_color));
                print_footnotes();
            }
            Scenario::Unavailable { tier } => output.warning(&unavailable_message(*tier)),
        }
    }

    let mut outcome = None;
    if options.change_tier {
        if let Some(reason) = migration_blocker(cancel.is_cancelled(), &scenario) {
            output.warning(&reason);
        } else {
            let plan = MigrationPlan::from_statistics(&summary, &source_tiers, target)?;
            if plan.is_empty() {
                output.warning("No matching objects to move");
            } else if confirm_migration(&plan, options.yes, output)? {
                let changer = manager.tier_changer();
                let bar = migration_progress_bar(plan.len() as u64, output.is_table());
                let result = MigrationExecutor::new(&changer)
                    .with_progress(bar)
                    .execute(&plan, &cancel)
                    .await;

                let moves = result.moves_by_source();
                for stats in statistics.iter_mut() {
                    apply_moves(stats, &moves, result.target);
                }
                let moved = apply_moves(&mut summary, &moves, result.target);
                info!("Applied {} moves to the statistics", moved);
                outcome = Some(result);
            }
        }
    }

    if let Some(text) = to_structured(output.format, &AnalysisReport {
        account: manager.account_name(),
        containers: &statistics,
        summary: &summary,
        scenario: &scenario,
        migration: outcome.as_ref(),
        incomplete: &incomplete,
    })? {
        println!("{text}");
    } else if let Some(result) = &outcome {
        println!();
        output.display.print_header("Migration");
        println!("{}", render_outcome_summary(result, &output.display));
        if result.is_complete() {
            output
                .display
                .print_success(&format!("Moved {} objects to {}", result.succeeded.len(), target));
        } else if result.cancelled {
            output.warning("Migration was interrupted; objects already moved stay moved");
        }
        println!();
        if show_containers {
            for stats in &statistics {
                output.display.print_header(&format!("Container '{}' after migration", stats.name));
                println!("{}", render_tier_statistics(stats, output.no_color));
                println!();
            }
        }
        output.display.print_header("Summary after migration");
        println!("{}", render_tier_statistics(&summary, output.no_color));
    }

    match outcome.and_then(|mut result| result.aborted.take()) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn confirm_migration(plan: &MigrationPlan, yes: bool, output: &Output) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !InteractivePrompt::is_available() {
        return Err(BlobTierError::invalid_argument(
            "Refusing to move objects without confirmation; pass --yes when not running interactively",
        ));
    }
    let question = format!(
        "Move {} objects ({}) to the {} tier?",
        plan.len(),
        format_size(plan.total_size_bytes()),
        plan.target
    );
    let confirmed = InteractivePrompt::new().confirm(&question, false)?;
    if !confirmed {
        output.display.print_info("Migration skipped");
    }
    Ok(confirmed)
}

async fn execute_regions(data_dir: Option<PathBuf>, output: &Output) -> Result<()> {
    let rows: Vec<RegionRow> = list_regions(data_dir.as_deref())
        .await?
        .into_iter()
        .map(|region| RegionRow {
            is_default: region.eq_ignore_ascii_case(DEFAULT_REGION),
            region,
        })
        .collect();

    let formatter = TableFormatter::new(output.format, output.no_color);
    println!("{}", formatter.format_table(&rows)?);
    Ok(())
}

async fn execute_config_command(command: ConfigCommands, config: Config, output: &Output) -> Result<()> {
    match command {
        ConfigCommands::Show => execute_config_show(&config, output),
        ConfigCommands::Set { key, value } => execute_config_set(&key, &value, config, output).await,
        ConfigCommands::Path => execute_config_path(),
        ConfigCommands::Init => execute_config_init(output).await,
    }
}

fn execute_config_show(config: &Config, output: &Output) -> Result<()> {
    let formatter = TableFormatter::new(output.format, output.no_color);
    println!("{}", formatter.format_table(&config.entries())?);
    Ok(())
}

fn execute_config_path() -> Result<()> {
    let config_path = Config::get_config_path()?;
    println!("{}", config_path.display());
    Ok(())
}

async fn execute_config_set(key: &str, value: &str, mut config: Config, output: &Output) -> Result<()> {
    config.set_value(key, value)?;
    config.save().await?;
    output
        .display
        .print_success(&format!("Configuration updated: {key} = {value}"));
    Ok(())
}

async fn execute_config_init(output: &Output) -> Result<()> {
    let path = Config::get_config_path()?;
    if init_default_config().await? {
        output
            .display
            .print_success(&format!("Created {}", path.display()));
    } else {
        output
            .display
            .print_info(&format!("{} already exists; left unchanged", path.display()));
    }
    Ok(())
}

fn execute_version_command(output: &Output) -> Result<()> {
    let info = [
        ("name", env!("CARGO_PKG_NAME").to_string()),
        ("version", env!("CARGO_PKG_VERSION").to_string()),
    ];

    match output.format {
        OutputFormat::Table => {
            println!("bta {}", env!("CARGO_PKG_VERSION"));
            println!("{}", env!("CARGO_PKG_DESCRIPTION"));
        }
        format => {
            let value: std::collections::BTreeMap<&str, String> = info.into_iter().collect();
            if let Some(text) = to_structured(format, &value)? {
                println!("{text}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "bta",
            "analyze",
            "--container",
            "logs",
            "--size",
            "1GB",
            "--target-tier",
            "cool",
            "--read-percentage",
            "25%",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Analyze {
                container,
                filter,
                target_tier,
                pricing,
                change_tier,
                ..
            } => {
                assert_eq!(container.as_deref(), Some("logs"));
                assert_eq!(filter.size, Some(1 << 30));
                assert_eq!(target_tier, Some(Tier::Cool));
                assert_eq!(pricing.read_percentage, Some(25.0));
                assert!(!change_tier);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_cli_rejects_negative_read_percentage() {
        let result = Cli::try_parse_from(["bta", "local", ".", "--read-percentage", "-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_local_requires_a_path() {
        assert!(Cli::try_parse_from(["bta", "local"]).is_err());
    }

    #[test]
    fn test_filter_args_fall_back_to_config() {
        let mut config = Config::default();
        config.days = 90;
        config.min_size = 4096;
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 8, 0, 0).unwrap();

        let criteria = FilterArgs::default().criteria(&config, now);
        assert_eq!(criteria.min_size, 4096);
        assert_eq!(
            criteria.modified_before,
            Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
        );

        let explicit = FilterArgs {
            days: Some(1),
            size: Some(10),
            modified_after: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            modified_before: Some(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap()),
        };
        let criteria = explicit.criteria(&config, now);
        assert_eq!(criteria.min_size, 10);
        assert_eq!(
            criteria.modified_before,
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap())
        );
        assert!(criteria.modified_after.is_some());
    }

    #[test]
    fn test_target_tier_defaults_to_archive_without_prompt() {
        let output = Output::new(OutputFormat::Json, true);
        assert_eq!(resolve_target_tier(None, &output).unwrap(), Tier::Archive);
        assert_eq!(resolve_target_tier(Some(Tier::Hot), &output).unwrap(), Tier::Hot);
    }

    #[test]
    fn test_unpriced_target_blocks_migration() {
        let unavailable: ScenarioEstimate = Scenario::Unavailable { tier: Tier::Archive };
        let reason = migration_blocker(false, &unavailable).unwrap();
        assert!(reason.contains("Archive"));

        let prices = crate::cost::builtin_price_table();
        let available = CostEngine::new(&prices)
            .estimate(
                &crate::analysis::TierBuckets::new(),
                &[Tier::Hot, Tier::Cool],
                Tier::Archive,
                100.0,
            )
            .unwrap();
        assert!(migration_blocker(false, &available).is_none());
        assert!(migration_blocker(true, &available).is_some());
    }
}
