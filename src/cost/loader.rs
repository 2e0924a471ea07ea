//! Regional price tables
//!
//! Price files are JSON documents named `<region>.json` (lowercase) with a
//! top-level `Costs` object holding one entry per tier. Values may be numbers
//! or numeric strings. A tier whose entry is null, incomplete or negative is
//! treated as unpriced rather than rejecting the whole table.

use crate::analysis::Tier;
use crate::cost::models::{PriceTable, TierPrices};
use crate::error::{BlobTierError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_REGION: &str = "EastUS2";

const BUILTIN_EASTUS2: &str = include_str!("../../data/eastus2.json");

/// Price table compiled into the binary for the default region
pub fn builtin_price_table() -> PriceTable {
    parse_price_table(DEFAULT_REGION, BUILTIN_EASTUS2)
        .unwrap_or_else(|_| PriceTable::new(DEFAULT_REGION))
}

/// Parse a price document for `region`
pub fn parse_price_table(region: &str, json: &str) -> Result<PriceTable> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| BlobTierError::price_table(region, format!("invalid JSON: {e}")))?;
    let costs = document
        .get("Costs")
        .and_then(Value::as_object)
        .ok_or_else(|| BlobTierError::price_table(region, "missing 'Costs' object"))?;

    let mut table = PriceTable::new(region);
    for tier in Tier::ALL {
        match parse_tier(costs, tier) {
            Some(prices) => table = table.with_tier(tier, prices),
            None => debug!("{} has no usable {} prices", region, tier),
        }
    }
    Ok(table)
}

fn lookup<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn parse_tier(costs: &Map<String, Value>, tier: Tier) -> Option<TierPrices> {
    let entry = lookup(costs, tier.as_str())?.as_object()?;
    let field = |name: &str| lookup(entry, name).and_then(parse_number);

    let prices = TierPrices::new(
        field("DataStorageCostPerGB")?,
        field("WriteOperationsCostPerTenThousand")?,
        field("ReadOperationsCostPerTenThousand")?,
        field("DataRetrievalCostPerGB")?,
        field("DataWriteCostPerGB")?,
    );
    prices.is_valid().then_some(prices)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn region_file(dir: &Path, region: &str) -> PathBuf {
    dir.join(format!("{}.json", region.to_lowercase()))
}

/// Load the price table of `region`.
///
/// Looks for `<region>.json` in `data_dir` first; the default region falls
/// back to the built-in table.
pub async fn load_price_table(data_dir: Option<&Path>, region: &str) -> Result<PriceTable> {
    if let Some(dir) = data_dir {
        let path = region_file(dir, region);
        match fs::read_to_string(&path).await {
            Ok(contents) => {
                debug!("Loading prices from {}", path.display());
                return parse_price_table(region, &contents);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No price file at {}", path.display());
            }
            Err(e) => {
                return Err(BlobTierError::price_table(
                    region,
                    format!("cannot read {}: {}", path.display(), e),
                ))
            }
        }
    }

    if region.eq_ignore_ascii_case(DEFAULT_REGION) {
        return Ok(builtin_price_table());
    }

    Err(BlobTierError::price_table(
        region,
        match data_dir {
            Some(dir) => format!("no price data in {}", dir.display()),
            None => "no price data directory configured".to_string(),
        },
    ))
}

/// Regions with a price table: every `*.json` in `data_dir` plus the built-in one
pub async fn list_regions(data_dir: Option<&Path>) -> Result<Vec<String>> {
    let mut regions = vec![DEFAULT_REGION.to_lowercase()];

    if let Some(dir) = data_dir {
        match fs::read_dir(dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        regions.push(stem.to_lowercase());
                    }
                }
            }
            Err(e) => warn!("Cannot read price data directory {}: {}", dir.display(), e),
        }
    }

    regions.sort();
    regions.dedup();
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_table_has_every_tier() {
        let table = parse_price_table(DEFAULT_REGION, BUILTIN_EASTUS2).unwrap();
        for tier in Tier::ALL {
            assert!(table.is_priced(tier), "{tier} should be priced");
        }
        let archive = table.get(Tier::Archive).unwrap();
        assert_eq!(archive.read_ops_cost_per_10k, 0.15);
        assert_eq!(archive.write_ops_cost_per_10k, 0.30);
        assert_eq!(builtin_price_table(), table);
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let json = r#"{"Costs": {"Hot": {
            "DataStorageCostPerGB": "0.02",
            "WriteOperationsCostPerTenThousand": 0.05,
            "ReadOperationsCostPerTenThousand": " 0.004 ",
            "DataRetrievalCostPerGB": 0,
            "DataWriteCostPerGB": "0"
        }}}"#;
        let table = parse_price_table("WestEurope", json).unwrap();
        assert_eq!(table.get(Tier::Hot).unwrap().storage_cost_per_gb_month, 0.02);
        assert!(!table.is_priced(Tier::Cool));
        assert_eq!(table.region(), "WestEurope");
    }

    #[test]
    fn test_null_or_incomplete_tiers_are_absent() {
        let json = r#"{"Costs": {
            "Hot": {
                "DataStorageCostPerGB": 0.02,
                "WriteOperationsCostPerTenThousand": 0.05,
                "ReadOperationsCostPerTenThousand": 0.004,
                "DataRetrievalCostPerGB": 0,
                "DataWriteCostPerGB": 0
            },
            "Cool": {"DataStorageCostPerGB": 0.01},
            "Archive": null
        }}"#;
        let table = parse_price_table("Somewhere", json).unwrap();
        assert!(table.is_priced(Tier::Hot));
        assert!(!table.is_priced(Tier::Cool));
        assert!(!table.is_priced(Tier::Archive));
    }

    #[test]
    fn test_negative_price_makes_tier_absent() {
        let json = r#"{"Costs": {"Cool": {
            "DataStorageCostPerGB": -0.01,
            "WriteOperationsCostPerTenThousand": 0.1,
            "ReadOperationsCostPerTenThousand": 0.01,
            "DataRetrievalCostPerGB": 0.01,
            "DataWriteCostPerGB": 0.0025
        }}}"#;
        let table = parse_price_table("Somewhere", json).unwrap();
        assert!(!table.is_priced(Tier::Cool));
    }

    #[test]
    fn test_malformed_documents_are_errors() {
        assert!(matches!(
            parse_price_table("X", "not json"),
            Err(BlobTierError::PriceTableError { .. })
        ));
        assert!(matches!(
            parse_price_table("X", r#"{"Prices": {}}"#),
            Err(BlobTierError::PriceTableError { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_data_dir_and_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("westus.json"),
            r#"{"Costs": {"Archive": null}}"#,
        )
        .unwrap();

        let west = load_price_table(Some(dir.path()), "WestUS").await.unwrap();
        assert_eq!(west.region(), "WestUS");
        assert!(!west.is_priced(Tier::Hot));

        let east = load_price_table(Some(dir.path()), "eastus2").await.unwrap();
        assert!(east.is_priced(Tier::Archive));

        let missing = load_price_table(Some(dir.path()), "NorthPole").await;
        assert!(matches!(missing, Err(BlobTierError::PriceTableError { .. })));
        assert!(load_price_table(None, "NorthPole").await.is_err());
    }

    #[tokio::test]
    async fn test_list_regions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("WestUS.json"), "{}").unwrap();
        std::fs::write(dir.path().join("eastus2.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let regions = list_regions(Some(dir.path())).await.unwrap();
        assert_eq!(regions, vec!["eastus2", "westus"]);
        assert_eq!(list_regions(None).await.unwrap(), vec!["eastus2"]);
    }
}
