//! Parsers for command-line values
//!
//! Read percentages ("50", "50%", "150.5"), object sizes ("1024", "500MB",
//! "1.5 GB") and ISO 8601 dates used as filter bounds.

use crate::error::{BlobTierError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Parse a monthly read percentage. 100 means all data is read once a month.
pub fn parse_read_percentage(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let value: f64 = number.parse().map_err(|_| {
        BlobTierError::invalid_argument(format!("Invalid read percentage: '{input}'"))
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(BlobTierError::invalid_argument(format!(
            "Read percentage must be zero or more, got '{input}'"
        )));
    }
    Ok(value)
}

/// Parse a size in bytes, optionally with a binary unit (KB, MB, GB, TB)
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let multiplier: u64 = match unit.trim().to_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        "T" | "TB" | "TIB" => 1 << 40,
        other => {
            return Err(BlobTierError::invalid_argument(format!(
                "Unknown size unit '{other}' in '{input}'"
            )))
        }
    };

    let number = number.trim();
    if let Ok(whole) = number.parse::<u64>() {
        return whole.checked_mul(multiplier).ok_or_else(|| {
            BlobTierError::invalid_argument(format!("Size '{input}' is too large"))
        });
    }

    let value: f64 = number
        .parse()
        .map_err(|_| BlobTierError::invalid_argument(format!("Invalid size: '{input}'")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(BlobTierError::invalid_argument(format!(
            "Size must be zero or more, got '{input}'"
        )));
    }
    Ok((value * multiplier as f64).round() as u64)
}

/// Parse ISO 8601 dates used as filter bounds
/// Supported formats:
/// - "2024-12-31" (midnight UTC)
/// - "2024-12-31T23:59:59" (UTC)
/// - "2024-12-31T23:59:59Z" / "2024-12-31T23:59:59+02:00"
pub fn parse_date_bound(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(BlobTierError::invalid_argument(format!(
        "Invalid date format: '{input}'. Expected ISO 8601 format (YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS, or YYYY-MM-DDTHH:MM:SSZ)"
    )))
}

/// clap value parser for read percentages
pub fn read_percentage_arg(input: &str) -> std::result::Result<f64, String> {
    parse_read_percentage(input).map_err(|e| e.to_string())
}

/// clap value parser for sizes
pub fn size_arg(input: &str) -> std::result::Result<u64, String> {
    parse_size(input).map_err(|e| e.to_string())
}

/// clap value parser for date bounds
pub fn date_arg(input: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_date_bound(input).map_err(|e| e.to_string())
}
