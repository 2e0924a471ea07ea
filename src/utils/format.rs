//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data with color support, plus size and currency formatting.

use crate::error::Result;
use crossterm::{
    style::{Color as CrosstermColor, Stylize},
    terminal::size,
};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Table formatter with color support
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Render rows as a table, or serialize them for JSON/YAML output
    pub fn format_table<T: Tabled + Serialize>(&self, data: &[T]) -> Result<String> {
        match self.format {
            OutputFormat::Table if data.is_empty() => Ok("No data to display".to_string()),
            OutputFormat::Table => Ok(format_table(Table::new(data), self.no_color)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        }
    }
}

/// Serialize any report for the structured output formats
pub fn to_structured<T: Serialize>(format: OutputFormat, value: &T) -> Result<Option<String>> {
    match format {
        OutputFormat::Table => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
    }
}

/// Display utilities for various data types
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    /// Create new display utilities
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    /// Print a section header
    pub fn print_header(&self, title: &str) {
        let styled_title = if self.no_color {
            format!("=== {title} ===")
        } else {
            format!("=== {} ===", title.with(self.theme.header).bold())
        };

        println!("{styled_title}");
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) {
        if self.no_color {
            println!("✓ {message}");
        } else {
            println!("✓ {}", message.with(self.theme.success));
        }
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) {
        if self.no_color {
            println!("⚠ {message}");
        } else {
            println!("⚠ {}", message.with(self.theme.warning));
        }
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) {
        if self.no_color {
            println!("ℹ {message}");
        } else {
            println!("ℹ {}", message.with(self.theme.info));
        }
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, String)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let padded = format!("{key:max_key_length$}");
                let formatted_key = if self.no_color {
                    padded
                } else {
                    padded.with(self.theme.accent).bold().to_string()
                };
                format!("{formatted_key}: {value}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format a byte count with binary units
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// `count/size` cell used in statistics tables
pub fn format_count_size(count: u64, bytes: u64) -> String {
    format!("{}/{}", format_thousands(count), format_size(bytes))
}

pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format US dollars rounded to cents, e.g. `$1,234.57` or `-$0.50`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, format_thousands(cents / 100), cents % 100)
}

/// Convenience function for formatting a table with default settings
pub fn format_table(mut table: Table, no_color: bool) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .with(Padding::new(1, 1, 0, 0));

    if !no_color {
        table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
    }

    // Auto-adjust width to terminal
    if let Ok((width, _)) = size() {
        table.with(Width::wrap(width as usize));
    }

    table.to_string()
}
