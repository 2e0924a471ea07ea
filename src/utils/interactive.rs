//! Interactive input utilities for user prompts
//!
//! This module provides the confirmation and selection prompts used before a
//! migration and the progress bar shown while it runs.

use crate::analysis::Tier;
use crate::error::{BlobTierError, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

/// Interactive prompt utilities
pub struct InteractivePrompt {
    theme: ColorfulTheme,
}

impl InteractivePrompt {
    /// Create a new interactive prompt instance
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompts need a terminal on both ends
    pub fn is_available() -> bool {
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
    }

    /// Prompt for yes/no confirmation with a default value
    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let result = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| BlobTierError::config(format!("Failed to get user input: {e}")))?;
        Ok(result)
    }

    /// Prompt for selection from a list of options
    pub fn select(&self, message: &str, options: &[String], default: Option<usize>) -> Result<usize> {
        let mut select = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(options)
            .max_length(20);

        if let Some(default_index) = default {
            select = select.default(default_index);
        }

        let result = select
            .interact()
            .map_err(|e| BlobTierError::config(format!("Failed to get user selection: {e}")))?;

        Ok(result)
    }

    /// Ask which tier the matching objects should move to
    pub fn select_target_tier(&self) -> Result<Tier> {
        let options: Vec<String> = Tier::ALL.iter().map(|t| t.to_string()).collect();
        let default = Tier::ALL.iter().position(|t| *t == Tier::Archive);
        let index = self.select("Target tier for matching objects", &options, default)?;
        Tier::ALL
            .get(index)
            .copied()
            .ok_or_else(|| BlobTierError::invalid_argument("No tier selected"))
    }
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress bar for a migration of `len` objects
pub fn migration_progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}
