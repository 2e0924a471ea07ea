//! Container name validation
//!
//! Blob container names must follow the Azure naming rules before any
//! request is made, so typos surface as clear errors instead of HTTP 400s.

use crate::blob::models::ALL_CONTAINERS;
use crate::error::{BlobTierError, Result};
use regex::Regex;
use std::sync::OnceLock;

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 63;

/// Azure Blob container naming rules
pub struct ContainerNameRules {
    pub min_length: usize,
    pub max_length: usize,
    pub description: &'static str,
}

impl ContainerNameRules {
    pub fn new() -> Self {
        Self {
            min_length: MIN_NAME_LENGTH,
            max_length: MAX_NAME_LENGTH,
            description: "Container names must be 3-63 characters of lowercase letters, digits and \
                          single hyphens, starting and ending with a letter or digit",
        }
    }
}

impl Default for ContainerNameRules {
    fn default() -> Self {
        Self::new()
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9](?:[a-z0-9]|-[a-z0-9])*$").unwrap_or_else(|_| unreachable!())
    })
}

/// Check if a name is a valid blob container name
pub fn is_valid_container_name(name: &str) -> bool {
    (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&name.len()) && name_pattern().is_match(name)
}

/// Accept a container name or the `*` selector
pub fn validate_container_name(name: &str) -> Result<()> {
    if name == ALL_CONTAINERS || is_valid_container_name(name) {
        Ok(())
    } else {
        Err(BlobTierError::invalid_container_name(format!(
            "'{}'. {}",
            name,
            ContainerNameRules::new().description
        )))
    }
}
