//! blobtier - Blob Tier Analysis Tool
//!
//! Analyzes local folders and Azure blob containers by storage tier, estimates
//! the monthly and one-time cost of moving objects between tiers, and can
//! carry out the move.

pub mod analysis;
pub mod auth;
pub mod blob;
pub mod cli;
pub mod config;
pub mod cost;
pub mod error;
pub mod migration;
pub mod source;
pub mod utils;

// Re-export commonly used types
pub use error::{BlobTierError, Result};
