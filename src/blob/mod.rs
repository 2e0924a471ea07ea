//! Azure Blob Storage access
//!
//! This module connects to a storage account, lists its containers and
//! blobs for analysis and changes blob access tiers.

pub mod manager;
pub mod models;
pub mod operations;

// Re-export commonly used types
pub use manager::BlobManager;
pub use models::*;
pub use operations::{BlobContainerSource, BlobTierChanger};
