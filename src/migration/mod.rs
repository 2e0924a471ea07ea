//! Tier migration
//!
//! A [`MigrationPlan`] lists the matching objects of the chosen source tiers;
//! the [`MigrationExecutor`] moves them one by one through a [`TierChanger`].

pub mod executor;

pub use executor::{apply_migration, apply_moves, MigrationExecutor, MigrationOutcome, MovesBySource};

use crate::analysis::{ContainerStatistics, MatchedObject, Tier};
use crate::error::{BlobTierError, Result};
use async_trait::async_trait;
use serde::Serialize;

/// Changes the tier of a single stored object.
///
/// An ordinary failure (object gone, operation refused) is `Ok(false)`. An
/// `Err` means the backend cannot be used any more and stops the batch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TierChanger: Send + Sync {
    async fn change_tier(&self, container: &str, object: &str, target: Tier) -> Result<bool>;
}

/// One object to move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationItem {
    pub object: MatchedObject,
    pub source: Tier,
}

/// Ordered list of objects to move into `target`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    pub target: Tier,
    pub items: Vec<MigrationItem>,
}

impl MigrationPlan {
    /// Matching objects of `source_tiers` in tier order, then discovery order
    pub fn from_statistics(
        statistics: &ContainerStatistics,
        source_tiers: &[Tier],
        target: Tier,
    ) -> Result<Self> {
        if source_tiers.contains(&target) {
            return Err(BlobTierError::invalid_argument(format!(
                "Target tier {target} cannot also be a source tier"
            )));
        }

        let mut items = Vec::new();
        for (i, &tier) in source_tiers.iter().enumerate() {
            if source_tiers[..i].contains(&tier) {
                continue;
            }
            items.extend(
                statistics
                    .matching
                    .get(tier)
                    .members
                    .iter()
                    .map(|object| MigrationItem {
                        object: object.clone(),
                        source: tier,
                    }),
            );
        }
        Ok(Self { target, items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.items.iter().map(|i| i.object.size).sum()
    }
}
