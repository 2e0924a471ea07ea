//! Sequential migration runner

use crate::analysis::{ContainerStatistics, ObjectId, Tier};
use crate::error::BlobTierError;
use crate::migration::{MigrationItem, MigrationPlan, TierChanger};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to each item of a plan
#[derive(Debug, Serialize)]
pub struct MigrationOutcome {
    pub target: Tier,
    pub planned: usize,
    pub succeeded: Vec<MigrationItem>,
    pub failed: Vec<MigrationItem>,
    pub cancelled: bool,
    /// Error that stopped the batch early
    #[serde(serialize_with = "serialize_error")]
    pub aborted: Option<BlobTierError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<BlobTierError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl MigrationOutcome {
    fn new(plan: &MigrationPlan) -> Self {
        Self {
            target: plan.target,
            planned: plan.len(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
            aborted: None,
        }
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn success_percent(&self) -> f64 {
        percent(self.succeeded.len(), self.planned)
    }

    pub fn failure_percent(&self) -> f64 {
        percent(self.failed.len(), self.planned)
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.aborted.is_none() && self.attempted() == self.planned
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Runs a plan item by item in plan order
pub struct MigrationExecutor<'a> {
    changer: &'a dyn TierChanger,
    progress: ProgressBar,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(changer: &'a dyn TierChanger) -> Self {
        Self {
            changer,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report progress on `bar`; its length is set when the run starts
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = bar;
        self
    }

    /// Move every item of `plan`, stopping early on cancellation or a
    /// backend error. Items already moved stay moved.
    pub async fn execute(&self, plan: &MigrationPlan, cancel: &CancellationToken) -> MigrationOutcome {
        let mut outcome = MigrationOutcome::new(plan);
        self.progress.set_length(plan.len() as u64);
        info!("Moving {} objects to {}", plan.len(), plan.target);

        for item in &plan.items {
            if cancel.is_cancelled() {
                warn!("Migration cancelled after {} objects", outcome.attempted());
                outcome.cancelled = true;
                break;
            }

            let id = &item.object.id;
            match self
                .changer
                .change_tier(&id.container, &id.name, plan.target)
                .await
            {
                Ok(true) => {
                    debug!("Moved {} from {} to {}", id, item.source, plan.target);
                    outcome.succeeded.push(item.clone());
                }
                Ok(false) => {
                    warn!("Could not move {} to {}", id, plan.target);
                    outcome.failed.push(item.clone());
                }
                Err(e) => {
                    error!("Migration stopped at {}: {}", id, e);
                    outcome.aborted = Some(e);
                    break;
                }
            }

            self.progress.inc(1);
            self.progress.set_message(format!(
                "Moved: {:.2}%  Failed: {:.2}%",
                outcome.success_percent(),
                outcome.failure_percent()
            ));
        }

        self.progress.finish();
        info!(
            "Migration finished: {} moved, {} failed",
            outcome.succeeded.len(),
            outcome.failed.len()
        );
        outcome
    }
}

/// Successfully migrated objects grouped by the tier they left
pub type MovesBySource<'a> = HashMap<Tier, HashSet<&'a ObjectId>>;

impl MigrationOutcome {
    pub fn moves_by_source(&self) -> MovesBySource<'_> {
        let mut moves = MovesBySource::new();
        for item in &self.succeeded {
            moves.entry(item.source).or_default().insert(&item.object.id);
        }
        moves
    }
}

/// Apply grouped moves to `statistics`; one pass per source tier.
///
/// Objects that belong to other containers are ignored, so the same moves
/// can be applied to every container and to the summary. Returns the number
/// of objects moved.
pub fn apply_moves(statistics: &mut ContainerStatistics, moves: &MovesBySource<'_>, target: Tier) -> usize {
    moves
        .iter()
        .map(|(&source, ids)| statistics.move_objects(ids, source, target))
        .sum()
}

/// Move the successfully migrated objects of `outcome` inside `statistics`
pub fn apply_migration(statistics: &mut ContainerStatistics, outcome: &MigrationOutcome) -> usize {
    apply_moves(statistics, &outcome.moves_by_source(), outcome.target)
}
