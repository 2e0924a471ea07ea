//! Tier aggregation
//!
//! Folds a sequence of objects into per-tier statistics, split into an
//! "all objects" bucket and a "matching objects" bucket. Failures while
//! listing a source never abort the run: the statistics gathered so far are
//! kept and the error is handed back to the caller alongside them.

use crate::analysis::classifier::matches;
use crate::analysis::models::{ContainerStatistics, FilterCriteria, StorageObject};
use crate::error::{BlobTierError, Result};
use crate::source::ObjectSource;
use futures::{StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Incremental fold of objects from one source
pub struct TierAggregator<'a> {
    criteria: &'a FilterCriteria,
    statistics: ContainerStatistics,
}

impl<'a> TierAggregator<'a> {
    pub fn new<S: Into<String>>(name: S, criteria: &'a FilterCriteria) -> Self {
        Self {
            criteria,
            statistics: ContainerStatistics::new(name),
        }
    }

    /// Add one object to the statistics
    pub fn observe(&mut self, object: &StorageObject) {
        let tier = object.effective_tier();
        self.statistics.all.record(tier, object.size, None);
        if matches(object, self.criteria) {
            self.statistics
                .matching
                .record(tier, object.size, Some(object.id()));
        }
    }

    pub fn statistics(&self) -> &ContainerStatistics {
        &self.statistics
    }

    pub fn finish(self) -> ContainerStatistics {
        self.statistics
    }
}

/// Result of aggregating one source
#[derive(Debug)]
pub struct Aggregation {
    pub statistics: ContainerStatistics,
    /// Listing failure; `statistics` then holds whatever was seen before it
    pub error: Option<BlobTierError>,
    pub cancelled: bool,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && !self.cancelled
    }
}

/// Fold an already materialised sequence of objects.
///
/// Stops at the first `Err` item and records it in the returned
/// [`Aggregation`].
pub fn aggregate<S, I>(name: S, objects: I, criteria: &FilterCriteria) -> Aggregation
where
    S: Into<String>,
    I: IntoIterator<Item = Result<StorageObject>>,
{
    let mut aggregator = TierAggregator::new(name, criteria);
    let mut error = None;
    for object in objects {
        match object {
            Ok(object) => aggregator.observe(&object),
            Err(e) => {
                error = Some(e);
                break;
            }
        }
    }
    Aggregation {
        statistics: aggregator.finish(),
        error,
        cancelled: false,
    }
}

/// Enumerate `source` and fold its objects, checking `cancel` between objects
pub async fn aggregate_source(
    source: &dyn ObjectSource,
    criteria: &FilterCriteria,
    cancel: &CancellationToken,
) -> Aggregation {
    let mut aggregator = TierAggregator::new(source.name(), criteria);
    let mut error = None;
    let mut cancelled = false;

    debug!("Enumerating objects in '{}'", source.name());
    match source.objects().await {
        Ok(mut objects) => loop {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            match objects.try_next().await {
                Ok(Some(object)) => aggregator.observe(&object),
                Ok(None) => break,
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        },
        Err(e) => error = Some(e),
    }

    if let Some(e) = &error {
        warn!("Partial statistics for '{}': {}", source.name(), e);
    }

    let statistics = aggregator.finish();
    info!(
        "Analyzed '{}': {} objects, {} matching",
        statistics.name,
        statistics.all.total_count(),
        statistics.matching.total_count()
    );

    Aggregation {
        statistics,
        error,
        cancelled,
    }
}

/// Aggregate several sources, at most `concurrency` at a time.
///
/// Results are returned in the order of `sources`.
pub async fn aggregate_sources(
    sources: &[Box<dyn ObjectSource>],
    criteria: &FilterCriteria,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<Aggregation> {
    futures::stream::iter(sources.iter())
        .map(|source| aggregate_source(source.as_ref(), criteria, cancel))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
