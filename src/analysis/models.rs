//! Data models for tier analysis
//!
//! This module defines the storage tier enum, the read-only view of a stored
//! object, the filter criteria and the per-tier statistics that the
//! aggregator folds objects into.

use crate::error::{BlobTierError, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Storage access tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Tier {
    Hot,
    Cool,
    Archive,
}

/// Direction of a tier change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Hot → Cool, Hot → Archive, Cool → Archive
    Cooling,
    /// Archive → Hot, Archive → Cool, Cool → Hot
    Warming,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Hot, Tier::Cool, Tier::Archive];

    /// Classify a move from `self` to `target`. `None` when the tiers are equal.
    pub fn transition_to(self, target: Tier) -> Option<Transition> {
        match (self, target) {
            (Tier::Hot, Tier::Cool) | (Tier::Hot, Tier::Archive) | (Tier::Cool, Tier::Archive) => {
                Some(Transition::Cooling)
            }
            (Tier::Archive, Tier::Hot) | (Tier::Archive, Tier::Cool) | (Tier::Cool, Tier::Hot) => {
                Some(Transition::Warming)
            }
            _ => None,
        }
    }

    /// All tiers except `target`, in canonical order
    pub fn others(target: Tier) -> Vec<Tier> {
        Tier::ALL.into_iter().filter(|t| *t != target).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hot => "Hot",
            Tier::Cool => "Cool",
            Tier::Archive => "Archive",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = BlobTierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "h" | "hot" => Ok(Tier::Hot),
            "c" | "cool" => Ok(Tier::Cool),
            "a" | "archive" => Ok(Tier::Archive),
            other => Err(BlobTierError::invalid_argument(format!(
                "Unknown tier '{other}'. Expected one of: hot, cool, archive"
            ))),
        }
    }
}

/// Identity of a stored object: enough to address it for a tier change
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub container: String,
    pub name: String,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Read-only view of an object reported by a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    pub container: String,
    pub name: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub tier: Option<Tier>,
    /// Tier name the backend reported but that is not Hot, Cool or Archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unrecognized_tier: Option<String>,
}

impl StorageObject {
    pub fn new<C: Into<String>, N: Into<String>>(container: C, name: N, size: u64) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
            size,
            last_modified: None,
            tier: None,
            unrecognized_tier: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Mark the object as stored in a tier the analysis does not model
    pub fn with_unrecognized_tier<S: Into<String>>(mut self, tier: S) -> Self {
        self.unrecognized_tier = Some(tier.into());
        self
    }

    /// Reported tier, or Hot when the backend reports none
    pub fn effective_tier(&self) -> Tier {
        self.tier.unwrap_or(Tier::Hot)
    }

    pub fn id(&self) -> ObjectId {
        ObjectId {
            container: self.container.clone(),
            name: self.name.clone(),
        }
    }
}

/// Filter that selects candidate objects for a tier change.
///
/// An object matches when it was modified inside the date window OR is at
/// least `min_size` bytes. Archive objects never match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub min_size: u64,
    pub modified_after: Option<DateTime<Utc>>,
    pub modified_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ignore_cool_tier: bool,
}

impl FilterCriteria {
    /// Objects last modified on or before midnight UTC `days` days before `now`
    pub fn older_than_days(days: u32, min_size: u64, now: DateTime<Utc>) -> Self {
        let cutoff_date = now.date_naive() - Duration::days(i64::from(days));
        let cutoff = cutoff_date.and_time(NaiveTime::MIN).and_utc();
        Self {
            min_size,
            modified_after: None,
            modified_before: Some(cutoff),
            ignore_cool_tier: false,
        }
    }

    pub fn ignoring_cool_tier(mut self, ignore: bool) -> Self {
        self.ignore_cool_tier = ignore;
        self
    }
}

/// An object recorded in a matching bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedObject {
    pub id: ObjectId,
    pub size: u64,
}

/// Count, size and (for matching buckets) members of one tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerTierStats {
    pub count: u64,
    pub total_size_bytes: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub members: Vec<MatchedObject>,
}

impl PerTierStats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Per-tier statistics for one bucket kind (all objects, matching objects, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierBuckets(BTreeMap<Tier, PerTierStats>);

impl Default for TierBuckets {
    fn default() -> Self {
        Self(Tier::ALL.into_iter().map(|t| (t, PerTierStats::default())).collect())
    }
}

impl TierBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tier: Tier) -> &PerTierStats {
        static EMPTY: PerTierStats = PerTierStats {
            count: 0,
            total_size_bytes: 0,
            members: Vec::new(),
        };
        self.0.get(&tier).unwrap_or(&EMPTY)
    }

    fn entry(&mut self, tier: Tier) -> &mut PerTierStats {
        self.0.entry(tier).or_default()
    }

    /// Add one object to `tier`; `member` is kept only when given
    pub fn record(&mut self, tier: Tier, size: u64, member: Option<ObjectId>) {
        let stats = self.entry(tier);
        stats.count += 1;
        stats.total_size_bytes += size;
        if let Some(id) = member {
            stats.members.push(MatchedObject { id, size });
        }
    }

    /// Take `count` objects totalling `size` bytes out of `tier`
    fn release(&mut self, tier: Tier, count: u64, size: u64) {
        let stats = self.entry(tier);
        stats.count = stats.count.saturating_sub(count);
        stats.total_size_bytes = stats.total_size_bytes.saturating_sub(size);
    }

    /// Remove every member of `tier` whose id is in `ids`, in one pass
    fn take_members(&mut self, tier: Tier, ids: &HashSet<&ObjectId>) -> Vec<MatchedObject> {
        let stats = self.entry(tier);
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut stats.members)
            .into_iter()
            .partition(|m| ids.contains(&m.id));
        stats.members = kept;
        taken
    }

    /// Element-wise sum; members of `other` are appended after ours
    pub fn merge(&mut self, other: &TierBuckets) {
        for (tier, theirs) in other.iter() {
            let ours = self.entry(tier);
            ours.count += theirs.count;
            ours.total_size_bytes += theirs.total_size_bytes;
            ours.members.extend(theirs.members.iter().cloned());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, &PerTierStats)> {
        self.0.iter().map(|(t, s)| (*t, s))
    }

    pub fn total_count(&self) -> u64 {
        self.0.values().map(|s| s.count).sum()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.0.values().map(|s| s.total_size_bytes).sum()
    }
}

/// Statistics of one source (container or folder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatistics {
    pub name: String,
    pub all: TierBuckets,
    pub matching: TierBuckets,
}

impl ContainerStatistics {
    pub const SUMMARY_NAME: &'static str = "Summary";

    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            all: TierBuckets::new(),
            matching: TierBuckets::new(),
        }
    }

    /// Element-wise sum of every given statistics, in iteration order
    pub fn summary<'a, I>(statistics: I) -> Self
    where
        I: IntoIterator<Item = &'a ContainerStatistics>,
    {
        let mut summary = Self::new(Self::SUMMARY_NAME);
        for stats in statistics {
            summary.merge(stats);
        }
        summary
    }

    pub fn merge(&mut self, other: &ContainerStatistics) {
        self.all.merge(&other.all);
        self.matching.merge(&other.matching);
    }

    /// Move the matched objects `ids` from `source` to `target` in both buckets.
    ///
    /// Ids that are not members of the source tier's matching bucket are
    /// skipped. Returns the number of objects moved.
    pub fn move_objects(&mut self, ids: &HashSet<&ObjectId>, source: Tier, target: Tier) -> usize {
        if source == target || ids.is_empty() {
            return 0;
        }
        let moved = self.matching.take_members(source, ids);
        if moved.is_empty() {
            return 0;
        }
        let count = moved.len() as u64;
        let size: u64 = moved.iter().map(|m| m.size).sum();

        self.matching.release(source, count, size);
        self.all.release(source, count, size);

        let all = self.all.entry(target);
        all.count += count;
        all.total_size_bytes += size;
        let matching = self.matching.entry(target);
        matching.count += count;
        matching.total_size_bytes += size;
        matching.members.extend(moved);

        count as usize
    }

    /// Move one matched object; false when it is not a member of `source`
    pub fn move_object(&mut self, id: &ObjectId, source: Tier, target: Tier) -> bool {
        self.move_objects(&HashSet::from([id]), source, target) == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tier_parsing() {
        assert_eq!("hot".parse::<Tier>().unwrap(), Tier::Hot);
        assert_eq!("C".parse::<Tier>().unwrap(), Tier::Cool);
        assert_eq!(" Archive ".parse::<Tier>().unwrap(), Tier::Archive);
        assert!("premium".parse::<Tier>().is_err());
    }

    #[test]
    fn test_transitions_are_explicit() {
        assert_eq!(Tier::Hot.transition_to(Tier::Cool), Some(Transition::Cooling));
        assert_eq!(Tier::Hot.transition_to(Tier::Archive), Some(Transition::Cooling));
        assert_eq!(Tier::Cool.transition_to(Tier::Archive), Some(Transition::Cooling));
        assert_eq!(Tier::Archive.transition_to(Tier::Hot), Some(Transition::Warming));
        assert_eq!(Tier::Archive.transition_to(Tier::Cool), Some(Transition::Warming));
        assert_eq!(Tier::Cool.transition_to(Tier::Hot), Some(Transition::Warming));
        assert_eq!(Tier::Cool.transition_to(Tier::Cool), None);
    }

    #[test]
    fn test_effective_tier_defaults_to_hot() {
        let object = StorageObject::new("c", "a.bin", 1);
        assert_eq!(object.effective_tier(), Tier::Hot);
        assert_eq!(object.with_tier(Tier::Cool).effective_tier(), Tier::Cool);
    }

    #[test]
    fn test_older_than_days_uses_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 17, 45, 12).unwrap();
        let criteria = FilterCriteria::older_than_days(30, 1024, now);
        assert_eq!(
            criteria.modified_before,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(criteria.modified_after, None);
        assert_eq!(criteria.min_size, 1024);
    }

    #[test]
    fn test_buckets_start_with_every_tier() {
        let buckets = TierBuckets::new();
        for tier in Tier::ALL {
            assert!(buckets.get(tier).is_empty());
        }
        assert_eq!(buckets.total_count(), 0);
    }

    #[test]
    fn test_move_object_conserves_totals() {
        let mut stats = ContainerStatistics::new("photos");
        let id = ObjectId {
            container: "photos".to_string(),
            name: "a.jpg".to_string(),
        };
        stats.all.record(Tier::Hot, 100, None);
        stats.all.record(Tier::Hot, 50, None);
        stats.matching.record(Tier::Hot, 100, Some(id.clone()));

        assert!(stats.move_object(&id, Tier::Hot, Tier::Archive));

        assert_eq!(stats.matching.get(Tier::Hot).count, 0);
        assert_eq!(stats.matching.get(Tier::Archive).count, 1);
        assert_eq!(stats.matching.get(Tier::Archive).members[0].id, id);
        assert_eq!(stats.all.get(Tier::Hot).count, 1);
        assert_eq!(stats.all.get(Tier::Hot).total_size_bytes, 50);
        assert_eq!(stats.all.get(Tier::Archive).total_size_bytes, 100);
        assert_eq!(stats.all.total_count(), 2);

        // already moved
        assert!(!stats.move_object(&id, Tier::Hot, Tier::Archive));
        assert_eq!(stats.all.total_count(), 2);
    }

    #[test]
    fn test_move_objects_in_bulk() {
        let mut stats = ContainerStatistics::new("logs");
        let ids: Vec<ObjectId> = (0..1000)
            .map(|i| ObjectId {
                container: "logs".to_string(),
                name: format!("{i:04}.log"),
            })
            .collect();
        for id in &ids {
            stats.all.record(Tier::Cool, 10, None);
            stats.matching.record(Tier::Cool, 10, Some(id.clone()));
        }

        let even: HashSet<&ObjectId> = ids.iter().step_by(2).collect();
        assert_eq!(stats.move_objects(&even, Tier::Cool, Tier::Archive), 500);

        assert_eq!(stats.matching.get(Tier::Cool).count, 500);
        assert_eq!(stats.matching.get(Tier::Cool).members.len(), 500);
        assert_eq!(stats.matching.get(Tier::Cool).members[0].id.name, "0001.log");
        assert_eq!(stats.matching.get(Tier::Archive).total_size_bytes, 5000);
        assert_eq!(stats.all.get(Tier::Cool).count, 500);
        assert_eq!(stats.all.total_size_bytes(), 10_000);

        // wrong source tier moves nothing
        assert_eq!(stats.move_objects(&even, Tier::Hot, Tier::Archive), 0);
        assert_eq!(stats.all.get(Tier::Archive).count, 500);
    }
}
