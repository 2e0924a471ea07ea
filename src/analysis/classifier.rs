//! Object classification against filter criteria

use crate::analysis::models::{FilterCriteria, StorageObject, Tier};

/// Decide whether `object` is a candidate for a tier change.
///
/// The date window test and the size test are combined with OR: an object
/// that is old enough matches even when it is tiny, and an object that is big
/// enough matches even when it was just written (or its modification time is
/// unknown). Objects already in Archive never match, and neither do objects
/// in a tier outside Hot, Cool and Archive.
pub fn matches(object: &StorageObject, criteria: &FilterCriteria) -> bool {
    if object.unrecognized_tier.is_some() {
        return false;
    }
    let tier = object.effective_tier();
    if tier == Tier::Archive {
        return false;
    }
    if criteria.ignore_cool_tier && tier == Tier::Cool {
        return false;
    }

    let age_ok = object.last_modified.is_some_and(|modified| {
        criteria.modified_after.map_or(true, |after| after <= modified)
            && criteria.modified_before.map_or(true, |before| modified <= before)
    });
    let size_ok = object.size >= criteria.min_size;

    age_ok || size_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    const GB: u64 = 1 << 30;

    fn criteria() -> FilterCriteria {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        FilterCriteria::older_than_days(90, GB, now)
    }

    fn days_ago(days: i64) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() - Duration::days(days)
    }

    #[test]
    fn test_big_object_matches_regardless_of_age() {
        let recent = StorageObject::new("c", "big", 2 * GB).with_last_modified(days_ago(1));
        assert!(matches(&recent, &criteria()));

        let unknown_age = StorageObject::new("c", "big", GB);
        assert!(matches(&unknown_age, &criteria()));
    }

    #[test]
    fn test_old_object_matches_regardless_of_size() {
        let old_tiny = StorageObject::new("c", "tiny", 1)
            .with_tier(Tier::Cool)
            .with_last_modified(days_ago(400));
        assert!(matches(&old_tiny, &criteria()));
    }

    #[test]
    fn test_small_recent_object_does_not_match() {
        let object = StorageObject::new("c", "small", 500 * 1024 * 1024)
            .with_last_modified(days_ago(10));
        assert!(!matches(&object, &criteria()));
    }

    #[test]
    fn test_unknown_age_fails_date_test() {
        let object = StorageObject::new("c", "small", 10);
        assert!(!matches(&object, &criteria()));
    }

    #[test]
    fn test_archive_never_matches() {
        let object = StorageObject::new("c", "frozen", 10 * GB)
            .with_tier(Tier::Archive)
            .with_last_modified(days_ago(1000));
        assert!(!matches(&object, &criteria()));
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let mut criteria = criteria();
        criteria.min_size = u64::MAX;
        criteria.modified_after = Some(days_ago(200));

        let at_bound = StorageObject::new("c", "edge", 1).with_last_modified(days_ago(200));
        assert!(matches(&at_bound, &criteria));

        let before_bound = StorageObject::new("c", "older", 1).with_last_modified(days_ago(201));
        assert!(!matches(&before_bound, &criteria));
    }

    #[test]
    fn test_unbounded_window_matches_any_known_date() {
        let criteria = FilterCriteria {
            min_size: u64::MAX,
            ..FilterCriteria::default()
        };
        let object = StorageObject::new("c", "any", 0).with_last_modified(days_ago(0));
        assert!(matches(&object, &criteria));
    }

    #[test]
    fn test_unrecognized_tier_never_matches() {
        let cold = StorageObject::new("c", "cold", 10 * GB)
            .with_last_modified(days_ago(1000))
            .with_unrecognized_tier("Cold");
        assert_eq!(cold.effective_tier(), Tier::Hot);
        assert!(!matches(&cold, &criteria()));
    }

    #[test]
    fn test_ignore_cool_tier() {
        let criteria = criteria().ignoring_cool_tier(true);
        let cool = StorageObject::new("c", "cool", 5 * GB).with_tier(Tier::Cool);
        let hot = StorageObject::new("c", "hot", 5 * GB).with_tier(Tier::Hot);
        assert!(!matches(&cool, &criteria));
        assert!(matches(&hot, &criteria));
    }
}
