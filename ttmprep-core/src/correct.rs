//! Post-processing of raw travel times
//!
//! Row order and extra columns are preserved; only `travel_time` changes.

use crate::{AccessTimes, TravelTimeRecord};

/// Zero-duration trips for identical origin and destination, whatever the
/// routing engine reported
pub fn clean_same_same_od_pairs(records: &mut [TravelTimeRecord]) {
    for record in records.iter_mut().filter(|record| record.is_same_place()) {
        record.travel_time = Some(0);
    }
}

/// Adds the walk from the origin to its snapped point and from the
/// destination's snapped point to the destination.
///
/// Identical origin/destination pairs and unreachable pairs are left alone.
/// Ids without an access time add nothing.
pub fn add_access_times(records: &mut [TravelTimeRecord], access_times: &AccessTimes) {
    for record in records.iter_mut().filter(|record| !record.is_same_place()) {
        if let Some(travel_time) = record.travel_time.as_mut() {
            *travel_time = travel_time
                .saturating_add(i64::from(access_times.get(&record.from_id)))
                .saturating_add(i64::from(access_times.get(&record.to_id)));
        }
    }
}

/// Applies both corrections
pub fn correct_travel_times(
    mut records: Vec<TravelTimeRecord>,
    access_times: &AccessTimes,
) -> Vec<TravelTimeRecord> {
    add_access_times(&mut records, access_times);
    clean_same_same_od_pairs(&mut records);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_times() -> AccessTimes {
        [("a".to_string(), 2), ("b".to_string(), 3)]
            .into_iter()
            .collect()
    }

    #[test]
    fn same_place_is_always_zero() {
        let records = vec![
            TravelTimeRecord::new("a", "a", Some(7)),
            TravelTimeRecord::new("b", "b", Some(-4)),
            TravelTimeRecord::new("a", "a", Some(i64::MAX)),
            TravelTimeRecord::new("x", "x", None),
        ];
        let corrected = correct_travel_times(records, &access_times());
        assert!(corrected.iter().all(|r| r.travel_time == Some(0)));
    }

    #[test]
    fn adds_both_ends() {
        let records = vec![
            TravelTimeRecord::new("a", "b", Some(12)),
            TravelTimeRecord::new("b", "a", Some(10)),
        ];
        let corrected = correct_travel_times(records, &access_times());
        assert_eq!(corrected[0].travel_time, Some(17));
        assert_eq!(corrected[1].travel_time, Some(15));
    }

    #[test]
    fn unknown_ids_and_unreachable_pairs() {
        let records = vec![
            TravelTimeRecord::new("a", "unknown", Some(12)),
            TravelTimeRecord::new("a", "b", None),
        ];
        let corrected = correct_travel_times(records, &access_times());
        assert_eq!(corrected[0].travel_time, Some(14));
        assert_eq!(corrected[1].travel_time, None);
    }

    #[test]
    fn keeps_order_and_extra_columns() {
        let mut first = TravelTimeRecord::new("b", "a", Some(1));
        first.extra = vec!["walk".to_string(), "x".to_string()];
        let records = vec![first, TravelTimeRecord::new("a", "a", Some(9))];
        let corrected = correct_travel_times(records, &access_times());
        assert_eq!(corrected[0].from_id, "b");
        assert_eq!(corrected[0].extra, ["walk", "x"]);
        assert_eq!(corrected[1].from_id, "a");
    }
}
