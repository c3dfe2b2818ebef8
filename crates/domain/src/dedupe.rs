//! Order-preserving deduplication

use std::collections::HashSet;
use std::hash::Hash;

use crate::entities::{Departure, Line};

/// Keep the first item for every key, in input order
///
/// ```
/// use domain::dedupe_by_key;
///
/// let items = vec![(1, 'a'), (2, 'b'), (1, 'c')];
/// let unique = dedupe_by_key(items, |item| item.0);
/// assert_eq!(unique, vec![(1, 'a'), (2, 'b')]);
/// ```
pub fn dedupe_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key_fn: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key_fn(item)))
        .collect()
}

/// Keep the first departure per `(key, planned_time)`
///
/// Departures without a planned time cannot be told apart and are all kept.
pub fn dedupe_scheduled<K, F>(
    departures: impl IntoIterator<Item = Departure>,
    mut key_fn: F,
) -> Vec<Departure>
where
    K: Eq + Hash,
    F: FnMut(&Departure) -> K,
{
    let mut seen = HashSet::new();
    departures
        .into_iter()
        .filter(|d| {
            d.planned_time
                .is_none_or(|planned| seen.insert((key_fn(d), planned)))
        })
        .collect()
}

/// Drop departures repeating an earlier `(route_id, planned_time)` pair
///
/// Some backends list the same departure once per platform or per
/// requested stop.
#[must_use]
pub fn filter_identical_departures(departures: Vec<Departure>) -> Vec<Departure> {
    dedupe_scheduled(departures, |d| d.route_id.clone())
}

/// Drop lines repeating an earlier [`LineKey`](crate::LineKey)
#[must_use]
pub fn unique_lines(lines: Vec<Line>) -> Vec<Line> {
    dedupe_by_key(lines, Line::key)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::value_objects::TransportMode;

    #[test]
    fn keeps_first_occurrence() {
        let items = vec![("A", 1), ("B", 2), ("C", 1)];
        let unique = dedupe_by_key(items, |(_, id)| *id);
        assert_eq!(unique, vec![("A", 1), ("B", 2)]);
    }

    #[test]
    fn empty_input() {
        let unique: Vec<u8> = dedupe_by_key(Vec::new(), |x| *x);
        assert!(unique.is_empty());
    }

    #[test]
    fn identical_departures_collapse() {
        let noon = Utc.with_ymd_and_hms(2023, 10, 1, 12, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 10, 1, 23, 6, 0).unwrap();
        let departures = vec![
            Departure::new("line1", "a").with_planned(noon),
            Departure::new("line1", "a").with_planned(noon),
            Departure::new("line2", "a").with_planned(noon),
            Departure::new("line2", "a").with_planned(later),
        ];

        let filtered = filter_identical_departures(departures);
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].route_id, "line1");
        assert_eq!(filtered[1].planned_time, Some(noon));
        assert_eq!(filtered[2].planned_time, Some(later));
    }

    #[test]
    fn unscheduled_departures_are_kept() {
        let noon = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let departures = vec![
            Departure::new("line1", "a"),
            Departure::new("line1", "b"),
            Departure::new("line1", "a").with_planned(noon),
            Departure::new("line1", "a").with_estimated(noon),
        ];

        let filtered = filter_identical_departures(departures);
        assert_eq!(filtered.len(), 4);
        assert_eq!(filtered[1].direction_id, "b");
    }

    #[test]
    fn scheduled_key_includes_caller_fields() {
        let noon = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        let departures = vec![
            Departure::new("line1", "a").with_planned(noon),
            Departure::new("line1", "b").with_planned(noon),
            Departure::new("line1", "a").with_planned(noon),
        ];

        let filtered =
            dedupe_scheduled(departures, |d| (d.route_id.clone(), d.direction_id.clone()));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn lines_dedupe_by_route_and_direction() {
        let lines = vec![
            Line::new("line1", "dest1", "Destination 1", "1", TransportMode::Bus),
            Line::new("line2", "dest2", "Destination 2", "2", TransportMode::Bus),
            Line::new("line1", "dest1", "Other sign", "1", TransportMode::Bus),
            Line::new("line1", "dest2", "Destination 2", "1", TransportMode::Bus),
        ];

        let unique = unique_lines(lines);
        let keys: Vec<_> = unique
            .iter()
            .map(|l| (l.route_id.as_str(), l.direction_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("line1", "dest1"), ("line2", "dest2"), ("line1", "dest2")]
        );
        assert_eq!(unique[0].head_sign, "Destination 1");
    }
}
