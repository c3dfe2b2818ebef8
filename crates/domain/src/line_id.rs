//! Line identifier helpers
//!
//! EFA-style line ids carry the timetable's service year as a `j` + two-digit
//! segment, e.g. `van:02067: :R:j25`. The segment changes at each annual
//! timetable rollover, so ids that should identify the same line differ
//! between years.

use chrono::Local;

use crate::entities::Departure;

/// Replacement for the year digits in year-stable ids
pub const YEAR_PLACEHOLDER: &str = "xx";

const SEGMENT_SEPARATOR: char = ':';

fn is_year_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 3 && bytes[0] == b'j' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Two-digit current year in local time, e.g. `"25"`
#[must_use]
pub fn current_service_year() -> String {
    Local::now().format("%y").to_string()
}

/// Replace every year segment's digits with `replacement`
///
/// Ids without a year segment are returned unchanged.
#[must_use]
pub fn replace_year_token_with(line_id: &str, replacement: &str) -> String {
    line_id
        .split(SEGMENT_SEPARATOR)
        .map(|segment| {
            if is_year_segment(segment) {
                format!("j{replacement}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(&SEGMENT_SEPARATOR.to_string())
}

/// Replace the year segment with `jxx` or with the current year
///
/// ```
/// use domain::replace_year_token;
///
/// assert_eq!(replace_year_token("van:02067: :R:j25", true), "van:02067: :R:jxx");
/// assert_eq!(replace_year_token("van:02067: :R:s25", true), "van:02067: :R:s25");
/// ```
#[must_use]
pub fn replace_year_token(line_id: &str, use_placeholder: bool) -> String {
    if use_placeholder {
        replace_year_token_with(line_id, YEAR_PLACEHOLDER)
    } else {
        replace_year_token_with(line_id, &current_service_year())
    }
}

/// Compare two line ids, optionally ignoring the service year
#[must_use]
pub fn compare_line_ids(a: &str, b: &str, compare_year: bool) -> bool {
    if compare_year || a == b {
        return a == b;
    }
    replace_year_token_with(a, YEAR_PLACEHOLDER) == replace_year_token_with(b, YEAR_PLACEHOLDER)
}

/// Departures whose route id matches `line_id`
///
/// With `match_year` the ids must be equal; otherwise the year segment is
/// ignored so departures from an older or newer timetable still match.
#[must_use]
pub fn filter_by_line_id<'a>(
    departures: &'a [Departure],
    line_id: &str,
    match_year: bool,
) -> Vec<&'a Departure> {
    departures
        .iter()
        .filter(|d| compare_line_ids(&d.route_id, line_id, match_year))
        .collect()
}
