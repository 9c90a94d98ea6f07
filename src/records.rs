use std::collections::VecDeque;

use tracing::warn;

use crate::duration::{parse_duration, RecordedTime};

/// Number of newest records covered by the short-window average.
pub const RECENT_WINDOW: usize = 5;

/// Ordered history of completed timings, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordList {
    entries: VecDeque<RecordedTime>,
}

impl RecordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new timing at the front of the list.
    pub fn prepend(&mut self, time: RecordedTime) {
        self.entries.push_front(time);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest-first iteration, the same order used on screen and on disk.
    pub fn iter(&self) -> impl Iterator<Item = &RecordedTime> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<RecordedTime> {
        self.entries.front().copied()
    }

    /// Encode as a JSON array of `MM:SS:mmm` strings, newest first.
    pub fn to_snapshot(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.entries)
    }

    /// Decode a snapshot written by [`RecordList::to_snapshot`].
    ///
    /// Anything that is not a JSON array of strings yields an empty list.
    /// Strings that are not `MM:SS:mmm` are dropped individually.
    pub fn from_snapshot(raw: &str) -> Self {
        let strings: Vec<String> = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "discarding unreadable record snapshot");
                return Self::default();
            }
        };

        let entries = strings
            .iter()
            .filter_map(|s| match parse_duration(s) {
                Ok(ms) => Some(RecordedTime::from_millis(ms)),
                Err(e) => {
                    warn!(entry = %s, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect();

        Self { entries }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            average: mean(self.entries.iter()),
            count: self.entries.len(),
            recent_average: if self.entries.len() >= RECENT_WINDOW {
                mean(self.entries.iter().take(RECENT_WINDOW))
            } else {
                None
            },
        }
    }
}

impl FromIterator<RecordedTime> for RecordList {
    /// Collects in the given order, which is taken to be newest first.
    fn from_iter<I: IntoIterator<Item = RecordedTime>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Arithmetic mean rounded to the nearest millisecond.
fn mean<'a>(times: impl Iterator<Item = &'a RecordedTime>) -> Option<RecordedTime> {
    let (sum, count) = times.fold((0u128, 0u128), |(sum, count), t| {
        (sum + u128::from(t.as_millis()), count + 1)
    });

    match count {
        0 => None,
        n => {
            let rounded = (sum + n / 2) / n;
            Some(RecordedTime::from_millis(
                u64::try_from(rounded).unwrap_or(u64::MAX),
            ))
        }
    }
}

/// Values derived from the record list after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub average: Option<RecordedTime>,
    pub count: usize,
    pub recent_average: Option<RecordedTime>,
}

impl Summary {
    pub fn average_text(&self) -> String {
        format!("Average Time: {}", or_na(self.average))
    }

    pub fn count_text(&self) -> String {
        format!("Solve Count: {}", self.count)
    }

    pub fn recent_average_text(&self) -> String {
        format!("Last {RECENT_WINDOW} Average: {}", or_na(self.recent_average))
    }
}

fn or_na(time: Option<RecordedTime>) -> String {
    time.map(|t| t.to_string()).unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> RecordedTime {
        RecordedTime::from_millis(v)
    }

    #[test]
    fn prepend_keeps_newest_first() {
        let mut list = RecordList::new();
        list.prepend(ms(1));
        list.prepend(ms(2));
        list.prepend(ms(3));
        let order: Vec<u64> = list.iter().map(|t| t.as_millis()).collect();
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(list.newest(), Some(ms(3)));
    }

    #[test]
    fn average_of_three() {
        let list: RecordList = [ms(1_000), ms(2_000), ms(3_000)].into_iter().collect();
        let summary = list.summary();
        assert_eq!(summary.average, Some(ms(2_000)));
        assert_eq!(summary.average_text(), "Average Time: 00:02:000");
        assert_eq!(summary.count_text(), "Solve Count: 3");
    }

    #[test]
    fn average_rounds_to_nearest_millisecond() {
        let list: RecordList = [ms(1), ms(2)].into_iter().collect();
        assert_eq!(list.summary().average, Some(ms(2)));

        let list: RecordList = [ms(1), ms(1), ms(2)].into_iter().collect();
        assert_eq!(list.summary().average, Some(ms(1)));
    }

    #[test]
    fn empty_summary_is_not_available() {
        let summary = RecordList::new().summary();
        assert_eq!(summary.average, None);
        assert_eq!(summary.average_text(), "Average Time: N/A");
        assert_eq!(summary.count_text(), "Solve Count: 0");
        assert_eq!(summary.recent_average_text(), "Last 5 Average: N/A");
    }

    #[test]
    fn zero_average_still_shows_a_time() {
        let list: RecordList = [ms(0)].into_iter().collect();
        assert_eq!(list.summary().average_text(), "Average Time: 00:00:000");
    }

    #[test]
    fn recent_average_needs_a_full_window() {
        let list: RecordList = [ms(1_000); 4].into_iter().collect();
        assert_eq!(list.summary().recent_average, None);

        let list: RecordList = [ms(1_000), ms(2_000), ms(3_000), ms(4_000), ms(5_000), ms(60_000)]
            .into_iter()
            .collect();
        let summary = list.summary();
        assert_eq!(summary.recent_average, Some(ms(3_000)));
        assert_eq!(summary.recent_average_text(), "Last 5 Average: 00:03:000");
        assert_eq!(summary.average, Some(ms(12_500)));
    }

    #[test]
    fn snapshot_preserves_order() {
        let mut list = RecordList::new();
        list.prepend(ms(1_000));
        list.prepend(ms(61_234));
        let raw = list.to_snapshot().unwrap();
        assert_eq!(raw, r#"["01:01:234","00:01:000"]"#);
        assert_eq!(RecordList::from_snapshot(&raw), list);
    }

    #[test]
    fn unreadable_snapshot_is_empty() {
        assert!(RecordList::from_snapshot("not json").is_empty());
        assert!(RecordList::from_snapshot("null").is_empty());
        assert!(RecordList::from_snapshot(r#"{"a":1}"#).is_empty());
        assert!(RecordList::from_snapshot("[1,2,3]").is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let list = RecordList::from_snapshot(r#"["00:01:000","garbage","00:02:000"]"#);
        let order: Vec<u64> = list.iter().map(|t| t.as_millis()).collect();
        assert_eq!(order, vec![1_000, 2_000]);
    }

    #[test]
    fn clear_empties_the_list() {
        let mut list: RecordList = [ms(5)].into_iter().collect();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }
}
