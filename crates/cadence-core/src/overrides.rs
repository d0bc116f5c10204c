//! In-memory index of occurrence overrides.
//!
//! Records are grouped per series and ordered by anchor (epoch ms) inside each
//! group, so reading one series' overrides never touches another's. Overrides
//! are addressed independently of their series; nothing here holds a
//! reference back to a `Series`.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{truncate_to_millis, Override};

#[inline]
fn anchor_key(anchor: DateTime<Utc>) -> i64 {
    truncate_to_millis(anchor).timestamp_millis()
}

#[derive(Debug, Clone, Default)]
pub struct OverrideIndex {
    by_series: HashMap<Uuid, BTreeMap<i64, Override>>,
    len: usize,
}

impl OverrideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a loaded record. A record already present at the same
    /// `(series, anchor)` is replaced.
    pub fn insert(&mut self, record: Override) {
        let replaced = self
            .by_series
            .entry(record.series_id)
            .or_default()
            .insert(anchor_key(record.anchor), record);
        if replaced.is_none() {
            self.len += 1;
        }
    }

    /// Overrides belonging to one series, in anchor order.
    pub fn for_series(&self, series_id: Uuid) -> impl Iterator<Item = &Override> + '_ {
        self.by_series
            .get(&series_id)
            .into_iter()
            .flat_map(|records| records.values())
    }
}

impl FromIterator<Override> for OverrideIndex {
    fn from_iter<I: IntoIterator<Item = Override>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap()
    }

    fn record(series_id: Uuid, anchor: DateTime<Utc>, title: &str) -> Override {
        let start = anchor + Duration::days(1);
        Override {
            id: Uuid::now_v7(),
            series_id,
            anchor,
            title: title.to_string(),
            description: None,
            start,
            end: start + Duration::hours(1),
            owner_id: Uuid::nil(),
            created_at: start,
            updated_at: start,
        }
    }

    fn titles<'a>(index: &'a OverrideIndex, series_id: Uuid) -> Vec<&'a str> {
        index.for_series(series_id).map(|o| o.title.as_str()).collect()
    }

    #[test]
    fn test_for_series_is_scoped_and_ordered_by_anchor() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let index: OverrideIndex = vec![
            record(a, anchor() + Duration::days(14), "A3"),
            record(b, anchor(), "B1"),
            record(a, anchor(), "A1"),
            record(a, anchor() + Duration::days(7), "A2"),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.len(), 4);
        assert_eq!(titles(&index, a), vec!["A1", "A2", "A3"]);
        assert_eq!(titles(&index, b), vec!["B1"]);
        assert_eq!(index.for_series(Uuid::now_v7()).count(), 0);
    }

    #[test]
    fn test_same_anchor_keeps_last_record() {
        let series_id = Uuid::now_v7();
        let older = record(series_id, anchor(), "old");
        let mut newer = older.clone();
        newer.title = "new".to_string();

        let index: OverrideIndex = vec![older, newer].into_iter().collect();
        assert_eq!(index.len(), 1);
        assert_eq!(titles(&index, series_id), vec!["new"]);
    }

    #[test]
    fn test_anchors_compare_at_millisecond_precision() {
        let series_id = Uuid::now_v7();
        let mut index = OverrideIndex::new();
        index.insert(record(series_id, anchor(), "first"));
        index.insert(record(series_id, anchor() + Duration::microseconds(400), "same ms"));
        index.insert(record(series_id, anchor() + Duration::milliseconds(1), "next ms"));

        assert_eq!(index.len(), 2);
        assert_eq!(titles(&index, series_id), vec!["same ms", "next ms"]);
    }
}
