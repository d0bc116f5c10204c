//! Occurrence compositor: merges rule expansion with exclusions and overrides.
//!
//! For a window, each series contributes
//! - one base-derived occurrence per in-window anchor that is not excluded, and
//! - one override occurrence per override whose anchor is excluded and whose
//!   own interval overlaps the window.
//!
//! An override is matched against the window by its *own* interval, never by
//! its anchor: an occurrence moved into the window shows up, one moved out of
//! it does not. An override whose anchor is not excluded is ignored so an
//! anchor never renders twice.

use std::cmp::Ordering;

use crate::models::{Occurrence, Override, Series, TimeWindow};
use crate::overrides::OverrideIndex;
use crate::recurrence::RecurrenceEvaluator;

#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor {
    evaluator: RecurrenceEvaluator,
}

impl Compositor {
    pub fn new(evaluator: RecurrenceEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &RecurrenceEvaluator {
        &self.evaluator
    }

    /// Occurrences of a single series in `window`, sorted.
    pub fn compose_series(
        &self,
        series: &Series,
        overrides: &OverrideIndex,
        window: TimeWindow,
    ) -> Vec<Occurrence> {
        let mut occurrences = Vec::new();
        self.collect_series(series, overrides, window, &mut occurrences);
        occurrences.sort_by(occurrence_order);
        occurrences
    }

    /// Occurrences of every series in `window`, globally sorted by start with
    /// ties broken by `(series id, anchor)`.
    pub fn compose<'a, I>(&self, series: I, overrides: &OverrideIndex, window: TimeWindow) -> Vec<Occurrence>
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let mut occurrences = Vec::new();
        for item in series {
            self.collect_series(item, overrides, window, &mut occurrences);
        }
        occurrences.sort_by(occurrence_order);
        occurrences
    }

    fn collect_series(
        &self,
        series: &Series,
        overrides: &OverrideIndex,
        window: TimeWindow,
        out: &mut Vec<Occurrence>,
    ) {
        let derived_from_base = series.is_recurring();

        for anchor in self.evaluator.anchors_for(series, window) {
            if series.exclusions.contains(anchor.start) {
                continue;
            }
            out.push(Occurrence {
                logical_event_id: series.id,
                source_id: series.id,
                anchor: anchor.start,
                start: anchor.start,
                end: anchor.end,
                title: series.title.clone(),
                description: series.description.clone(),
                derived_from_base,
                is_override: false,
                owner_id: series.owner_id,
            });
        }

        out.extend(
            overrides
                .for_series(series.id)
                .filter(|record| series.exclusions.contains(record.anchor))
                .filter(|record| window.overlaps(record.start, record.end))
                .map(override_occurrence),
        );
    }
}

fn override_occurrence(record: &Override) -> Occurrence {
    Occurrence {
        logical_event_id: record.series_id,
        source_id: record.id,
        anchor: record.anchor,
        start: record.start,
        end: record.end,
        title: record.title.clone(),
        description: record.description.clone(),
        derived_from_base: false,
        is_override: true,
        owner_id: record.owner_id,
    }
}

fn occurrence_order(a: &Occurrence, b: &Occurrence) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| a.logical_event_id.cmp(&b.logical_event_id))
        .then_with(|| a.anchor.cmp(&b.anchor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::ExclusionSet;
    use crate::models::{Frequency, Recurrence, RecurrenceBound};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn january() -> TimeWindow {
        TimeWindow::new(at(1, 1, 0), at(1, 31, 23)).unwrap()
    }

    fn weekly_standup() -> Series {
        Series {
            id: Uuid::now_v7(),
            title: "Standup".to_string(),
            description: Some("Daily sync".to_string()),
            start: at(1, 1, 10),
            end: at(1, 1, 11),
            recurrence: Recurrence::repeating(Frequency::Weekly, RecurrenceBound::Count(3)),
            exclusions: ExclusionSet::new(),
            owner_id: Uuid::now_v7(),
            revision: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn moved(series: &Series, anchor: DateTime<Utc>, start: DateTime<Utc>) -> Override {
        Override {
            id: Uuid::now_v7(),
            series_id: series.id,
            anchor,
            title: "Standup (moved)".to_string(),
            description: None,
            start,
            end: start + Duration::hours(1),
            owner_id: series.owner_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn starts(occurrences: &[Occurrence]) -> Vec<DateTime<Utc>> {
        occurrences.iter().map(|o| o.start).collect()
    }

    mod single_series_tests {
        use super::*;

        #[test]
        fn test_base_occurrences_are_tagged() {
            let series = weekly_standup();
            let result = Compositor::default().compose_series(&series, &OverrideIndex::new(), january());

            assert_eq!(starts(&result), vec![at(1, 1, 10), at(1, 8, 10), at(1, 15, 10)]);
            for occurrence in &result {
                assert_eq!(occurrence.logical_event_id, series.id);
                assert_eq!(occurrence.source_id, series.id);
                assert_eq!(occurrence.anchor, occurrence.start);
                assert_eq!(occurrence.end - occurrence.start, Duration::hours(1));
                assert!(occurrence.derived_from_base);
                assert!(!occurrence.is_override);
            }
        }

        #[test]
        fn test_excluded_anchor_without_override_vanishes() {
            let mut series = weekly_standup();
            series.exclusions.insert(at(1, 8, 10));

            let result = Compositor::default().compose_series(&series, &OverrideIndex::new(), january());
            assert_eq!(starts(&result), vec![at(1, 1, 10), at(1, 15, 10)]);
        }

        #[test]
        fn test_override_replaces_its_anchor() {
            let mut series = weekly_standup();
            series.exclusions.insert(at(1, 8, 10));
            let record = moved(&series, at(1, 8, 10), at(1, 9, 14));
            let record_id = record.id;
            let index: OverrideIndex = std::iter::once(record).collect();

            let result = Compositor::default().compose_series(&series, &index, january());

            assert_eq!(starts(&result), vec![at(1, 1, 10), at(1, 9, 14), at(1, 15, 10)]);
            let edited = &result[1];
            assert!(edited.is_override);
            assert!(!edited.derived_from_base);
            assert_eq!(edited.source_id, record_id);
            assert_eq!(edited.anchor, at(1, 8, 10));
            assert_eq!(edited.title, "Standup (moved)");
            assert!(result.iter().all(|o| o.start != at(1, 8, 10)));
        }

        #[test]
        fn test_override_is_matched_by_its_own_interval() {
            let mut series = weekly_standup();
            series.exclusions.insert(at(1, 15, 10));
            let mut index = OverrideIndex::new();
            index.insert(moved(&series, at(1, 15, 10), at(2, 2, 9)));

            // moved out of January: gone from January, present in February
            let jan = Compositor::default().compose_series(&series, &index, january());
            assert_eq!(starts(&jan), vec![at(1, 1, 10), at(1, 8, 10)]);

            let feb = TimeWindow::new(at(2, 1, 0), at(2, 29, 0)).unwrap();
            let result = Compositor::default().compose_series(&series, &index, feb);
            assert_eq!(result.len(), 1);
            assert!(result[0].is_override);
            assert_eq!(result[0].start, at(2, 2, 9));
        }

        #[test]
        fn test_override_without_exclusion_is_ignored() {
            let series = weekly_standup();
            let mut index = OverrideIndex::new();
            index.insert(moved(&series, at(1, 8, 10), at(1, 9, 14)));

            let result = Compositor::default().compose_series(&series, &index, january());
            assert_eq!(starts(&result), vec![at(1, 1, 10), at(1, 8, 10), at(1, 15, 10)]);
            assert!(result.iter().all(|o| !o.is_override));
        }

        #[test]
        fn test_single_event_is_not_derived_from_base() {
            let mut series = weekly_standup();
            series.recurrence = Recurrence::None;

            let result = Compositor::default().compose_series(&series, &OverrideIndex::new(), january());
            assert_eq!(result.len(), 1);
            assert!(!result[0].derived_from_base);
            assert!(!result[0].is_override);
        }
    }

    mod multi_series_tests {
        use super::*;

        #[test]
        fn test_ties_break_by_series_then_anchor() {
            let mut first = weekly_standup();
            let mut second = weekly_standup();
            first.id = Uuid::from_u128(2);
            second.id = Uuid::from_u128(1);

            let compositor = Compositor::default();
            let index = OverrideIndex::new();
            let forward = compositor.compose([&first, &second], &index, january());
            let backward = compositor.compose([&second, &first], &index, january());

            assert_eq!(forward, backward);
            assert_eq!(forward.len(), 6);
            assert_eq!(forward[0].logical_event_id, Uuid::from_u128(1));
            assert_eq!(forward[1].logical_event_id, Uuid::from_u128(2));
            assert!(forward.windows(2).all(|pair| pair[0].start <= pair[1].start));
        }

        #[test]
        fn test_overrides_stay_with_their_series() {
            let mut a = weekly_standup();
            let b = weekly_standup();
            a.exclusions.insert(at(1, 8, 10));
            let mut index = OverrideIndex::new();
            index.insert(moved(&a, at(1, 8, 10), at(1, 9, 14)));

            let result = Compositor::default().compose([&a, &b], &index, january());
            let overrides: Vec<&Occurrence> = result.iter().filter(|o| o.is_override).collect();
            assert_eq!(overrides.len(), 1);
            assert_eq!(overrides[0].logical_event_id, a.id);
            assert_eq!(result.iter().filter(|o| o.logical_event_id == b.id).count(), 3);
        }
    }

    proptest! {
        #[test]
        fn prop_order_ignores_input_order(
            ids in proptest::collection::btree_set(any::<u128>(), 1..6),
            rotate in 0usize..6,
        ) {
            let series: Vec<Series> = ids
                .iter()
                .map(|id| {
                    let mut s = weekly_standup();
                    s.id = Uuid::from_u128(*id);
                    s
                })
                .collect();
            let mut shuffled: Vec<&Series> = series.iter().collect();
            let len = shuffled.len();
            shuffled.rotate_left(rotate % len);

            let compositor = Compositor::default();
            let index = OverrideIndex::new();
            let a = compositor.compose(series.iter(), &index, january());
            let b = compositor.compose(shuffled, &index, january());
            prop_assert_eq!(a, b);
        }
    }
}
