use chrono::{DateTime, Days, Duration, Months, Utc};

use crate::models::{Frequency, Recurrence, RecurrenceBound, Series, TimeWindow};

/// Default safety fuse for a single expansion.
pub const DEFAULT_ITERATION_CEILING: usize = 1000;

/// One base-derived slot of a series: `[start, end)` with the series' fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Computes the `index`-th anchor start of a rule directly from the original
/// start, never from the previous anchor.
///
/// Monthly steps keep the original day-of-month and clamp to the last day of
/// shorter months; because every step restarts from `origin`, a clamp in
/// February does not leak into March.
pub fn nth_anchor_start(
    origin: DateTime<Utc>,
    frequency: Frequency,
    index: usize,
) -> Option<DateTime<Utc>> {
    let index = u64::try_from(index).ok()?;
    match frequency {
        Frequency::Daily => origin.checked_add_days(Days::new(index)),
        Frequency::Weekly => origin.checked_add_days(Days::new(index.checked_mul(7)?)),
        Frequency::Monthly => origin.checked_add_months(Months::new(u32::try_from(index).ok()?)),
    }
}

/// RecurrenceEvaluator: expands a rule into the anchors that overlap a window.
///
/// Evaluation is pure: it reads only its arguments, so the same evaluator can
/// be shared across threads and rerun freely.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceEvaluator {
    ceiling: usize,
}

impl Default for RecurrenceEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_CEILING)
    }
}

impl RecurrenceEvaluator {
    /// A ceiling below one is raised to one; the first anchor is always reachable.
    pub fn new(ceiling: usize) -> Self {
        Self { ceiling: ceiling.max(1) }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Anchors of `series` overlapping `window`.
    pub fn anchors_for(&self, series: &Series, window: TimeWindow) -> Anchors {
        self.anchors(series.start, series.end, series.recurrence, window)
    }

    /// Expands a rule into anchors overlapping `window`.
    ///
    /// # Arguments
    /// * `start` / `end` - first occurrence; `end - start` is the duration of every anchor
    /// * `recurrence` - rule and bound
    /// * `window` - inclusive query window
    ///
    /// # Behavior
    /// Stepping stops at whichever comes first: the count bound, an anchor
    /// past the end-date bound, the single anchor of a non-recurring rule, an
    /// anchor past `window.end`, or the iteration ceiling. Anchors cut off by
    /// the ceiling are dropped without an error.
    pub fn anchors(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        recurrence: Recurrence,
        window: TimeWindow,
    ) -> Anchors {
        Anchors {
            origin: start,
            duration: end - start,
            recurrence,
            window,
            ceiling: self.ceiling,
            index: 0,
            finished: false,
        }
    }

    /// Whether `candidate` is exactly one of the anchors the rule produces
    /// (within the iteration ceiling).
    pub fn is_anchor_of(&self, series: &Series, candidate: DateTime<Utc>) -> bool {
        // An anchor overlaps the zero-width window at its own start; later
        // anchors stop the walk.
        let probe = TimeWindow {
            start: candidate,
            end: candidate,
        };
        self.anchors_for(series, probe)
            .any(|anchor| anchor.start == candidate)
    }
}

/// Lazy, finite, ordered anchor sequence. A clone continues from the same
/// position; ask the evaluator again to start over.
#[derive(Debug, Clone)]
pub struct Anchors {
    origin: DateTime<Utc>,
    duration: Duration,
    recurrence: Recurrence,
    window: TimeWindow,
    ceiling: usize,
    index: usize,
    finished: bool,
}

impl Anchors {
    fn candidate(&self) -> Option<DateTime<Utc>> {
        match self.recurrence {
            Recurrence::None => (self.index == 0).then_some(self.origin),
            Recurrence::Repeating { frequency, bound } => {
                if let RecurrenceBound::Count(count) = bound {
                    if self.index >= count as usize {
                        return None;
                    }
                }
                let start = nth_anchor_start(self.origin, frequency, self.index)?;
                if let RecurrenceBound::Until(until) = bound {
                    if start > until {
                        return None;
                    }
                }
                // steps never shrink, so nothing later can overlap either
                if start > self.window.end {
                    return None;
                }
                Some(start)
            }
        }
    }
}

impl Iterator for Anchors {
    type Item = Anchor;

    fn next(&mut self) -> Option<Anchor> {
        while !self.finished {
            let Some(start) = self.candidate() else {
                self.finished = true;
                break;
            };
            if self.index >= self.ceiling {
                tracing::debug!(
                    ceiling = self.ceiling,
                    origin = %self.origin,
                    "iteration ceiling reached, truncating remaining anchors"
                );
                self.finished = true;
                break;
            }
            self.index += 1;

            let end = start + self.duration;
            if self.window.overlaps(start, end) {
                return Some(Anchor { start, end });
            }
        }
        None
    }
}
