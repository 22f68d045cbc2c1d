//! Date-range selection over an actual series

use crate::period::Period;
use crate::series::ActualSeries;
use serde::{Deserialize, Serialize};

/// Inclusive month bounds; `None` leaves that side open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<Period>,
    pub end: Option<Period>,
}

impl DateRange {
    pub fn new(start: Option<Period>, end: Option<Period>) -> Self {
        Self { start, end }
    }

    /// No bounds on either side
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, period: Period) -> bool {
        self.start.map_or(true, |s| period >= s) && self.end.map_or(true, |e| period <= e)
    }

    /// Keep the observations inside this range
    pub fn apply(&self, series: &ActualSeries) -> ActualSeries {
        filter(series, self.start, self.end)
    }
}

/// Observations whose period lies in `[start, end]`, in their original order.
///
/// An inverted range (`start > end`) selects nothing. An empty result is a
/// valid series, not an error.
pub fn filter(series: &ActualSeries, start: Option<Period>, end: Option<Period>) -> ActualSeries {
    let range = DateRange::new(start, end);
    ActualSeries::from_ordered(
        series
            .iter()
            .filter(|o| range.contains(o.period))
            .copied()
            .collect(),
    )
}
