//! Daily time windows and the membership test used to decide whether a
//! relay should be powered.

use serde::{Deserialize, Serialize};

use crate::time::TimeOfDay;

/// Whether `now` falls inside the daily window `[start, end]`.
///
/// Both bounds are inclusive and compared at minute granularity.
///
/// - `start < end`: plain range, `start <= now <= end`.
/// - `start > end`: the window wraps past midnight, `now >= start || now <= end`.
/// - `start == end`: treated as an always-on window.
#[must_use]
pub fn in_window(now: TimeOfDay, start: TimeOfDay, end: TimeOfDay) -> bool {
    let now = now.minute_of_day();
    let start = start.minute_of_day();
    let end = end.minute_of_day();

    match start.cmp(&end) {
        std::cmp::Ordering::Less => now >= start && now <= end,
        std::cmp::Ordering::Greater => now >= start || now <= end,
        std::cmp::Ordering::Equal => true,
    }
}

/// A recurring daily interval during which a relay should be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    #[must_use]
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// See [`in_window`].
    #[must_use]
    pub fn contains(&self, now: TimeOfDay) -> bool {
        in_window(now, self.start, self.end)
    }

    /// Whether the window crosses midnight.
    #[must_use]
    pub fn wraps_midnight(&self) -> bool {
        self.start.minute_of_day() > self.end.minute_of_day()
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start.to_hh_mm(), self.end.to_hh_mm())
    }
}
