//! Enumerate candidate booking windows within operating hours.
//!
//! Starting at opening time and advancing by a fixed step, yields windows of
//! the desired duration. Generation stops at the first window whose end would
//! pass closing time: trailing partial windows are dropped, never clipped.
//! The generator knows nothing about resources; filtering happens downstream.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::conflict::is_window_free;
use crate::model::{Reservation, TimeWindow};

/// Daily operating hours and the step between candidate start times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingHours {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub step: Duration,
}

impl Default for OperatingHours {
    /// 08:00 to 20:00 in 30-minute steps.
    fn default() -> Self {
        Self {
            opening: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closing: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            step: Duration::minutes(30),
        }
    }
}

impl OperatingHours {
    /// Lazily generate every window of length `duration` within these hours.
    ///
    /// The returned iterator is finite and cheap to clone; calling `slots`
    /// again restarts from opening time.
    pub fn slots(&self, duration: Duration) -> Slots {
        let usable = duration > Duration::zero()
            && self.step > Duration::zero()
            && self.opening < self.closing;
        Slots {
            next_start: usable.then_some(self.opening),
            closing: self.closing,
            step: self.step,
            duration,
        }
    }

    /// Windows of length `duration` on `date` not blocked by any active
    /// reservation in `reservations`, in chronological order.
    pub fn free_slots<'a>(
        &self,
        duration: Duration,
        reservations: &'a [Reservation],
        date: NaiveDate,
    ) -> impl Iterator<Item = TimeWindow> + 'a {
        self.slots(duration)
            .filter(move |w| is_window_free(reservations, date, w))
    }

    /// Every step-sized slot of the day, flagged free or taken.
    pub fn day_grid(&self, reservations: &[Reservation], date: NaiveDate) -> Vec<GridSlot> {
        self.slots(self.step)
            .map(|window| GridSlot {
                window,
                available: is_window_free(reservations, date, &window),
                display: display_label(&window),
            })
            .collect()
    }
}

/// Iterator over equal-length windows; see [`OperatingHours::slots`].
#[derive(Debug, Clone)]
pub struct Slots {
    next_start: Option<NaiveTime>,
    closing: NaiveTime,
    step: Duration,
    duration: Duration,
}

impl Iterator for Slots {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        let start = self.next_start.take()?;
        if start >= self.closing {
            return None;
        }

        // A window that would run past midnight or closing time ends generation.
        let (end, wrapped) = start.overflowing_add_signed(self.duration);
        if wrapped != 0 || end > self.closing {
            return None;
        }

        let (following, wrapped) = start.overflowing_add_signed(self.step);
        if wrapped == 0 {
            self.next_start = Some(following);
        }

        TimeWindow::new(start, end).ok()
    }
}

/// One cell of a day availability grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSlot {
    pub window: TimeWindow,
    pub available: bool,
    /// Human-readable range, e.g. "8:00 AM - 8:30 AM".
    pub display: String,
}

fn display_label(window: &TimeWindow) -> String {
    format!(
        "{} - {}",
        window.start().format("%-I:%M %p"),
        window.end().format("%-I:%M %p")
    )
}
