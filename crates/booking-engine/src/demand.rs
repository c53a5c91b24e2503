//! Historical demand: how often each window (or date) has been booked.
//!
//! Frequencies are the only signal used to classify how busy a candidate is
//! and to rank suggestions least-busy first.

use std::collections::HashMap;
use std::fmt;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Reservation, ReservationSpan, TimeWindow};

/// What a frequency is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemandKey {
    /// An exact clock window, summed over every date (facilities, vehicles).
    Window(TimeWindow),
    /// A borrow date (items).
    Date(NaiveDate),
}

/// Booking counts per window or date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    counts: HashMap<DemandKey, u32>,
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: DemandKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn frequency(&self, key: &DemandKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn window_frequency(&self, window: &TimeWindow) -> u32 {
        self.frequency(&DemandKey::Window(*window))
    }

    pub fn date_frequency(&self, date: NaiveDate) -> u32 {
        self.frequency(&DemandKey::Date(date))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

/// Build a histogram from reservations. Denied and cancelled reservations are
/// not demand and are skipped.
pub fn histogram(reservations: &[Reservation]) -> Histogram {
    let mut hist = Histogram::new();
    for r in reservations.iter().filter(|r| r.status.counts_as_demand()) {
        let key = match r.span {
            ReservationSpan::Timed { window, .. } => DemandKey::Window(window),
            ReservationSpan::Dated { borrow, .. } => DemandKey::Date(borrow),
        };
        hist.record(key);
    }
    hist
}

/// First date of the lookback period ending `today`.
///
/// Falls back to the earliest representable date when the subtraction underflows.
pub fn lookback_start(today: NaiveDate, months: u32) -> NaiveDate {
    today.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}

/// Coarse demand classification from a historical frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusyLevel {
    Unbooked,
    Low,
    Moderate,
    High,
}

impl BusyLevel {
    /// 0 → unbooked, 1–2 → low, 3–5 → moderate, 6+ → high.
    pub fn from_frequency(frequency: u32) -> Self {
        match frequency {
            0 => BusyLevel::Unbooked,
            1..=2 => BusyLevel::Low,
            3..=5 => BusyLevel::Moderate,
            _ => BusyLevel::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusyLevel::Unbooked => "Not booked",
            BusyLevel::Low => "Low demand",
            BusyLevel::Moderate => "Moderate demand",
            BusyLevel::High => "High demand",
        }
    }
}

impl fmt::Display for BusyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A free window annotated with its historical demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCandidate {
    pub date: NaiveDate,
    pub window: TimeWindow,
    pub frequency: u32,
    pub busy_level: BusyLevel,
}

impl SlotCandidate {
    pub fn new(date: NaiveDate, window: TimeWindow, hist: &Histogram) -> Self {
        let frequency = hist.window_frequency(&window);
        Self {
            date,
            window,
            frequency,
            busy_level: BusyLevel::from_frequency(frequency),
        }
    }
}

/// Order candidates least busy first.
///
/// The sort is stable, so candidates supplied in chronological order stay
/// chronological among equal frequencies.
pub fn rank_least_busy(candidates: &mut [SlotCandidate]) {
    candidates.sort_by_key(|c| c.frequency);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_level_thresholds_are_exact() {
        assert_eq!(BusyLevel::from_frequency(0).label(), "Not booked");
        assert_eq!(BusyLevel::from_frequency(1).label(), "Low demand");
        assert_eq!(BusyLevel::from_frequency(2).label(), "Low demand");
        assert_eq!(BusyLevel::from_frequency(3).label(), "Moderate demand");
        assert_eq!(BusyLevel::from_frequency(5).label(), "Moderate demand");
        assert_eq!(BusyLevel::from_frequency(6).label(), "High demand");
        assert_eq!(BusyLevel::from_frequency(40).label(), "High demand");
    }

    #[test]
    fn lookback_is_calendar_months() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert_eq!(lookback_start(today, 6), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }
}
