//! Plan alternative slots when a requested booking conflicts.
//!
//! Alternatives come from an ordered list of tiers. Each tier is a lazy
//! producer; tiers run in order and the plan stops pulling as soon as the
//! suggestion cap is reached, so later tiers (and the ledger reads behind
//! them) are only evaluated when earlier ones fall short. A later tier never
//! replaces or repeats an earlier suggestion.
//!
//! Clock-window resources use three tiers:
//!
//! 1. free windows of the same length on the requested date, least busy first;
//! 2. the exact requested window on following dates, in date order;
//! 3. the least busy free windows across the following week.
//!
//! Pooled items have no windows and use a single tier: the next dates with
//! enough units left.

use std::iter;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::conflict::{self, Requirement};
use crate::demand::{rank_least_busy, BusyLevel, Histogram, SlotCandidate};
use crate::error::{EngineError, Result};
use crate::model::{CapacityKind, Granularity, Resource, TimeWindow, ACTIVE_STATUSES};
use crate::slots::OperatingHours;
use crate::store::ReservationStore;

/// Which tier produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    SameDayAlternative,
    NextDateSameTime,
    LeastBusySlot,
    NextAvailableDate,
}

impl SuggestionKind {
    pub fn reason(self) -> &'static str {
        match self {
            SuggestionKind::SameDayAlternative => "Alternative time slot on your requested date",
            SuggestionKind::NextDateSameTime => "Same time on next available date",
            SuggestionKind::LeastBusySlot => "Least busy time slot available",
            SuggestionKind::NextAvailableDate => "Next available date for this item",
        }
    }
}

/// One alternative offered to the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub date: NaiveDate,
    /// `None` for item suggestions, which cover the whole date.
    pub window: Option<TimeWindow>,
    pub reason: String,
    pub frequency: u32,
    pub busy_level: BusyLevel,
    /// Units left on the date; item suggestions only.
    pub available_quantity: Option<u32>,
}

impl Suggestion {
    fn from_candidate(kind: SuggestionKind, candidate: SlotCandidate) -> Self {
        Self {
            kind,
            date: candidate.date,
            window: Some(candidate.window),
            reason: kind.reason().to_string(),
            frequency: candidate.frequency,
            busy_level: candidate.busy_level,
            available_quantity: None,
        }
    }

    fn same_slot(&self, other: &Suggestion) -> bool {
        self.date == other.date && self.window == other.window
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    SameDay,
    NextDateSameTime,
    LeastBusyWeek,
    NextItemDate,
}

const WINDOW_TIERS: &[Tier] = &[Tier::SameDay, Tier::NextDateSameTime, Tier::LeastBusyWeek];
const ITEM_TIERS: &[Tier] = &[Tier::NextItemDate];

type Produced<'p> = Box<dyn Iterator<Item = Result<Suggestion>> + 'p>;

/// Suggestion planner over one resource's ledger and demand history.
pub struct Planner<'a> {
    ledger: &'a dyn ReservationStore,
    histogram: &'a Histogram,
    hours: OperatingHours,
    max_suggestions: usize,
    lookahead_days: u32,
    least_busy_days: u32,
}

impl<'a> Planner<'a> {
    pub fn new(
        ledger: &'a dyn ReservationStore,
        histogram: &'a Histogram,
        config: &EngineConfig,
    ) -> Self {
        Self {
            ledger,
            histogram,
            hours: config.hours(),
            max_suggestions: config.max_suggestions,
            lookahead_days: config.next_date_lookahead_days,
            least_busy_days: config.least_busy_days,
        }
    }

    /// Plan up to `max_suggestions` alternatives for `requirement` on `date`.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidInput` if `requirement` does not fit the
    /// resource type, and `EngineError::StoreUnavailable` if a ledger read fails.
    pub fn suggest(
        &self,
        resource: &Resource,
        date: NaiveDate,
        requirement: &Requirement,
    ) -> Result<Vec<Suggestion>> {
        let tiers = match (resource.resource_type.granularity(), requirement) {
            (Granularity::Slot, Requirement::Window { .. }) => WINDOW_TIERS,
            (Granularity::Day, Requirement::Units { .. }) => ITEM_TIERS,
            _ => {
                return Err(EngineError::InvalidInput(format!(
                    "requirement does not fit a {}",
                    resource.resource_type
                )))
            }
        };

        if let Requirement::Window { passengers, .. } = *requirement {
            // No slot can fix a vehicle that is too small.
            if resource.resource_type.capacity_kind() == CapacityKind::Passengers
                && resource.capacity_or_zero() < passengers
            {
                return Ok(Vec::new());
            }
        }

        let mut planned: Vec<Suggestion> = Vec::new();
        for &tier in tiers {
            if planned.len() >= self.max_suggestions {
                break;
            }
            for produced in self.produce(tier, resource, date, requirement) {
                let suggestion = produced?;
                if planned.iter().any(|p| p.same_slot(&suggestion)) {
                    continue;
                }
                planned.push(suggestion);
                if planned.len() >= self.max_suggestions {
                    break;
                }
            }
        }
        Ok(planned)
    }

    fn produce<'p>(
        &'p self,
        tier: Tier,
        resource: &'p Resource,
        date: NaiveDate,
        requirement: &Requirement,
    ) -> Produced<'p> {
        match (tier, *requirement) {
            (Tier::SameDay, Requirement::Window { window, .. }) => {
                let days = vec![date];
                let ranked =
                    iter::once_with(move || self.ranked_free_slots(resource, &days, &window));
                Box::new(ranked.flat_map(flatten).map(|c| {
                    c.map(|c| Suggestion::from_candidate(SuggestionKind::SameDayAlternative, c))
                }))
            }
            (Tier::NextDateSameTime, Requirement::Window { window, .. }) => {
                Box::new(following_dates(date, 1, self.lookahead_days).filter_map(move |day| {
                    self.same_window_on(resource, day, &window).transpose()
                }))
            }
            (Tier::LeastBusyWeek, Requirement::Window { window, .. }) => {
                let last = self.least_busy_days.saturating_sub(1);
                let days: Vec<NaiveDate> = following_dates(date, 0, last).collect();
                let ranked =
                    iter::once_with(move || self.ranked_free_slots(resource, &days, &window));
                Box::new(ranked.flat_map(flatten).map(|c| {
                    c.map(|c| Suggestion::from_candidate(SuggestionKind::LeastBusySlot, c))
                }))
            }
            (Tier::NextItemDate, Requirement::Units { quantity }) => {
                Box::new(following_dates(date, 1, self.lookahead_days).filter_map(move |day| {
                    self.item_headroom_on(resource, day, quantity).transpose()
                }))
            }
            _ => Box::new(iter::empty()),
        }
    }

    /// Free windows with the requested window's length across `days`, least
    /// busy first, ties in chronological order.
    fn ranked_free_slots(
        &self,
        resource: &Resource,
        days: &[NaiveDate],
        requested: &TimeWindow,
    ) -> Result<Vec<SlotCandidate>> {
        let mut candidates = Vec::new();
        for &day in days {
            let booked = self.ledger.on_date(resource.resource_type, resource.id, day)?;
            candidates.extend(
                self.hours
                    .free_slots(requested.duration(), &booked, day)
                    .map(|w| SlotCandidate::new(day, w, self.histogram)),
            );
        }
        rank_least_busy(&mut candidates);
        Ok(candidates)
    }

    fn same_window_on(
        &self,
        resource: &Resource,
        day: NaiveDate,
        window: &TimeWindow,
    ) -> Result<Option<Suggestion>> {
        let blocking = self.ledger.list_overlapping(
            resource.resource_type,
            resource.id,
            day,
            window,
            ACTIVE_STATUSES,
        )?;
        if !blocking.is_empty() {
            return Ok(None);
        }
        let candidate = SlotCandidate::new(day, *window, self.histogram);
        Ok(Some(Suggestion::from_candidate(SuggestionKind::NextDateSameTime, candidate)))
    }

    fn item_headroom_on(
        &self,
        item: &Resource,
        day: NaiveDate,
        quantity: u32,
    ) -> Result<Option<Suggestion>> {
        let booked = self.ledger.on_date(item.resource_type, item.id, day)?;
        let available = conflict::available_quantity(item.capacity_or_zero(), &booked, day);
        if available == 0 || available < quantity {
            return Ok(None);
        }
        let frequency = self.histogram.date_frequency(day);
        let kind = SuggestionKind::NextAvailableDate;
        Ok(Some(Suggestion {
            kind,
            date: day,
            window: None,
            reason: kind.reason().to_string(),
            frequency,
            busy_level: BusyLevel::from_frequency(frequency),
            available_quantity: Some(available),
        }))
    }
}

/// Dates `start + from ..= start + to`, stopping early at the end of the calendar.
fn following_dates(start: NaiveDate, from: u32, to: u32) -> impl Iterator<Item = NaiveDate> {
    (from..=to).map_while(move |offset| start.checked_add_days(Days::new(u64::from(offset))))
}

fn flatten<T: 'static>(result: Result<Vec<T>>) -> Box<dyn Iterator<Item = Result<T>>> {
    match result {
        Ok(items) => Box::new(items.into_iter().map(Ok)),
        Err(e) => Box::new(iter::once(Err(e))),
    }
}
