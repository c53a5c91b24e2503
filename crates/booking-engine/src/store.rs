//! Read-only capabilities the engine consumes from its host.
//!
//! The catalog, the reservation ledger, blackout events and persisted
//! preference summaries are owned elsewhere. Backends implement the small set
//! of required methods; the filtered queries the algorithms use (overlap
//! lookup, quantity sums, frequency histograms) are provided on top of them so
//! every backend applies the same status and overlap rules.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::demand::{self, Histogram};
use crate::error::StoreResult;
use crate::model::{
    BlackoutEvent, DayPart, RequesterId, Reservation, ReservationStatus, Resource, ResourceId,
    ResourceType, TimeWindow,
};

/// Source of resource records.
pub trait ResourceStore {
    /// Look up one resource. `Ok(None)` when it does not exist.
    fn get(&self, resource_type: ResourceType, id: ResourceId) -> StoreResult<Option<Resource>>;

    /// Every resource of `resource_type` whose status is available, in name order.
    fn list_available(&self, resource_type: ResourceType) -> StoreResult<Vec<Resource>>;
}

/// Source of reservations.
pub trait ReservationStore {
    /// Reservations of any status that occupy `date` for the resource.
    fn on_date(&self, resource_type: ResourceType, resource_id: ResourceId, date: NaiveDate)
        -> StoreResult<Vec<Reservation>>;

    /// Reservations of any status for the resource starting on or after `since`.
    fn since(&self, resource_type: ResourceType, resource_id: ResourceId, since: NaiveDate)
        -> StoreResult<Vec<Reservation>>;

    /// Every reservation the requester ever made for this resource type, oldest first.
    fn by_requester(
        &self,
        resource_type: ResourceType,
        requester_id: RequesterId,
    ) -> StoreResult<Vec<Reservation>>;

    /// All-time reservation count for the resource, any status.
    fn usage_count(&self, resource_type: ResourceType, resource_id: ResourceId) -> StoreResult<u32>;

    /// Reservations with a status in `statuses` whose window overlaps `window` on `date`.
    fn list_overlapping(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        date: NaiveDate,
        window: &TimeWindow,
        statuses: &[ReservationStatus],
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .on_date(resource_type, resource_id, date)?
            .into_iter()
            .filter(|r| statuses.contains(&r.status))
            .filter(|r| r.span.window().is_some_and(|w| w.overlaps(window)))
            .collect())
    }

    /// Units of an item held on `date` by reservations with a status in `statuses`.
    fn sum_quantity(
        &self,
        item_id: ResourceId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> StoreResult<u32> {
        Ok(self
            .on_date(ResourceType::Item, item_id, date)?
            .iter()
            .filter(|r| statuses.contains(&r.status) && r.span.covers(date))
            .map(|r| r.quantity)
            .sum())
    }

    /// Reservations with a status in `statuses` that start on `date`.
    fn count_starting_on(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> StoreResult<u32> {
        Ok(self
            .on_date(resource_type, resource_id, date)?
            .iter()
            .filter(|r| statuses.contains(&r.status) && r.span.start_date() == date)
            .count() as u32)
    }

    /// Historical demand for the resource since `since`.
    fn frequency_histogram(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        since: NaiveDate,
    ) -> StoreResult<Histogram> {
        Ok(demand::histogram(&self.since(resource_type, resource_id, since)?))
    }
}

/// Source of administrative blackout events.
pub trait BlackoutStore {
    /// Events of any status on `date`.
    fn events_on(&self, date: NaiveDate) -> StoreResult<Vec<BlackoutEvent>>;

    /// Scheduled events on `date` overlapping `window`.
    fn overlapping_events(
        &self,
        date: NaiveDate,
        window: &TimeWindow,
    ) -> StoreResult<Vec<BlackoutEvent>> {
        Ok(self
            .events_on(date)?
            .into_iter()
            .filter(|e| e.is_scheduled() && e.overlaps(date, window))
            .collect())
    }
}

/// A requester's persisted preference summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPreference {
    pub requester_id: RequesterId,
    pub preferred_time_slot: DayPart,
    pub average_duration_minutes: u32,
}

/// Source of persisted preference summaries.
pub trait PreferenceStore {
    fn stored_summary(&self, requester_id: RequesterId) -> StoreResult<Option<StoredPreference>>;
}
