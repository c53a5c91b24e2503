//! In-memory catalog and ledger.
//!
//! Implements every store trait over plain vectors. Serializable, so
//! front-ends can load a whole ledger snapshot from JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::model::{BlackoutEvent, RequesterId, Reservation, Resource, ResourceId, ResourceType};
use crate::store::{
    BlackoutStore, PreferenceStore, ReservationStore, ResourceStore, StoredPreference,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryLedger {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub blackouts: Vec<BlackoutEvent>,
    #[serde(default)]
    pub preferences: Vec<StoredPreference>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_reservation(mut self, reservation: Reservation) -> Self {
        self.reservations.push(reservation);
        self
    }

    pub fn with_blackout(mut self, event: BlackoutEvent) -> Self {
        self.blackouts.push(event);
        self
    }

    pub fn with_preference(mut self, preference: StoredPreference) -> Self {
        self.preferences.push(preference);
        self
    }

    /// Next free reservation id, for callers building ledgers incrementally.
    pub fn next_reservation_id(&self) -> u64 {
        self.reservations.iter().map(|r| r.id).max().map_or(1, |max| max + 1)
    }

    fn reservations_for(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> impl Iterator<Item = &Reservation> {
        self.reservations
            .iter()
            .filter(move |r| r.resource_type == resource_type && r.resource_id == resource_id)
    }
}

impl ResourceStore for InMemoryLedger {
    fn get(&self, resource_type: ResourceType, id: ResourceId) -> StoreResult<Option<Resource>> {
        Ok(self
            .resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.id == id)
            .cloned())
    }

    fn list_available(&self, resource_type: ResourceType) -> StoreResult<Vec<Resource>> {
        let mut found: Vec<Resource> = self
            .resources
            .iter()
            .filter(|r| r.resource_type == resource_type && r.is_available())
            .cloned()
            .collect();
        // Stable: equal names keep catalog order.
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }
}

impl ReservationStore for InMemoryLedger {
    fn on_date(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        date: NaiveDate,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations_for(resource_type, resource_id)
            .filter(|r| r.span.covers(date))
            .cloned()
            .collect())
    }

    fn since(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        since: NaiveDate,
    ) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .reservations_for(resource_type, resource_id)
            .filter(|r| r.span.start_date() >= since)
            .cloned()
            .collect())
    }

    fn by_requester(
        &self,
        resource_type: ResourceType,
        requester_id: RequesterId,
    ) -> StoreResult<Vec<Reservation>> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| r.resource_type == resource_type && r.requester_id == requester_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    fn usage_count(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> StoreResult<u32> {
        Ok(self.reservations_for(resource_type, resource_id).count() as u32)
    }
}

impl BlackoutStore for InMemoryLedger {
    fn events_on(&self, date: NaiveDate) -> StoreResult<Vec<BlackoutEvent>> {
        Ok(self.blackouts.iter().filter(|e| e.date == date).cloned().collect())
    }
}

impl PreferenceStore for InMemoryLedger {
    fn stored_summary(&self, requester_id: RequesterId) -> StoreResult<Option<StoredPreference>> {
        Ok(self
            .preferences
            .iter()
            .find(|p| p.requester_id == requester_id)
            .cloned())
    }
}
