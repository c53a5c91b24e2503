//! Preference profiles: what a requester usually books, and when.
//!
//! Profiles are rebuilt from the ledger on every request. A persisted summary
//! only replaces the built-in defaults for preferred time slot and duration;
//! frequent resources and the total count always come from live history, and
//! a preferred slot derived from history wins over the stored one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{DayPart, RequesterId, Reservation, ResourceId, ResourceType};
use crate::store::StoredPreference;

/// Frequent resources kept in a profile.
pub const MAX_FREQUENT: usize = 5;

/// Assumed booking length when nothing is known about the requester.
pub const DEFAULT_DURATION_MINUTES: u32 = 120;

/// Requesters with fewer reservations than this are "new".
pub const NEW_REQUESTER_THRESHOLD: u32 = 3;

/// One resource the requester uses often.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequentResource {
    pub resource_id: ResourceId,
    /// Item category; `None` for facilities and vehicles.
    pub category: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub requester_id: RequesterId,
    pub resource_type: ResourceType,
    pub preferred_time_slot: DayPart,
    pub average_duration_minutes: u32,
    /// Most used first; ties keep the order the resources were first booked in.
    pub frequent: Vec<FrequentResource>,
    /// Every reservation the requester made for this type, any status.
    pub total_count: u32,
}

impl PreferenceProfile {
    /// Profile for a requester with no history and no stored summary.
    pub fn empty(requester_id: RequesterId, resource_type: ResourceType) -> Self {
        Self {
            requester_id,
            resource_type,
            preferred_time_slot: DayPart::Morning,
            average_duration_minutes: DEFAULT_DURATION_MINUTES,
            frequent: Vec::new(),
            total_count: 0,
        }
    }

    /// Build a profile from the requester's history for one resource type.
    ///
    /// `history` must be oldest first. `categories` maps item ids to their
    /// catalog category; ids missing from it group under no category.
    pub fn build(
        requester_id: RequesterId,
        resource_type: ResourceType,
        history: &[Reservation],
        categories: &HashMap<ResourceId, String>,
        stored: Option<&StoredPreference>,
    ) -> Self {
        let mut profile = Self::empty(requester_id, resource_type);
        if let Some(stored) = stored {
            profile.preferred_time_slot = stored.preferred_time_slot;
            profile.average_duration_minutes = stored.average_duration_minutes;
        }

        let relevant: Vec<&Reservation> = history
            .iter()
            .filter(|r| r.resource_type == resource_type && r.requester_id == requester_id)
            .collect();
        profile.total_count = relevant.len() as u32;

        let mut ranked = group_by_resource(&relevant, categories);
        // Stable: equal counts stay in first-seen order.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(MAX_FREQUENT);

        if let Some(top) = ranked.first() {
            if let Some((slot, minutes)) = usual_schedule(&relevant, top.resource_id) {
                profile.preferred_time_slot = slot;
                profile.average_duration_minutes = minutes;
            }
        }
        profile.frequent = ranked;
        profile
    }

    pub fn is_new_requester(&self) -> bool {
        self.total_count < NEW_REQUESTER_THRESHOLD
    }

    pub fn top(&self) -> Option<&FrequentResource> {
        self.frequent.first()
    }

    pub fn is_frequent(&self, resource_id: ResourceId) -> bool {
        self.frequent.iter().any(|f| f.resource_id == resource_id)
    }
}

fn group_by_resource(
    history: &[&Reservation],
    categories: &HashMap<ResourceId, String>,
) -> Vec<FrequentResource> {
    let mut order: Vec<FrequentResource> = Vec::new();
    let mut index: HashMap<(ResourceId, Option<&str>), usize> = HashMap::new();
    for r in history {
        let category = categories.get(&r.resource_id).map(String::as_str);
        let slot = *index.entry((r.resource_id, category)).or_insert_with(|| {
            order.push(FrequentResource {
                resource_id: r.resource_id,
                category: category.map(str::to_string),
                count: 0,
            });
            order.len() - 1
        });
        order[slot].count += 1;
    }
    order
}

/// The most common part of day among the resource's timed reservations, and
/// the rounded mean duration of the reservations in that part of day.
///
/// Ties between parts of day go to the earlier one. `None` when the resource
/// has no timed reservations.
fn usual_schedule(history: &[&Reservation], resource_id: ResourceId) -> Option<(DayPart, u32)> {
    let mut buckets: HashMap<DayPart, (u32, i64)> = HashMap::new();
    for window in history
        .iter()
        .filter(|r| r.resource_id == resource_id)
        .filter_map(|r| r.span.window())
    {
        let entry = buckets.entry(window.day_part()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += window.duration_minutes();
    }

    let (slot, (count, minutes)) = buckets.into_iter().max_by(
        |(a_part, (a_count, _)), (b_part, (b_count, _))| {
            a_count.cmp(b_count).then(b_part.cmp(a_part))
        },
    )?;
    let mean = (minutes as f64 / f64::from(count)).round() as u32;
    Some((slot, mean))
}
