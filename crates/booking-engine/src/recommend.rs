//! Score and rank available resources for a requester.
//!
//! Scoring is additive and deterministic. Every candidate starts at 50 for
//! being available; preference matches, demand and popularity add to it and
//! an overlapping blackout event subtracts from it. Each adjustment appends a
//! human-readable justification in the order it was applied.

use serde::{Deserialize, Serialize};

use crate::config::BlackoutPolicy;
use crate::model::{BlackoutEvent, Resource, ResourceType, TimeWindow};
use crate::preference::PreferenceProfile;

pub const BASE_SCORE: i32 = 50;
pub const ITEM_PREFERENCE_BONUS: i32 = 15;
pub const RESOURCE_PREFERENCE_BONUS: i32 = 20;
pub const AUTO_APPROVE_BONUS: i32 = 10;
pub const TIME_MATCH_BONUS: i32 = 10;
pub const CAPACITY_FIT_BONUS: i32 = 10;
pub const BLACKOUT_PENALTY: i32 = 20;
pub const MAX_DEMAND_SCORE: i32 = 20;
pub const DEMAND_STEP: i32 = 5;
pub const POPULARITY_BONUS: i32 = 10;

/// All-time usage above which a resource counts as popular.
pub const POPULARITY_THRESHOLD: u32 = 5;

/// Spare seats allowed before a vehicle stops counting as a good fit.
pub const SPARE_SEATS: u32 = 3;

/// An available resource plus the ledger signals needed to score it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub resource: Resource,
    /// Units left on the requested date; items only.
    pub available_quantity: Option<u32>,
    /// Non-denied reservations of this resource starting on the requested date.
    pub same_day_demand: u32,
    /// All-time reservation count for this resource.
    pub usage_count: u32,
}

/// What the requester asked for, shared by every candidate.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub resource_type: ResourceType,
    pub window: TimeWindow,
    pub passengers: u32,
    /// Scheduled blackout events overlapping the requested window.
    pub blackouts: &'a [BlackoutEvent],
    pub blackout_policy: BlackoutPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub resource: Resource,
    pub available_quantity: Option<u32>,
    pub score: i32,
    pub justifications: Vec<String>,
    /// 1-based position after ranking.
    pub rank: usize,
}

/// Score one candidate. The returned recommendation is unranked (`rank == 0`).
pub fn score(
    candidate: &Candidate,
    profile: &PreferenceProfile,
    ctx: &ScoringContext<'_>,
) -> Recommendation {
    let resource = &candidate.resource;
    let mut score = BASE_SCORE;
    let mut why = vec!["Available on your requested date and time".to_string()];

    match ctx.resource_type {
        ResourceType::Item => {
            if let Some(reason) = item_preference(resource, profile) {
                score += ITEM_PREFERENCE_BONUS;
                why.push(reason);
            }
            if resource.auto_approve {
                score += AUTO_APPROVE_BONUS;
                why.push("Auto-approved - no waiting for admin approval".to_string());
            }
        }
        ResourceType::Facility => {
            if profile.is_frequent(resource.id) {
                score += RESOURCE_PREFERENCE_BONUS;
                why.push("Your most frequently booked facility".to_string());
            }
            if ctx.window.day_part() == profile.preferred_time_slot {
                score += TIME_MATCH_BONUS;
                why.push(format!(
                    "Aligns with your usual {} schedule",
                    profile.preferred_time_slot
                ));
            }
        }
        ResourceType::Vehicle => {
            if profile.is_frequent(resource.id) {
                score += RESOURCE_PREFERENCE_BONUS;
                why.push("Your most frequently requested vehicle".to_string());
            }
            let seats = resource.capacity_or_zero();
            if seats >= ctx.passengers && seats <= ctx.passengers.saturating_add(SPARE_SEATS) {
                score += CAPACITY_FIT_BONUS;
                why.push("Optimal capacity for your passenger count".to_string());
            }
        }
    }

    if let Some(event) = first_blackout(resource, ctx) {
        score -= BLACKOUT_PENALTY;
        why.push(format!("Note: Blackout event scheduled during this time - {}", event.title));
    }

    let demand = demand_score(candidate.same_day_demand);
    score += demand;
    if demand >= 15 {
        why.push("Low booking demand on this date".to_string());
    } else if demand >= 10 {
        why.push("Moderate booking demand on this date".to_string());
    }

    if profile.is_new_requester() && candidate.usage_count > POPULARITY_THRESHOLD {
        score += POPULARITY_BONUS;
        why.push("Popular choice among other requesters".to_string());
    }

    Recommendation {
        resource: resource.clone(),
        available_quantity: candidate.available_quantity,
        score,
        justifications: why,
        rank: 0,
    }
}

/// Score every candidate and order by descending score.
///
/// Ties keep the order of `candidates`. Ranks are assigned after sorting.
pub fn rank(
    candidates: &[Candidate],
    profile: &PreferenceProfile,
    ctx: &ScoringContext<'_>,
) -> Vec<Recommendation> {
    let mut scored: Vec<Recommendation> =
        candidates.iter().map(|c| score(c, profile, ctx)).collect();
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    for (i, rec) in scored.iter_mut().enumerate() {
        rec.rank = i + 1;
    }
    scored
}

/// 20 minus 5 per same-day reservation, never below zero.
pub fn demand_score(same_day_demand: u32) -> i32 {
    let deduction = i32::try_from(same_day_demand).unwrap_or(i32::MAX).saturating_mul(DEMAND_STEP);
    MAX_DEMAND_SCORE.saturating_sub(deduction).max(0)
}

/// The first frequent entry that matches decides; a category match is
/// checked before an identity match within each entry.
fn item_preference(item: &Resource, profile: &PreferenceProfile) -> Option<String> {
    profile.frequent.iter().find_map(|frequent| {
        match (&frequent.category, &item.category) {
            (Some(theirs), Some(ours)) if theirs == ours => {
                return Some(format!("Matches your frequently borrowed category ({})", ours));
            }
            _ => {}
        }
        (frequent.resource_id == item.id).then(|| "You've borrowed this item before".to_string())
    })
}

fn first_blackout<'e>(resource: &Resource, ctx: &ScoringContext<'e>) -> Option<&'e BlackoutEvent> {
    match ctx.blackout_policy {
        BlackoutPolicy::Global => ctx.blackouts.first(),
        BlackoutPolicy::PerResource => ctx
            .blackouts
            .iter()
            .find(|e| e.applies_to(resource.resource_type, resource.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demand_score_floors_at_zero() {
        assert_eq!(demand_score(0), 20);
        assert_eq!(demand_score(1), 15);
        assert_eq!(demand_score(2), 10);
        assert_eq!(demand_score(4), 0);
        assert_eq!(demand_score(40), 0);
        assert_eq!(demand_score(u32::MAX), 0);
    }
}
