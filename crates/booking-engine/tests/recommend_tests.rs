//! Tests for recommendation scoring and ranking.

use booking_engine::model::{
    BlackoutEvent, BlackoutStatus, DayPart, Resource, ResourceRef, ResourceType, TimeWindow,
};
use booking_engine::preference::{FrequentResource, PreferenceProfile};
use booking_engine::recommend::{rank, score, Candidate, ScoringContext};
use booking_engine::BlackoutPolicy;
use chrono::NaiveDate;

fn w(start_hour: u32, end_hour: u32) -> TimeWindow {
    TimeWindow::hm((start_hour, 0), (end_hour, 0)).unwrap()
}

fn candidate(resource: Resource) -> Candidate {
    Candidate {
        resource,
        available_quantity: None,
        same_day_demand: 0,
        usage_count: 0,
    }
}

fn ctx(
    resource_type: ResourceType,
    window: TimeWindow,
    passengers: u32,
    blackouts: &[BlackoutEvent],
) -> ScoringContext<'_> {
    ScoringContext {
        resource_type,
        window,
        passengers,
        blackouts,
        blackout_policy: BlackoutPolicy::Global,
    }
}

/// A profile with enough history to not count as a new requester.
fn regular(resource_type: ResourceType, frequent: Vec<FrequentResource>) -> PreferenceProfile {
    PreferenceProfile {
        total_count: 10,
        frequent,
        ..PreferenceProfile::empty(7, resource_type)
    }
}

fn frequent(resource_id: u64, category: Option<&str>) -> FrequentResource {
    FrequentResource {
        resource_id,
        category: category.map(str::to_string),
        count: 3,
    }
}

fn event(id: u64, title: &str, scope: Option<ResourceRef>) -> BlackoutEvent {
    BlackoutEvent {
        id,
        title: title.to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        window: w(8, 12),
        status: BlackoutStatus::Scheduled,
        scope,
    }
}

// ---------------------------------------------------------------------------
// Facilities
// ---------------------------------------------------------------------------

#[test]
fn free_facility_matching_morning_preference_scores_80() {
    let profile = regular(ResourceType::Facility, vec![]);
    let hall = candidate(Resource::facility(1, "Hall"));

    let rec = score(&hall, &profile, &ctx(ResourceType::Facility, w(9, 10), 1, &[]));

    assert_eq!(rec.score, 80);
    assert_eq!(
        rec.justifications,
        vec![
            "Available on your requested date and time",
            "Aligns with your usual morning schedule",
            "Low booking demand on this date",
        ]
    );
}

#[test]
fn frequent_facility_gets_preference_bonus() {
    let profile = PreferenceProfile {
        preferred_time_slot: DayPart::Evening,
        ..regular(ResourceType::Facility, vec![frequent(1, None)])
    };
    let hall = candidate(Resource::facility(1, "Hall"));

    let rec = score(&hall, &profile, &ctx(ResourceType::Facility, w(9, 10), 1, &[]));

    assert_eq!(rec.score, 50 + 20 + 20);
    assert!(rec.justifications.contains(&"Your most frequently booked facility".to_string()));
}

#[test]
fn demand_lowers_score_and_changes_wording() {
    let profile = regular(ResourceType::Facility, vec![]);
    let window = w(14, 15);
    let scored = |demand: u32| {
        let mut c = candidate(Resource::facility(1, "Hall"));
        c.same_day_demand = demand;
        score(&c, &profile, &ctx(ResourceType::Facility, window, 1, &[]))
    };

    let one = scored(1);
    assert_eq!(one.score, 65);
    assert_eq!(one.justifications.last().unwrap(), "Low booking demand on this date");

    let two = scored(2);
    assert_eq!(two.score, 60);
    assert_eq!(two.justifications.last().unwrap(), "Moderate booking demand on this date");

    let three = scored(3);
    assert_eq!(three.score, 55);
    assert_eq!(three.justifications.len(), 1, "no demand line below 10 points");

    assert_eq!(scored(9).score, 50);
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

#[test]
fn vehicle_capacity_fit_bonus() {
    let profile = regular(ResourceType::Vehicle, vec![]);
    let van = candidate(Resource::vehicle(3, "Van", 8));

    let optimal = "Optimal capacity for your passenger count".to_string();

    let six = score(&van, &profile, &ctx(ResourceType::Vehicle, w(14, 16), 6, &[]));
    assert!(six.justifications.contains(&optimal));
    assert_eq!(six.score, 50 + 10 + 20);

    let three = score(&van, &profile, &ctx(ResourceType::Vehicle, w(14, 16), 3, &[]));
    assert!(!three.justifications.contains(&optimal));
    assert_eq!(three.score, 50 + 20);
}

#[test]
fn frequent_vehicle_gets_preference_bonus() {
    let profile = regular(ResourceType::Vehicle, vec![frequent(3, None)]);
    let van = candidate(Resource::vehicle(3, "Van", 20));

    let rec = score(&van, &profile, &ctx(ResourceType::Vehicle, w(9, 10), 2, &[]));

    assert_eq!(rec.score, 50 + 20 + 20);
    assert_eq!(rec.justifications[1], "Your most frequently requested vehicle");
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[test]
fn item_category_match_and_auto_approve() {
    let profile = regular(ResourceType::Item, vec![frequent(2, Some("sports"))]);
    let ball = candidate(Resource::item(9, "Volleyball", "sports", 5).with_auto_approve(true));

    let rec = score(&ball, &profile, &ctx(ResourceType::Item, w(8, 17), 1, &[]));

    assert_eq!(rec.score, 50 + 15 + 10 + 20);
    assert_eq!(rec.justifications[1], "Matches your frequently borrowed category (sports)");
    assert_eq!(rec.justifications[2], "Auto-approved - no waiting for admin approval");
}

#[test]
fn item_borrowed_before_in_another_category() {
    let profile = regular(ResourceType::Item, vec![frequent(9, Some("sports"))]);
    let mic = candidate(Resource::item(9, "Microphone", "audio", 2));

    let rec = score(&mic, &profile, &ctx(ResourceType::Item, w(8, 17), 1, &[]));

    assert_eq!(rec.score, 50 + 15 + 20);
    assert_eq!(rec.justifications[1], "You've borrowed this item before");
}

#[test]
fn item_preference_bonus_applies_once() {
    let profile = regular(
        ResourceType::Item,
        vec![frequent(1, Some("sports")), frequent(2, Some("sports")), frequent(9, Some("sports"))],
    );
    let ball = candidate(Resource::item(9, "Volleyball", "sports", 5));

    let rec = score(&ball, &profile, &ctx(ResourceType::Item, w(8, 17), 1, &[]));

    assert_eq!(rec.score, 50 + 15 + 20);
}

// ---------------------------------------------------------------------------
// Blackouts and popularity
// ---------------------------------------------------------------------------

#[test]
fn blackout_penalty_applies_once() {
    let profile = regular(ResourceType::Facility, vec![]);
    let hall = candidate(Resource::facility(1, "Hall"));
    let one = [event(1, "Town assembly", None)];
    let many = [
        event(1, "Town assembly", None),
        event(2, "Health fair", None),
        event(3, "Clean-up drive", None),
    ];

    let with_one = score(&hall, &profile, &ctx(ResourceType::Facility, w(9, 10), 1, &one));
    let with_many = score(&hall, &profile, &ctx(ResourceType::Facility, w(9, 10), 1, &many));

    assert_eq!(with_one.score, 60);
    assert_eq!(with_many.score, 60);
    assert!(with_many
        .justifications
        .contains(&"Note: Blackout event scheduled during this time - Town assembly".to_string()));
}

#[test]
fn per_resource_policy_ignores_events_scoped_elsewhere() {
    let profile = regular(ResourceType::Facility, vec![]);
    let hall = candidate(Resource::facility(1, "Hall"));
    let elsewhere = [event(
        1,
        "Court repainting",
        Some(ResourceRef {
            resource_type: ResourceType::Facility,
            id: 2,
        }),
    )];

    let mut scoped = ctx(ResourceType::Facility, w(9, 10), 1, &elsewhere);
    scoped.blackout_policy = BlackoutPolicy::PerResource;
    assert_eq!(score(&hall, &profile, &scoped).score, 80);

    scoped.blackout_policy = BlackoutPolicy::Global;
    assert_eq!(score(&hall, &profile, &scoped).score, 60);
}

#[test]
fn popular_resources_are_boosted_for_new_requesters() {
    let newcomer = PreferenceProfile {
        total_count: 2,
        ..PreferenceProfile::empty(7, ResourceType::Facility)
    };
    let mut popular = candidate(Resource::facility(1, "Hall"));
    popular.usage_count = 6;
    let mut modest = candidate(Resource::facility(2, "Annex"));
    modest.usage_count = 5;
    let window = w(14, 15);

    let boosted = score(&popular, &newcomer, &ctx(ResourceType::Facility, window, 1, &[]));
    assert_eq!(boosted.score, 80);
    assert_eq!(boosted.justifications.last().unwrap(), "Popular choice among other requesters");

    assert_eq!(score(&modest, &newcomer, &ctx(ResourceType::Facility, window, 1, &[])).score, 70);

    let veteran = regular(ResourceType::Facility, vec![]);
    assert_eq!(score(&popular, &veteran, &ctx(ResourceType::Facility, window, 1, &[])).score, 70);
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[test]
fn ranking_is_descending_and_stable() {
    let profile = regular(ResourceType::Facility, vec![frequent(3, None)]);
    let mut busy = candidate(Resource::facility(1, "Annex"));
    busy.same_day_demand = 2;
    let candidates = vec![
        busy,
        candidate(Resource::facility(2, "Gym")),
        candidate(Resource::facility(3, "Hall")),
        candidate(Resource::facility(4, "Library")),
    ];
    let context = ctx(ResourceType::Facility, w(14, 15), 1, &[]);

    let ranked = rank(&candidates, &profile, &context);

    let order: Vec<(u64, i32, usize)> =
        ranked.iter().map(|r| (r.resource.id, r.score, r.rank)).collect();
    assert_eq!(order, vec![(3, 90, 1), (2, 70, 2), (4, 70, 3), (1, 60, 4)]);
}

#[test]
fn ranking_is_deterministic() {
    let profile = regular(ResourceType::Vehicle, vec![frequent(2, None)]);
    let candidates: Vec<Candidate> = (1..=6)
        .map(|i| {
            let mut c = candidate(Resource::vehicle(i, format!("Vehicle {}", i), 4 + i as u32));
            c.same_day_demand = (i % 3) as u32;
            c
        })
        .collect();
    let context = ctx(ResourceType::Vehicle, w(9, 12), 4, &[]);

    assert_eq!(rank(&candidates, &profile, &context), rank(&candidates, &profile, &context));
}
