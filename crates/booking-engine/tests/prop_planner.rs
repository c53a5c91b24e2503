//! Property-based tests using proptest.
//!
//! These verify invariants that should hold for *any* ledger or window, not
//! just the worked examples in the other test files.

use booking_engine::conflict::{overlaps, Requirement};
use booking_engine::demand::histogram;
use booking_engine::model::{
    Reservation, ReservationSpan, ReservationStatus, Resource, ResourceType, TimeWindow,
};
use booking_engine::recommend::{rank, Candidate, ScoringContext};
use booking_engine::suggest::Planner;
use booking_engine::{
    BlackoutPolicy, EngineConfig, InMemoryLedger, OperatingHours, PreferenceProfile,
};
use chrono::{Duration, NaiveDate, NaiveTime};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

/// A window on the half-hour grid between 07:00 and 21:00.
fn arb_window() -> impl Strategy<Value = TimeWindow> {
    (14u32..42, 1u32..=8).prop_map(|(start, len)| {
        let end = (start + len).min(42);
        let at = |half_hours: u32| {
            NaiveTime::from_hms_opt(half_hours / 2, (half_hours % 2) * 30, 0).unwrap()
        };
        TimeWindow::new(at(start), at(end)).unwrap()
    })
}

fn arb_status() -> impl Strategy<Value = ReservationStatus> {
    prop_oneof![
        Just(ReservationStatus::Pending),
        Just(ReservationStatus::Approved),
        Just(ReservationStatus::Denied),
        Just(ReservationStatus::Completed),
        Just(ReservationStatus::Cancelled),
    ]
}

/// Facility bookings spread over the requested date and the next 15 days.
fn arb_ledger() -> impl Strategy<Value = Vec<Reservation>> {
    prop::collection::vec((0u64..16, arb_window(), arb_status()), 0..60).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (offset, window, status))| {
                let date = base_date() + Duration::days(offset as i64);
                Reservation {
                    id: i as u64 + 1,
                    resource_type: ResourceType::Facility,
                    resource_id: 1,
                    requester_id: 1,
                    span: ReservationSpan::Timed { date, window },
                    status,
                    quantity: 1,
                    created_at: base_date().and_hms_opt(0, 0, 0).unwrap(),
                }
            })
            .collect()
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Overlap predicate
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn overlap_is_symmetric(a in arb_window(), b in arb_window()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn touching_intervals_never_overlap(a in 0i64..1000, len_a in 1i64..100, len_b in 1i64..100) {
        let b = a + len_a;
        prop_assert!(!overlaps(a, b, b, b + len_b));
        prop_assert!(!overlaps(b, b + len_b, a, b));
    }
}

// ---------------------------------------------------------------------------
// Slot generator
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_fit_inside_operating_hours(minutes in 1i64..=720) {
        let hours = OperatingHours::default();
        let duration = Duration::minutes(minutes);
        let slots: Vec<TimeWindow> = hours.slots(duration).collect();

        for slot in &slots {
            prop_assert!(slot.start() >= hours.opening);
            prop_assert!(slot.end() <= hours.closing);
            prop_assert_eq!(slot.duration(), duration);
        }
        for pair in slots.windows(2) {
            prop_assert_eq!(pair[1].start() - pair[0].start(), hours.step);
        }
        // Every start on the grid whose window fits is generated.
        let expected = (720 - minutes) / 30 + 1;
        prop_assert_eq!(slots.len() as i64, expected);
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn planner_respects_cap_and_never_suggests_a_conflict(
        rows in arb_ledger(),
        requested in arb_window(),
        cap in 1usize..=5,
    ) {
        let mut ledger = InMemoryLedger::new();
        ledger.reservations = rows;
        let hist = histogram(&ledger.reservations);
        let config = EngineConfig { max_suggestions: cap, ..EngineConfig::default() };
        let planner = Planner::new(&ledger, &hist, &config);
        let requirement = Requirement::Window { window: requested, passengers: 1 };

        let hall = Resource::facility(1, "Hall");

        let suggestions = planner.suggest(&hall, base_date(), &requirement).unwrap();

        prop_assert!(suggestions.len() <= cap);
        for s in &suggestions {
            let window = s.window.unwrap();
            prop_assert_eq!(window.duration(), requested.duration());
            let blocked = ledger.reservations.iter().any(|r| r.blocks(s.date, &window));
            prop_assert!(!blocked, "suggested {} on {} conflicts", window, s.date);
        }
        for (i, a) in suggestions.iter().enumerate() {
            for b in &suggestions[i + 1..] {
                prop_assert!(a.date != b.date || a.window != b.window, "duplicate suggestion");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn ranking_is_sorted_and_ranks_are_positions(
        demands in prop::collection::vec((0u32..6, 0u32..10), 1..12),
        window in arb_window(),
    ) {
        let candidates: Vec<Candidate> = demands
            .iter()
            .enumerate()
            .map(|(i, &(same_day_demand, usage_count))| Candidate {
                resource: Resource::facility(i as u64 + 1, format!("Room {:02}", i)),
                available_quantity: None,
                same_day_demand,
                usage_count,
            })
            .collect();
        let profile = PreferenceProfile::empty(1, ResourceType::Facility);
        let ctx = ScoringContext {
            resource_type: ResourceType::Facility,
            window,
            passengers: 1,
            blackouts: &[],
            blackout_policy: BlackoutPolicy::Global,
        };

        let ranked = rank(&candidates, &profile, &ctx);

        prop_assert_eq!(ranked.len(), candidates.len());
        for (i, rec) in ranked.iter().enumerate() {
            prop_assert_eq!(rec.rank, i + 1);
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                prop_assert!(pair[0].resource.id < pair[1].resource.id, "ties keep input order");
            }
        }
    }
}
