use std::hint::black_box;

use booking_engine::conflict::Requirement;
use booking_engine::demand::histogram;
use booking_engine::model::{
    Reservation, ReservationSpan, ReservationStatus, Resource, ResourceType, TimeWindow,
};
use booking_engine::suggest::Planner;
use booking_engine::{Clock, Engine, EngineConfig, InMemoryLedger, RecommendationRequest};
use chrono::{Duration, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// Twenty facilities, each booked twice a day for six months.
fn busy_ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    let mut id = 0;
    for facility in 1..=20u64 {
        let name = format!("Facility {:02}", facility);
        ledger = ledger.with_resource(Resource::facility(facility, name));
        for day in -180i64..14 {
            let date = start() + Duration::days(day);
            let daily = [
                (9, ReservationStatus::Completed),
                (14, ReservationStatus::Approved),
            ];
            for (h, status) in daily {
                id += 1;
                let hour = (h + facility as u32 % 3) % 19;
                ledger = ledger.with_reservation(Reservation {
                    id,
                    resource_type: ResourceType::Facility,
                    resource_id: facility,
                    requester_id: id % 50,
                    span: ReservationSpan::Timed {
                        date,
                        window: TimeWindow::hm((hour, 0), (hour + 1, 0)).unwrap(),
                    },
                    status,
                    quantity: 1,
                    created_at: date.and_hms_opt(7, 0, 0).unwrap(),
                });
            }
        }
    }
    ledger
}

fn bench_planner(c: &mut Criterion) {
    let ledger = busy_ledger();
    let hist = histogram(&ledger.reservations);
    let config = EngineConfig::default();
    let planner = Planner::new(&ledger, &hist, &config);
    let hall = Resource::facility(1, "Facility 01");
    let requirement = Requirement::Window {
        window: TimeWindow::hm((10, 0), (11, 0)).unwrap(),
        passengers: 1,
    };

    c.bench_function("suggest_alternatives", |b| {
        b.iter(|| planner.suggest(black_box(&hall), black_box(start()), black_box(&requirement)))
    });
}

fn bench_recommendations(c: &mut Criterion) {
    let ledger = busy_ledger();
    let now = start().and_hms_opt(8, 0, 0).unwrap();
    let engine = Engine::over(&ledger).with_clock(Clock::Fixed(now));
    let request = RecommendationRequest::new(ResourceType::Facility, 7, start() + Duration::days(3))
        .with_window(TimeWindow::hm((15, 0), (17, 0)).unwrap());

    c.bench_function("get_recommendations", |b| {
        b.iter(|| engine.get_recommendations(black_box(&request)))
    });
}

criterion_group!(benches, bench_planner, bench_recommendations);
criterion_main!(benches);
