//! Detect conflicts between a requested booking and the reservation ledger.
//!
//! Clock-window resources (facilities, vehicles) conflict on interval overlap.
//! Pooled resources (items) conflict on quantity: borrowings may co-exist until
//! their summed quantity exhausts the stock.
//!
//! Adjacent windows (where one ends exactly when another starts) are NOT conflicts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{
    CapacityKind, Reservation, Resource, ResourceId, ResourceType, TimeWindow, ACTIVE_STATUSES,
};
use crate::store::ReservationStore;

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)` overlap
/// iff `a_start < b_end && a_end > b_start`.
///
/// Symmetric, and false for adjacent intervals.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && a_end > b_start
}

/// What the requester needs from the resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    /// A clock window; `passengers` only matters for vehicles.
    Window { window: TimeWindow, passengers: u32 },
    /// A number of units of a pooled item.
    Units { quantity: u32 },
}

impl Requirement {
    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            Requirement::Window { window, .. } => Some(*window),
            Requirement::Units { .. } => None,
        }
    }
}

/// Not enough units left of a pooled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub available_quantity: u32,
    pub requested_quantity: u32,
}

/// One reason a request cannot be satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// An active reservation overlaps the requested window.
    Reservation {
        reservation: Reservation,
        overlap_minutes: i64,
    },
    /// The vehicle seats fewer passengers than requested.
    Capacity { capacity: u32, passengers: u32 },
    /// Not enough units of the item on the requested date.
    Shortfall(Shortfall),
    /// The resource is not in the catalog.
    Missing,
}

impl Conflict {
    pub fn message(&self) -> String {
        match self {
            Conflict::Reservation { reservation, .. } => match reservation.span.window() {
                Some(w) => format!("Already reserved {} (reservation #{})", w, reservation.id),
                None => format!("Already reserved (reservation #{})", reservation.id),
            },
            Conflict::Capacity { capacity, passengers } => {
                format!("Seats {} passengers, {} requested", capacity, passengers)
            }
            Conflict::Shortfall(s) => format!("Only {} units available", s.available_quantity),
            Conflict::Missing => "Resource not found".to_string(),
        }
    }
}

/// Outcome of checking one resource against the ledger.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConflictCheck {
    pub conflicts: Vec<Conflict>,
    /// Units left on the date; items only.
    pub available_quantity: Option<u32>,
}

impl ConflictCheck {
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn shortfall(&self) -> Option<&Shortfall> {
        self.conflicts.iter().find_map(|c| match c {
            Conflict::Shortfall(s) => Some(s),
            _ => None,
        })
    }
}

/// Find every active reservation in `reservations` that overlaps `window` on `date`.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(
    reservations: &[Reservation],
    date: NaiveDate,
    window: &TimeWindow,
) -> Vec<Conflict> {
    reservations
        .iter()
        .filter(|r| r.blocks(date, window))
        .filter_map(|r| {
            let other = r.span.window()?;
            let overlap_start = other.start().max(window.start());
            let overlap_end = other.end().min(window.end());
            Some(Conflict::Reservation {
                reservation: r.clone(),
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            })
        })
        .collect()
}

/// Whether `window` on `date` is free of every active reservation in `reservations`.
pub fn is_window_free(reservations: &[Reservation], date: NaiveDate, window: &TimeWindow) -> bool {
    !reservations.iter().any(|r| r.blocks(date, window))
}

/// Units of a pooled item left on `date`, given its stock and the reservations
/// occupying that date. Only active reservations hold stock.
pub fn available_quantity(stock: u32, reservations: &[Reservation], date: NaiveDate) -> u32 {
    let held: u32 = reservations
        .iter()
        .filter(|r| r.status.is_active() && r.span.covers(date))
        .map(|r| r.quantity)
        .sum();
    stock.saturating_sub(held)
}

/// Check one resource for `requirement` on `date`.
///
/// `resource` is the catalog record, or `None` when it does not exist; a
/// missing item has zero stock, a missing facility or vehicle is reported as
/// [`Conflict::Missing`]. Read-only.
///
/// # Errors
/// Returns `EngineError::InvalidInput` if `requirement` does not match the
/// resource type's capacity semantics, and `EngineError::StoreUnavailable`
/// if the ledger cannot be read.
pub fn check(
    ledger: &dyn ReservationStore,
    resource_type: ResourceType,
    resource_id: ResourceId,
    resource: Option<&Resource>,
    date: NaiveDate,
    requirement: &Requirement,
) -> Result<ConflictCheck> {
    match (resource_type.capacity_kind(), requirement) {
        (CapacityKind::Quantity, Requirement::Units { quantity }) => {
            let stock = resource.map_or(0, Resource::capacity_or_zero);
            let held = ledger.sum_quantity(resource_id, date, ACTIVE_STATUSES)?;
            let available = stock.saturating_sub(held);
            let mut conflicts = Vec::new();
            if available < *quantity {
                conflicts.push(Conflict::Shortfall(Shortfall {
                    available_quantity: available,
                    requested_quantity: *quantity,
                }));
            }
            Ok(ConflictCheck {
                conflicts,
                available_quantity: Some(available),
            })
        }
        (kind, Requirement::Window { window, passengers }) if kind != CapacityKind::Quantity => {
            let Some(resource) = resource else {
                return Ok(ConflictCheck {
                    conflicts: vec![Conflict::Missing],
                    available_quantity: None,
                });
            };
            let mut conflicts = Vec::new();
            if kind == CapacityKind::Passengers && resource.capacity_or_zero() < *passengers {
                conflicts.push(Conflict::Capacity {
                    capacity: resource.capacity_or_zero(),
                    passengers: *passengers,
                });
            }
            let overlapping = ledger.list_overlapping(
                resource_type,
                resource_id,
                date,
                window,
                ACTIVE_STATUSES,
            )?;
            conflicts.extend(find_conflicts(&overlapping, date, window));
            Ok(ConflictCheck {
                conflicts,
                available_quantity: None,
            })
        }
        _ => Err(EngineError::InvalidInput(format!(
            "{} requests need {}",
            resource_type,
            if resource_type.is_pooled() { "a quantity" } else { "a time window" }
        ))),
    }
}
