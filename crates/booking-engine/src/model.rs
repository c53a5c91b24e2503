//! Core data model: resources, time windows, reservations and blackout events.
//!
//! Clock times are `chrono::NaiveTime` and serialize as `HH:MM:SS`. Dates are
//! calendar dates with no timezone; the engine's [`Clock`](crate::config::Clock)
//! decides what "today" is.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::conflict::overlaps;
use crate::error::EngineError;

pub type ResourceId = u64;
pub type RequesterId = u64;
pub type ReservationId = u64;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// The three kinds of bookable resource.
///
/// Each variant carries its own capacity semantics and scheduling granularity;
/// the algorithms in this crate only ask the type for those, never branch on
/// the ledger layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Item,
    Facility,
    Vehicle,
}

/// How a resource type is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Clock windows within operating hours.
    Slot,
    /// Whole calendar dates (date-range borrowing).
    Day,
}

/// What a resource's `capacity` number means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    /// No capacity; one booking at a time.
    Exclusive,
    /// Maximum passengers; still one booking at a time.
    Passengers,
    /// Pooled stock shared by concurrent borrowings.
    Quantity,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Item,
        ResourceType::Facility,
        ResourceType::Vehicle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Item => "item",
            ResourceType::Facility => "facility",
            ResourceType::Vehicle => "vehicle",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            ResourceType::Item => Granularity::Day,
            ResourceType::Facility | ResourceType::Vehicle => Granularity::Slot,
        }
    }

    pub fn capacity_kind(self) -> CapacityKind {
        match self {
            ResourceType::Item => CapacityKind::Quantity,
            ResourceType::Facility => CapacityKind::Exclusive,
            ResourceType::Vehicle => CapacityKind::Passengers,
        }
    }

    /// Pooled resources may hold overlapping reservations up to their quantity.
    pub fn is_pooled(self) -> bool {
        self.capacity_kind() == CapacityKind::Quantity
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "item" => Ok(ResourceType::Item),
            "facility" => Ok(ResourceType::Facility),
            "vehicle" => Ok(ResourceType::Vehicle),
            other => Err(EngineError::UnknownResourceType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    #[default]
    Available,
    Unavailable,
}

/// A catalog record for a bookable resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(default)]
    pub status: ResourceStatus,
    /// Item: stock quantity. Vehicle: passenger seats. Facility: unused.
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Item category, used for preference matching.
    #[serde(default)]
    pub category: Option<String>,
    /// Item borrowings are approved without an administrator.
    #[serde(default)]
    pub auto_approve: bool,
}

impl Resource {
    pub fn facility(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            resource_type: ResourceType::Facility,
            name: name.into(),
            status: ResourceStatus::Available,
            capacity: None,
            category: None,
            auto_approve: false,
        }
    }

    pub fn vehicle(id: ResourceId, name: impl Into<String>, passengers: u32) -> Self {
        Self {
            resource_type: ResourceType::Vehicle,
            capacity: Some(passengers),
            ..Self::facility(id, name)
        }
    }

    pub fn item(
        id: ResourceId,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            resource_type: ResourceType::Item,
            capacity: Some(quantity),
            category: Some(category.into()),
            ..Self::facility(id, name)
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == ResourceStatus::Available
    }

    /// Capacity as a number, treating "no capacity" as zero.
    pub fn capacity_or_zero(&self) -> u32 {
        self.capacity.unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Time windows
// ---------------------------------------------------------------------------

/// A half-open clock window `[start, end)` within a single day.
///
/// Construction enforces `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = EngineError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, EngineError> {
        if start >= end {
            return Err(EngineError::InvalidInput(format!(
                "window start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from `(hour, minute)` pairs.
    pub fn hm(start: (u32, u32), end: (u32, u32)) -> Result<Self, EngineError> {
        let parse = |(h, m): (u32, u32)| {
            NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| {
                EngineError::InvalidInput(format!("invalid clock time {:02}:{:02}", h, m))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// 08:00-17:00.
    pub fn working_day() -> Self {
        Self {
            start: NaiveTime::MIN + Duration::hours(8),
            end: NaiveTime::MIN + Duration::hours(17),
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Half-open overlap: adjacent windows do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        overlaps(self.start, self.end, other.start, other.end)
    }

    /// Part of day the window starts in.
    pub fn day_part(&self) -> DayPart {
        DayPart::of(self.start)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M:%S"), self.end.format("%H:%M:%S"))
    }
}

/// Coarse part of day a booking starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    #[default]
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    /// Morning before 12:00, afternoon before 17:00, evening otherwise.
    pub fn of(time: NaiveTime) -> Self {
        match time.hour() {
            h if h < 12 => DayPart::Morning,
            h if h < 17 => DayPart::Afternoon,
            _ => DayPart::Evening,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Denied,
    Completed,
    Returned,
    Cancelled,
}

/// Statuses that hold a resource and therefore block new requests.
pub const ACTIVE_STATUSES: &[ReservationStatus] =
    &[ReservationStatus::Pending, ReservationStatus::Approved];

/// Statuses that count as historical demand.
pub const DEMAND_STATUSES: &[ReservationStatus] = &[
    ReservationStatus::Pending,
    ReservationStatus::Approved,
    ReservationStatus::Completed,
    ReservationStatus::Returned,
];

impl ReservationStatus {
    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    pub fn counts_as_demand(self) -> bool {
        DEMAND_STATUSES.contains(&self)
    }

    /// The reservation passed approval, whatever happened afterwards.
    pub fn was_approved(self) -> bool {
        matches!(
            self,
            ReservationStatus::Approved | ReservationStatus::Completed | ReservationStatus::Returned
        )
    }

    /// The reservation was used to completion (facility/vehicle completed, item returned).
    pub fn is_fulfilled(self) -> bool {
        matches!(self, ReservationStatus::Completed | ReservationStatus::Returned)
    }
}

/// What a reservation occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReservationSpan {
    /// A clock window on one date (facilities, vehicles).
    Timed { date: NaiveDate, window: TimeWindow },
    /// An inclusive borrow/return date range (items).
    Dated { borrow: NaiveDate, until: NaiveDate },
}

impl ReservationSpan {
    pub fn start_date(&self) -> NaiveDate {
        match self {
            ReservationSpan::Timed { date, .. } => *date,
            ReservationSpan::Dated { borrow, .. } => *borrow,
        }
    }

    /// Whether the reservation occupies `date`.
    ///
    /// Date ranges are inclusive on both ends.
    pub fn covers(&self, date: NaiveDate) -> bool {
        match self {
            ReservationSpan::Timed { date: d, .. } => *d == date,
            ReservationSpan::Dated { borrow, until } => *borrow <= date && date <= *until,
        }
    }

    pub fn window(&self) -> Option<TimeWindow> {
        match self {
            ReservationSpan::Timed { window, .. } => Some(*window),
            ReservationSpan::Dated { .. } => None,
        }
    }
}

/// A requester's claim on a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub resource_type: ResourceType,
    pub resource_id: ResourceId,
    pub requester_id: RequesterId,
    pub span: ReservationSpan,
    pub status: ReservationStatus,
    /// Units borrowed; only meaningful for items.
    #[serde(default = "one")]
    pub quantity: u32,
    pub created_at: NaiveDateTime,
}

fn one() -> u32 {
    1
}

impl Reservation {
    /// Whether this reservation blocks `window` on `date`.
    ///
    /// Only active reservations block; dated spans never block clock windows.
    pub fn blocks(&self, date: NaiveDate, window: &TimeWindow) -> bool {
        self.status.is_active()
            && match self.span {
                ReservationSpan::Timed { date: d, window: w } => d == date && w.overlaps(window),
                ReservationSpan::Dated { .. } => false,
            }
    }
}

// ---------------------------------------------------------------------------
// Blackout events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackoutStatus {
    #[default]
    Scheduled,
    Cancelled,
    Completed,
}

/// Reference to one resource in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: ResourceType,
    pub id: ResourceId,
}

/// An administrative event that discourages, but never blocks, bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackoutEvent {
    pub id: u64,
    pub title: String,
    pub date: NaiveDate,
    pub window: TimeWindow,
    #[serde(default)]
    pub status: BlackoutStatus,
    /// `None` affects every resource.
    #[serde(default)]
    pub scope: Option<ResourceRef>,
}

impl BlackoutEvent {
    pub fn is_scheduled(&self) -> bool {
        self.status == BlackoutStatus::Scheduled
    }

    pub fn overlaps(&self, date: NaiveDate, window: &TimeWindow) -> bool {
        self.date == date && self.window.overlaps(window)
    }

    pub fn applies_to(&self, resource_type: ResourceType, id: ResourceId) -> bool {
        match self.scope {
            None => true,
            Some(scope) => scope.resource_type == resource_type && scope.id == id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_rejects_empty_and_inverted() {
        assert!(TimeWindow::new(t(10, 0), t(10, 0)).is_err());
        assert!(TimeWindow::new(t(11, 0), t(10, 0)).is_err());
        assert!(TimeWindow::new(t(10, 0), t(10, 30)).is_ok());
    }

    #[test]
    fn window_deserialize_validates_order() {
        let ok: TimeWindow =
            serde_json::from_str(r#"{"start":"09:00:00","end":"10:00:00"}"#).unwrap();
        assert_eq!(ok.duration_minutes(), 60);
        let bad = serde_json::from_str::<TimeWindow>(r#"{"start":"10:00:00","end":"09:00:00"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn working_day_is_eight_to_five() {
        assert_eq!(TimeWindow::working_day(), TimeWindow::new(t(8, 0), t(17, 0)).unwrap());
    }

    #[test]
    fn day_part_boundaries() {
        assert_eq!(DayPart::of(t(11, 59)), DayPart::Morning);
        assert_eq!(DayPart::of(t(12, 0)), DayPart::Afternoon);
        assert_eq!(DayPart::of(t(16, 59)), DayPart::Afternoon);
        assert_eq!(DayPart::of(t(17, 0)), DayPart::Evening);
    }

    #[test]
    fn resource_type_parsing() {
        assert_eq!("Facility".parse::<ResourceType>().unwrap(), ResourceType::Facility);
        assert!(matches!(
            "boat".parse::<ResourceType>(),
            Err(EngineError::UnknownResourceType(_))
        ));
    }

    #[test]
    fn dated_span_covers_inclusive_range() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        let span = ReservationSpan::Dated { borrow: d(2), until: d(4) };
        assert!(!span.covers(d(1)));
        assert!(span.covers(d(2)));
        assert!(span.covers(d(4)));
        assert!(!span.covers(d(5)));
    }
}
