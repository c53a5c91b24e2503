//! # booking-engine
//!
//! Availability checks, alternative slot planning and preference-weighted
//! recommendations for bookable facilities, vehicles and pooled items.
//!
//! The engine reads an externally owned catalog and reservation ledger through
//! the traits in [`store`]; it never writes and keeps no state between calls.
//! [`InMemoryLedger`] implements every store for tests and front-ends.
//!
//! ## Modules
//!
//! - [`model`]: resources, time windows, reservations, blackout events
//! - [`conflict`]: overlap and quantity conflict detection
//! - [`slots`]: candidate windows within operating hours, day grid
//! - [`demand`]: historical booking frequency and busy levels
//! - [`suggest`]: tiered alternative-slot planner
//! - [`preference`]: requester preference profiles
//! - [`recommend`]: additive scoring and ranking
//! - [`prediction`]: approval / no-show features and fallbacks
//! - [`engine`]: the query facade
//! - [`config`]: engine tunables and clock
//! - [`store`] / [`memory`]: store traits and the in-memory ledger
//! - [`error`]: error types

pub mod config;
pub mod conflict;
pub mod demand;
pub mod engine;
pub mod error;
pub mod memory;
pub mod model;
pub mod prediction;
pub mod preference;
pub mod recommend;
pub mod slots;
pub mod store;
pub mod suggest;

pub use config::{BlackoutPolicy, Clock, EngineConfig};
pub use conflict::{find_conflicts, overlaps, Conflict, ConflictCheck, Requirement};
pub use demand::{BusyLevel, Histogram, SlotCandidate};
pub use engine::{
    AvailabilityReport, AvailabilityRequest, Engine, RecommendationReport, RecommendationRequest,
};
pub use error::{EngineError, PredictionError, Result, StoreError};
pub use memory::InMemoryLedger;
pub use model::{
    BlackoutEvent, Reservation, ReservationSpan, ReservationStatus, Resource, ResourceType,
    TimeWindow,
};
pub use prediction::{PredictionService, RiskAssessment};
pub use preference::PreferenceProfile;
pub use recommend::Recommendation;
pub use slots::{GridSlot, OperatingHours};
pub use suggest::{Suggestion, SuggestionKind};
