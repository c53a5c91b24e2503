//! Query facade: one synchronous call per use case.
//!
//! [`Engine`] borrows the host's stores and answers check-availability,
//! suggest-alternatives, get-recommendations and day-grid queries. It keeps
//! no state between calls; every query re-reads the ledger. Requests are
//! validated before any store is touched.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BlackoutPolicy, Clock, EngineConfig};
use crate::conflict::{self, Conflict, Requirement};
use crate::demand::{lookback_start, Histogram};
use crate::error::{EngineError, Result};
use crate::model::{
    BlackoutEvent, Granularity, RequesterId, Resource, ResourceId, ResourceType, TimeWindow,
    DEMAND_STATUSES,
};
use crate::prediction::{self, BookingFeatures, PredictionService, RequesterStats, RiskAssessment};
use crate::preference::PreferenceProfile;
use crate::recommend::{self, Candidate, Recommendation, ScoringContext};
use crate::slots::GridSlot;
use crate::store::{BlackoutStore, PreferenceStore, ReservationStore, ResourceStore};
use crate::suggest::{Planner, Suggestion};

/// A request to book one specific resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub resource_type: ResourceType,
    pub resource_id: ResourceId,
    pub date: NaiveDate,
    pub requirement: Requirement,
    /// Needed only for risk predictions.
    #[serde(default)]
    pub requester_id: Option<RequesterId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub resource_type: ResourceType,
    pub resource_id: ResourceId,
    pub date: NaiveDate,
    pub available: bool,
    pub conflicts: Vec<Conflict>,
    /// Human-readable form of `conflicts`, same order.
    pub messages: Vec<String>,
    /// Units left on the date; items only.
    pub available_quantity: Option<u32>,
    /// Advisory: scheduled events overlapping the requested window.
    pub blackouts: Vec<BlackoutEvent>,
    /// Alternatives, planned only when the request conflicts.
    pub suggestions: Vec<Suggestion>,
    /// Present when the request is free, a predictor is attached and the
    /// requester is known.
    pub prediction: Option<RiskAssessment>,
}

/// A request for resource recommendations when no resource is picked yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub resource_type: ResourceType,
    pub requester_id: RequesterId,
    pub date: NaiveDate,
    /// Defaults to the configured default window.
    #[serde(default)]
    pub window: Option<TimeWindow>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default = "one")]
    pub passengers: u32,
}

fn one() -> u32 {
    1
}

impl RecommendationRequest {
    pub fn new(resource_type: ResourceType, requester_id: RequesterId, date: NaiveDate) -> Self {
        Self {
            resource_type,
            requester_id,
            date,
            window: None,
            quantity: 1,
            passengers: 1,
        }
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    /// Best first, at most `recommendation_limit` entries.
    pub recommendations: Vec<Recommendation>,
    pub profile: PreferenceProfile,
    pub blackouts: Vec<BlackoutEvent>,
}

/// The availability and recommendation engine over borrowed stores.
pub struct Engine<'a> {
    catalog: &'a dyn ResourceStore,
    ledger: &'a dyn ReservationStore,
    blackouts: &'a dyn BlackoutStore,
    preferences: Option<&'a dyn PreferenceStore>,
    predictor: Option<&'a dyn PredictionService>,
    config: EngineConfig,
    clock: Clock,
}

impl<'a> Engine<'a> {
    pub fn new(
        catalog: &'a dyn ResourceStore,
        ledger: &'a dyn ReservationStore,
        blackouts: &'a dyn BlackoutStore,
    ) -> Self {
        Self {
            catalog,
            ledger,
            blackouts,
            preferences: None,
            predictor: None,
            config: EngineConfig::default(),
            clock: Clock::default(),
        }
    }

    /// An engine over one backend that serves every store, preferences included.
    pub fn over<S>(store: &'a S) -> Self
    where
        S: ResourceStore + ReservationStore + BlackoutStore + PreferenceStore,
    {
        Self::new(store, store, store).with_preferences(store)
    }

    /// Replace the configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Config` if `config` fails validation.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_preferences(mut self, preferences: &'a dyn PreferenceStore) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_predictor(mut self, predictor: &'a dyn PredictionService) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Today in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        self.clock.today(self.config.timezone)
    }

    /// Check whether one resource can satisfy a request.
    ///
    /// Conflicts are computed against pending and approved reservations. When
    /// the request conflicts and the resource exists, alternatives are planned;
    /// when it is free, a risk assessment is attached if possible. A resource
    /// missing from the catalog is reported as unavailable, not as an error.
    ///
    /// # Errors
    /// `EngineError::InvalidInput` for a malformed request (before any store
    /// access); `EngineError::StoreUnavailable` if a store read fails.
    pub fn check_availability(&self, request: &AvailabilityRequest) -> Result<AvailabilityReport> {
        validate_requirement(request.resource_type, &request.requirement)?;
        self.run_check(request).inspect_err(log_store_failure)
    }

    fn run_check(&self, request: &AvailabilityRequest) -> Result<AvailabilityReport> {
        let AvailabilityRequest {
            resource_type,
            resource_id,
            date,
            requirement,
            requester_id,
        } = *request;

        let resource = self.catalog.get(resource_type, resource_id)?;
        let check = conflict::check(
            self.ledger,
            resource_type,
            resource_id,
            resource.as_ref(),
            date,
            &requirement,
        )?;

        let blackouts = match requirement.window() {
            Some(window) => self.blackouts_for(date, &window, resource_type, resource_id)?,
            None => Vec::new(),
        };

        let suggestions = match &resource {
            Some(resource) if !check.is_clear() => self.plan(resource, date, &requirement)?,
            _ => Vec::new(),
        };

        let prediction = match (check.is_clear(), self.predictor, requester_id) {
            (true, Some(predictor), Some(requester)) => Some(self.assess(
                predictor,
                resource_type,
                resource_id,
                requester,
                date,
                requirement.window(),
            )?),
            _ => None,
        };

        debug!(
            %resource_type,
            resource_id,
            %date,
            conflicts = check.conflicts.len(),
            blackouts = blackouts.len(),
            suggestions = suggestions.len(),
            "checked availability"
        );

        Ok(AvailabilityReport {
            resource_type,
            resource_id,
            date,
            available: check.is_clear(),
            messages: check.conflicts.iter().map(Conflict::message).collect(),
            conflicts: check.conflicts,
            available_quantity: check.available_quantity,
            blackouts,
            suggestions,
            prediction,
        })
    }

    /// Plan alternatives for a request, whether or not it conflicts.
    ///
    /// Returns an empty list for a resource missing from the catalog.
    ///
    /// # Errors
    /// `EngineError::InvalidInput` for a malformed request;
    /// `EngineError::StoreUnavailable` if a store read fails.
    pub fn suggest_alternatives(&self, request: &AvailabilityRequest) -> Result<Vec<Suggestion>> {
        validate_requirement(request.resource_type, &request.requirement)?;
        let run = || -> Result<Vec<Suggestion>> {
            match self.catalog.get(request.resource_type, request.resource_id)? {
                Some(resource) => self.plan(&resource, request.date, &request.requirement),
                None => Ok(Vec::new()),
            }
        };
        run().inspect_err(log_store_failure)
    }

    /// Rank the available resources of a type for a requester.
    ///
    /// # Errors
    /// `EngineError::InvalidInput` for a zero quantity or passenger count;
    /// `EngineError::StoreUnavailable` if a store read fails.
    pub fn get_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationReport> {
        if request.quantity == 0 {
            return Err(EngineError::InvalidInput("quantity must be at least 1".into()));
        }
        if request.passengers == 0 {
            return Err(EngineError::InvalidInput("passengers must be at least 1".into()));
        }
        self.run_recommendations(request).inspect_err(log_store_failure)
    }

    fn run_recommendations(&self, request: &RecommendationRequest) -> Result<RecommendationReport> {
        let window = request.window.unwrap_or(self.config.default_window);
        let profile = self.preference_profile(request.requester_id, request.resource_type)?;
        let candidates = self.discover(request, &window)?;
        let blackouts = self.blackouts.overlapping_events(request.date, &window)?;

        let ctx = ScoringContext {
            resource_type: request.resource_type,
            window,
            passengers: request.passengers,
            blackouts: &blackouts,
            blackout_policy: self.config.blackout_policy,
        };
        let mut recommendations = recommend::rank(&candidates, &profile, &ctx);
        recommendations.truncate(self.config.recommendation_limit);

        debug!(
            resource_type = %request.resource_type,
            requester_id = request.requester_id,
            candidates = candidates.len(),
            returned = recommendations.len(),
            "ranked recommendations"
        );

        Ok(RecommendationReport {
            recommendations,
            profile,
            blackouts,
        })
    }

    /// Build a requester's preference profile for one resource type.
    ///
    /// # Errors
    /// `EngineError::StoreUnavailable` if a store read fails.
    pub fn preference_profile(
        &self,
        requester_id: RequesterId,
        resource_type: ResourceType,
    ) -> Result<PreferenceProfile> {
        let history = self.ledger.by_requester(resource_type, requester_id)?;

        let mut categories = HashMap::new();
        if resource_type.is_pooled() {
            let ids: BTreeSet<ResourceId> = history.iter().map(|r| r.resource_id).collect();
            for id in ids {
                let resource = self.catalog.get(resource_type, id)?;
                if let Some(category) = resource.and_then(|r| r.category) {
                    categories.insert(id, category);
                }
            }
        }

        let stored = match self.preferences {
            Some(store) => store.stored_summary(requester_id)?,
            None => None,
        };
        Ok(PreferenceProfile::build(
            requester_id,
            resource_type,
            &history,
            &categories,
            stored.as_ref(),
        ))
    }

    /// Every operating-hours step slot for a facility or vehicle on `date`.
    ///
    /// Slots of a resource missing from the catalog are all unavailable.
    ///
    /// # Errors
    /// `EngineError::InvalidInput` for items, which are booked by date;
    /// `EngineError::StoreUnavailable` if a store read fails.
    pub fn day_grid(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
        date: NaiveDate,
    ) -> Result<Vec<GridSlot>> {
        if resource_type.granularity() != Granularity::Slot {
            return Err(EngineError::InvalidInput(format!(
                "{} bookings cover whole dates and have no day grid",
                resource_type
            )));
        }
        let run = || -> Result<Vec<GridSlot>> {
            let exists = self.catalog.get(resource_type, resource_id)?.is_some();
            let booked = self.ledger.on_date(resource_type, resource_id, date)?;
            let mut grid = self.config.hours().day_grid(&booked, date);
            if !exists {
                grid.iter_mut().for_each(|slot| slot.available = false);
            }
            Ok(grid)
        };
        run().inspect_err(log_store_failure)
    }

    fn histogram(&self, resource: &Resource) -> Result<Histogram> {
        let since = lookback_start(self.today(), self.config.demand_lookback_months);
        Ok(self.ledger.frequency_histogram(resource.resource_type, resource.id, since)?)
    }

    fn plan(
        &self,
        resource: &Resource,
        date: NaiveDate,
        requirement: &Requirement,
    ) -> Result<Vec<Suggestion>> {
        let histogram = self.histogram(resource)?;
        Planner::new(self.ledger, &histogram, &self.config).suggest(resource, date, requirement)
    }

    /// Available catalog resources that satisfy the request, in name order.
    fn discover(
        &self,
        request: &RecommendationRequest,
        window: &TimeWindow,
    ) -> Result<Vec<Candidate>> {
        let requirement = if request.resource_type.is_pooled() {
            Requirement::Units {
                quantity: request.quantity,
            }
        } else {
            Requirement::Window {
                window: *window,
                passengers: request.passengers,
            }
        };

        let mut candidates = Vec::new();
        for resource in self.catalog.list_available(request.resource_type)? {
            let check = conflict::check(
                self.ledger,
                resource.resource_type,
                resource.id,
                Some(&resource),
                request.date,
                &requirement,
            )?;
            if !check.is_clear() {
                continue;
            }
            let same_day_demand = self.ledger.count_starting_on(
                resource.resource_type,
                resource.id,
                request.date,
                DEMAND_STATUSES,
            )?;
            let usage_count = self.ledger.usage_count(resource.resource_type, resource.id)?;
            candidates.push(Candidate {
                resource,
                available_quantity: check.available_quantity,
                same_day_demand,
                usage_count,
            });
        }
        Ok(candidates)
    }

    fn blackouts_for(
        &self,
        date: NaiveDate,
        window: &TimeWindow,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> Result<Vec<BlackoutEvent>> {
        let events = self.blackouts.overlapping_events(date, window)?;
        Ok(match self.config.blackout_policy {
            BlackoutPolicy::PerResource => events
                .into_iter()
                .filter(|e| e.applies_to(resource_type, resource_id))
                .collect(),
            BlackoutPolicy::Global => events,
        })
    }

    fn assess(
        &self,
        predictor: &dyn PredictionService,
        resource_type: ResourceType,
        resource_id: ResourceId,
        requester_id: RequesterId,
        date: NaiveDate,
        window: Option<TimeWindow>,
    ) -> Result<RiskAssessment> {
        let history = self.ledger.by_requester(resource_type, requester_id)?;
        let stats = RequesterStats::from_history(&history);
        let demand = self
            .ledger
            .count_starting_on(resource_type, resource_id, date, DEMAND_STATUSES)?;
        let now = self.clock.now(self.config.timezone);
        let features = BookingFeatures::new(date, window, now, &stats, demand);
        Ok(prediction::assess(predictor, features))
    }
}

fn validate_requirement(resource_type: ResourceType, requirement: &Requirement) -> Result<()> {
    match (resource_type, requirement) {
        (ResourceType::Item, Requirement::Units { quantity: 0 }) => {
            Err(EngineError::InvalidInput("quantity must be at least 1".into()))
        }
        (ResourceType::Item, Requirement::Units { .. }) => Ok(()),
        (ResourceType::Vehicle, Requirement::Window { passengers: 0, .. }) => {
            Err(EngineError::InvalidInput("passengers must be at least 1".into()))
        }
        (ResourceType::Facility | ResourceType::Vehicle, Requirement::Window { .. }) => Ok(()),
        (ResourceType::Item, Requirement::Window { .. }) => Err(EngineError::InvalidInput(
            "item requests need a quantity, not a time window".into(),
        )),
        (_, Requirement::Units { .. }) => Err(EngineError::InvalidInput(format!(
            "{} requests need a time window, not a quantity",
            resource_type
        ))),
    }
}

fn log_store_failure(error: &EngineError) {
    if error.is_retryable() {
        warn!(%error, "store read failed");
    }
}
