//! Engine configuration and the clock used to resolve "today".

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::TimeWindow;
use crate::slots::OperatingHours;

/// Upper bounds on every scan the engine performs.
pub const MAX_LOOKAHEAD_DAYS: u32 = 14;
pub const MAX_LEAST_BUSY_DAYS: u32 = 7;
pub const MAX_LOOKBACK_MONTHS: u32 = 6;
pub const MAX_SUGGESTIONS: usize = 10;

/// How the blackout penalty is attributed to recommendation candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackoutPolicy {
    /// Any blackout overlapping the requested window penalizes every candidate.
    #[default]
    Global,
    /// Only blackouts that are unscoped or scoped to the candidate penalize it.
    PerResource,
}

/// Tunables for every query. All fields have defaults, so a partial config
/// file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub slot_step_minutes: u32,
    /// Cap on alternatives returned by the planner.
    pub max_suggestions: usize,
    /// Days scanned forward for the same window (or item headroom).
    pub next_date_lookahead_days: u32,
    /// Days, starting at the requested date, searched for least-busy slots.
    pub least_busy_days: u32,
    pub demand_lookback_months: u32,
    pub recommendation_limit: usize,
    /// Timezone in which "today" is evaluated.
    pub timezone: Tz,
    pub blackout_policy: BlackoutPolicy,
    /// Window assumed when a recommendation request carries none.
    pub default_window: TimeWindow,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let hours = OperatingHours::default();
        Self {
            opening: hours.opening,
            closing: hours.closing,
            slot_step_minutes: 30,
            max_suggestions: 3,
            next_date_lookahead_days: 14,
            least_busy_days: 7,
            demand_lookback_months: 6,
            recommendation_limit: 3,
            timezone: Tz::UTC,
            blackout_policy: BlackoutPolicy::Global,
            default_window: TimeWindow::working_day(),
        }
    }
}

impl EngineConfig {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `EngineError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.opening >= self.closing {
            return Err(EngineError::Config(format!(
                "opening {} must be before closing {}",
                self.opening, self.closing
            )));
        }
        if self.slot_step_minutes == 0 {
            return Err(EngineError::Config("slot_step_minutes must be positive".into()));
        }
        if self.max_suggestions == 0 {
            return Err(EngineError::Config("max_suggestions must be positive".into()));
        }
        if self.recommendation_limit == 0 {
            return Err(EngineError::Config("recommendation_limit must be positive".into()));
        }
        if self.next_date_lookahead_days == 0 || self.least_busy_days == 0 {
            return Err(EngineError::Config("lookahead windows must be at least one day".into()));
        }
        if self.next_date_lookahead_days > MAX_LOOKAHEAD_DAYS {
            return Err(EngineError::Config(format!(
                "next_date_lookahead_days must be at most {}",
                MAX_LOOKAHEAD_DAYS
            )));
        }
        if self.least_busy_days > MAX_LEAST_BUSY_DAYS {
            return Err(EngineError::Config(format!(
                "least_busy_days must be at most {}",
                MAX_LEAST_BUSY_DAYS
            )));
        }
        if self.demand_lookback_months > MAX_LOOKBACK_MONTHS {
            return Err(EngineError::Config(format!(
                "demand_lookback_months must be at most {}",
                MAX_LOOKBACK_MONTHS
            )));
        }
        if self.max_suggestions > MAX_SUGGESTIONS {
            return Err(EngineError::Config(format!(
                "max_suggestions must be at most {}",
                MAX_SUGGESTIONS
            )));
        }
        Ok(())
    }

    pub fn hours(&self) -> OperatingHours {
        OperatingHours {
            opening: self.opening,
            closing: self.closing,
            step: Duration::minutes(i64::from(self.slot_step_minutes)),
        }
    }
}

/// Source of the current local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall-clock time in the configured timezone.
    #[default]
    System,
    /// A pinned instant, for reproducible results.
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self, tz: Tz) -> NaiveDateTime {
        match self {
            Clock::System => Utc::now().with_timezone(&tz).naive_local(),
            Clock::Fixed(at) => *at,
        }
    }

    pub fn today(&self, tz: Tz) -> NaiveDate {
        self.now(tz).date()
    }
}
