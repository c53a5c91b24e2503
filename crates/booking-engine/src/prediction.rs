//! Approval and no-show risk, from an external prediction service.
//!
//! The engine engineers the features and interprets the raw outputs; the
//! model itself lives behind [`PredictionService`]. A failing or malformed
//! service never fails a query: [`assess`] substitutes the fallback
//! predictions and logs a warning.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PredictionError;
use crate::model::{Reservation, TimeWindow};

/// Minimum confidence for an approve verdict to become an auto-approval.
pub const AUTO_APPROVE_CONFIDENCE: f64 = 0.7;
/// No-show probability above which an extra reminder is sent.
pub const EXTRA_REMINDER_THRESHOLD: f64 = 0.6;
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Rate assumed when the requester has no relevant history.
const NEUTRAL_RATE: f64 = 0.5;

/// A requester's track record for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequesterStats {
    /// Reservations that passed approval over all reservations.
    pub approval_rate: f64,
    /// Completed or returned over reservations that passed approval.
    pub completion_rate: f64,
    pub total: u32,
}

impl RequesterStats {
    pub fn from_history(history: &[Reservation]) -> Self {
        let total = history.len() as u32;
        let approved = history.iter().filter(|r| r.status.was_approved()).count() as u32;
        let fulfilled = history.iter().filter(|r| r.status.is_fulfilled()).count() as u32;

        let ratio = |num: u32, den: u32| {
            if den == 0 {
                NEUTRAL_RATE
            } else {
                f64::from(num) / f64::from(den)
            }
        };
        Self {
            approval_rate: ratio(approved, total),
            completion_rate: ratio(fulfilled, approved),
            total,
        }
    }
}

/// Model inputs for one prospective booking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookingFeatures {
    pub hour_of_day: u32,
    /// ISO weekday, Monday = 1.
    pub day_of_week: u32,
    /// Fractional days between now and the booking start.
    pub advance_booking_days: f64,
    pub duration_hours: f64,
    pub user_approval_rate: f64,
    pub user_completion_rate: f64,
    pub same_day_demand: u32,
    pub is_weekend: bool,
}

impl BookingFeatures {
    /// Features for a booking on `date`. Window-less (item) bookings start at
    /// midnight and last the whole day.
    pub fn new(
        date: NaiveDate,
        window: Option<TimeWindow>,
        now: NaiveDateTime,
        stats: &RequesterStats,
        same_day_demand: u32,
    ) -> Self {
        let (start, hours) = match window {
            Some(w) => (date.and_time(w.start()), w.duration_minutes() as f64 / 60.0),
            None => (date.and_time(chrono::NaiveTime::MIN), 24.0),
        };
        let weekday = date.weekday();
        Self {
            hour_of_day: start.hour(),
            day_of_week: weekday.number_from_monday(),
            advance_booking_days: (start - now).num_seconds() as f64 / 86_400.0,
            duration_hours: hours,
            user_approval_rate: stats.approval_rate,
            user_completion_rate: stats.completion_rate,
            same_day_demand,
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        }
    }
}

/// A classifier's raw approval verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovalScore {
    pub approve: bool,
    /// Probability of the predicted class, in `[0, 1]`.
    pub confidence: f64,
}

/// Opaque model mapping booking features to approval and no-show outcomes.
pub trait PredictionService {
    fn predict_approval(
        &self,
        features: &BookingFeatures,
    ) -> Result<ApprovalScore, PredictionError>;

    /// Probability, in `[0, 1]`, that the requester does not show up.
    fn predict_noshow(&self, features: &BookingFeatures) -> Result<f64, PredictionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    ManualReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPrediction {
    pub decision: ApprovalDecision,
    pub confidence: f64,
    pub should_auto_approve: bool,
    /// Why the fallback was used, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApprovalPrediction {
    pub fn from_score(score: ApprovalScore) -> Self {
        let decision = if score.approve {
            ApprovalDecision::Approve
        } else {
            ApprovalDecision::ManualReview
        };
        Self {
            decision,
            confidence: score.confidence,
            should_auto_approve: score.approve && score.confidence >= AUTO_APPROVE_CONFIDENCE,
            error: None,
        }
    }

    pub fn fallback(error: &PredictionError) -> Self {
        Self {
            decision: ApprovalDecision::ManualReview,
            confidence: 0.0,
            should_auto_approve: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn from_probability(p: f64) -> Self {
        if p > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if p > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoShowPrediction {
    pub noshow_probability: f64,
    pub show_probability: f64,
    pub send_extra_reminder: bool,
    pub risk: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NoShowPrediction {
    pub fn from_probability(p: f64) -> Self {
        Self {
            noshow_probability: p,
            show_probability: 1.0 - p,
            send_extra_reminder: p > EXTRA_REMINDER_THRESHOLD,
            risk: RiskLevel::from_probability(p),
            error: None,
        }
    }

    pub fn fallback(error: &PredictionError) -> Self {
        Self {
            noshow_probability: NEUTRAL_RATE,
            show_probability: NEUTRAL_RATE,
            send_extra_reminder: true,
            risk: RiskLevel::Unknown,
            error: Some(error.to_string()),
        }
    }
}

/// Both predictions for one booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub features: BookingFeatures,
    pub approval: ApprovalPrediction,
    pub noshow: NoShowPrediction,
}

/// Query the service, degrading each prediction to its fallback on failure.
pub fn assess(service: &dyn PredictionService, features: BookingFeatures) -> RiskAssessment {
    let approval = match service.predict_approval(&features).and_then(validate_score) {
        Ok(score) => ApprovalPrediction::from_score(score),
        Err(e) => {
            warn!(error = %e, "approval prediction failed, falling back to manual review");
            ApprovalPrediction::fallback(&e)
        }
    };
    let noshow = match service.predict_noshow(&features).and_then(validate_probability) {
        Ok(p) => NoShowPrediction::from_probability(p),
        Err(e) => {
            warn!(error = %e, "no-show prediction failed, risk unknown");
            NoShowPrediction::fallback(&e)
        }
    };
    RiskAssessment {
        features,
        approval,
        noshow,
    }
}

fn validate_probability(p: f64) -> Result<f64, PredictionError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(PredictionError::Malformed(format!("probability {} outside [0, 1]", p)))
    }
}

fn validate_score(score: ApprovalScore) -> Result<ApprovalScore, PredictionError> {
    validate_probability(score.confidence).map(|_| score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_bands() {
        assert_eq!(RiskLevel::from_probability(0.71), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.7), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.41), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.4), RiskLevel::Low);
    }

    #[test]
    fn auto_approve_needs_confidence() {
        let sure = ApprovalPrediction::from_score(ApprovalScore { approve: true, confidence: 0.7 });
        assert!(sure.should_auto_approve);
        let unsure = ApprovalPrediction::from_score(ApprovalScore {
            approve: true,
            confidence: 0.69,
        });
        assert!(!unsure.should_auto_approve);
        assert_eq!(unsure.decision, ApprovalDecision::Approve);
    }

    #[test]
    fn fulfilled_reservations_count_as_approved() {
        use crate::model::{ReservationSpan, ReservationStatus};
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let with = |id, status| Reservation {
            id,
            resource_type: crate::model::ResourceType::Facility,
            resource_id: 1,
            requester_id: 1,
            span: ReservationSpan::Timed {
                date,
                window: TimeWindow::hm((9, 0), (10, 0)).unwrap(),
            },
            status,
            quantity: 1,
            created_at: date.and_hms_opt(8, 0, 0).unwrap(),
        };
        let history = vec![
            with(1, ReservationStatus::Completed),
            with(2, ReservationStatus::Approved),
            with(3, ReservationStatus::Denied),
            with(4, ReservationStatus::Pending),
        ];
        let stats = RequesterStats::from_history(&history);
        assert_eq!(stats.approval_rate, 0.5);
        assert_eq!(stats.completion_rate, 0.5);
        assert_eq!(stats.total, 4);
    }

    #[test]
    fn no_history_gives_neutral_rates() {
        let stats = RequesterStats::from_history(&[]);
        assert_eq!(stats.approval_rate, 0.5);
        assert_eq!(stats.completion_rate, 0.5);
    }
}
