//! # Session Module - Training Session Model and Lifecycle
//!
//! This module defines the training session itself: the row shape shared
//! with the backend, the status machine a session moves through, and the
//! validated parameters a new session is created from.
//!
//! ## Key Rules
//!
//! - **Single terminal write**: `end_time` is stamped by the transition into
//!   `finished` or `abandoned` and never rewritten afterwards.
//! - **Validation first**: [`SessionPlan`] rejects non-positive floor counts
//!   at construction, so invalid parameters can never reach a backend.
//! - **Frozen clock**: [`TrainingSession::elapsed_seconds`] tracks the wall
//!   clock while a session is active and freezes at `end_time` once it is
//!   terminal.
//!
//! ## Session Lifecycle
//!
#![doc = simple_mermaid::mermaid!("../diagrams/session_lifecycle.mmd")]
//!
//! ## Usage Examples
//!
//! ```rust
//! use gradus::session::{SessionPlan, SessionStatus};
//!
//! let plan = SessionPlan::new(10, 100).unwrap();
//! assert_eq!(plan.floors_per_lap(), 10);
//! assert_eq!(plan.target_floors(), 100);
//!
//! // Zero floor counts never reach a backend
//! assert!(SessionPlan::new(0, 100).is_err());
//!
//! assert!(!SessionStatus::Active.is_terminal());
//! assert!(SessionStatus::Abandoned.is_terminal());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Seconds, duration::seconds_between};

/// The lifecycle state of a [`TrainingSession`]
///
/// `Finished` and `Abandoned` are terminal; a session in either state
/// accepts no further laps or transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Finished,
    Abandoned,
}

impl SessionStatus {
    /// Returns true for the two end states
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Abandoned)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Finished => "finished",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{name}")
    }
}

/// One stair-climbing training session, as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    /// Set exactly once, by the transition into a terminal status
    pub end_time: Option<DateTime<Utc>>,
    pub floors_per_lap: u32,
    pub target_floors: u32,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl TrainingSession {
    /// Returns true while the session still accepts laps
    pub const fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }

    /// Seconds elapsed at `now`
    ///
    /// While the session is active this follows the wall clock; once it is
    /// terminal the value freezes at `end_time - start_time`.
    ///
    /// * `now` - The caller's current instant
    ///
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Seconds {
        let end = self.end_time.unwrap_or(now);
        seconds_between(self.start_time, end)
    }
}

/// Rejected session parameters
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    #[error("floors per lap must be greater than zero")]
    FloorsPerLap,

    #[error("target floors must be greater than zero")]
    TargetFloors,
}

/// Validated parameters for creating a session
///
/// Construction is the validation: a `SessionPlan` can only hold positive
/// floor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionPlan {
    floors_per_lap: u32,
    target_floors: u32,
}

impl SessionPlan {
    /// Creates a plan, rejecting non-positive floor counts
    ///
    /// * `floors_per_lap` - Floors climbed by one lap
    /// * `target_floors` - The floor goal for the whole session
    ///
    pub const fn new(floors_per_lap: u32, target_floors: u32) -> Result<Self, PlanError> {
        if floors_per_lap == 0 {
            return Err(PlanError::FloorsPerLap);
        }

        if target_floors == 0 {
            return Err(PlanError::TargetFloors);
        }

        Ok(Self {
            floors_per_lap,
            target_floors,
        })
    }

    pub const fn floors_per_lap(self) -> u32 {
        self.floors_per_lap
    }

    pub const fn target_floors(self) -> u32 {
        self.target_floors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn session(status: SessionStatus, end_time: Option<DateTime<Utc>>) -> TrainingSession {
        TrainingSession {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            start_time: at(1_000),
            end_time,
            floors_per_lap: 10,
            target_floors: 100,
            status,
            created_at: at(1_000),
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Finished.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Abandoned).unwrap();
        assert_eq!(json, "\"abandoned\"");

        let status: SessionStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(status, SessionStatus::Active);
    }

    #[test]
    fn test_elapsed_follows_the_clock_while_active() {
        let session = session(SessionStatus::Active, None);

        assert_eq!(session.elapsed_seconds(at(1_030)), 30);
        assert_eq!(session.elapsed_seconds(at(1_090)), 90);
    }

    #[test]
    fn test_elapsed_freezes_once_terminal() {
        let session = session(SessionStatus::Finished, Some(at(1_060)));

        // `now` no longer matters
        assert_eq!(session.elapsed_seconds(at(1_060)), 60);
        assert_eq!(session.elapsed_seconds(at(9_999)), 60);
    }

    #[test]
    fn test_plan_validation() {
        assert!(SessionPlan::new(10, 100).is_ok());
        assert_eq!(SessionPlan::new(0, 100), Err(PlanError::FloorsPerLap));
        assert_eq!(SessionPlan::new(10, 0), Err(PlanError::TargetFloors));
        assert_eq!(SessionPlan::new(0, 0), Err(PlanError::FloorsPerLap));
    }

    #[test]
    fn test_plan_serializes_as_creation_body() {
        let plan = SessionPlan::new(5, 50).unwrap();
        let json = serde_json::to_value(plan).unwrap();
        assert_eq!(json["floors_per_lap"], 5);
        assert_eq!(json["target_floors"], 50);
    }
}
