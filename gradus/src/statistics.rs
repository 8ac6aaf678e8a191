//! # Statistics Module - Derived Session Metrics
//!
//! This module condenses a session and its lap ledger into the numbers shown
//! after (or during) a workout. Nothing here is stored; every value is
//! recomputed from the session row and the lap events each time.
//!
//! ## Key Features
//!
//! - **Pure Derivation**: [`SessionStatistics::calculate`] reads a session
//!   and ledger, and writes nothing back
//! - **Honest Completion**: The completion rate is not capped at 100%, so
//!   overachieving a target shows as more than 100%
//! - **Terminal Clock**: Finished and abandoned sessions measure total time
//!   from `start_time` to `end_time`; active ones from the laps recorded so
//!   far
//!
//! ## Usage Examples
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use gradus::{LapLedger, LapRecord, SessionStatistics, SessionStatus, TrainingSession};
//!
//! fn at(seconds: i64) -> DateTime<Utc> {
//!     DateTime::from_timestamp(seconds, 0).unwrap()
//! }
//!
//! let session = TrainingSession {
//!     id: "s-1".into(),
//!     user_id: "u-1".into(),
//!     start_time: at(0),
//!     end_time: None,
//!     floors_per_lap: 10,
//!     target_floors: 100,
//!     status: SessionStatus::Active,
//!     created_at: at(0),
//! };
//! let ledger = LapLedger::new(vec![LapRecord {
//!     id: "lap-1".into(),
//!     session_id: "s-1".into(),
//!     lap_number: 1,
//!     finish_time: at(30),
//! }]);
//!
//! let stats = SessionStatistics::calculate(&session, &ledger);
//! assert_eq!(stats.total_floors_climbed, 10);
//! assert_eq!(stats.completion_rate, 10); // 10 of 100 floors
//! ```

use crate::{
    Seconds,
    duration::seconds_between,
    lap::LapLedger,
    session::TrainingSession,
};

/// Derived metrics for one session
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionStatistics {
    /// How many laps were recorded
    pub total_laps: usize,
    /// Laps times floors per lap
    pub total_floors_climbed: u64,
    /// Whole percent of the floor target reached, uncapped
    pub completion_rate: u32,
    /// Wall time for terminal sessions, recorded lap time otherwise
    pub total_time_seconds: Seconds,
    /// Mean lap duration in seconds, 0.0 without laps
    pub average_time_per_lap: f64,
    pub fastest_lap_time: Seconds,
    pub slowest_lap_time: Seconds,
}

impl SessionStatistics {
    /// Calculate the metrics for a session
    ///
    /// * `session` - The session row the laps belong to
    /// * `ledger` - The laps recorded so far
    ///
    pub fn calculate(session: &TrainingSession, ledger: &LapLedger) -> Self {
        let splits = ledger.splits(session.start_time);

        let total_laps = splits.len();
        let total_floors_climbed = total_laps as u64 * u64::from(session.floors_per_lap);

        let completion_rate = if session.target_floors == 0 {
            0
        } else {
            let percent =
                total_floors_climbed as f64 * 100.0 / f64::from(session.target_floors);
            percent.round() as u32
        };

        let lap_time_sum: Seconds = splits.iter().map(|split| split.seconds).sum();

        // A terminal session has a fixed end; measure the whole workout.
        // An active one only has laps to go by.
        let total_time_seconds = match session.end_time {
            Some(end) if session.status.is_terminal() => {
                seconds_between(session.start_time, end)
            }
            _ => lap_time_sum,
        };

        let average_time_per_lap = if total_laps == 0 {
            0.0
        } else {
            lap_time_sum as f64 / total_laps as f64
        };

        let fastest_lap_time = splits
            .iter()
            .map(|split| split.seconds)
            .min()
            .unwrap_or(0);
        let slowest_lap_time = splits
            .iter()
            .map(|split| split.seconds)
            .max()
            .unwrap_or(0);

        Self {
            total_laps,
            total_floors_climbed,
            completion_rate,
            total_time_seconds,
            average_time_per_lap,
            fastest_lap_time,
            slowest_lap_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::{
        lap::LapRecord,
        session::SessionStatus,
    };

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn session(
        floors_per_lap: u32,
        target_floors: u32,
        status: SessionStatus,
        end_time: Option<DateTime<Utc>>,
    ) -> TrainingSession {
        TrainingSession {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            start_time: at(0),
            end_time,
            floors_per_lap,
            target_floors,
            status,
            created_at: at(0),
        }
    }

    fn ledger(finishes: &[i64]) -> LapLedger {
        LapLedger::new(
            finishes
                .iter()
                .enumerate()
                .map(|(index, &finish)| LapRecord {
                    id: format!("lap-{index}"),
                    session_id: "s-1".to_string(),
                    lap_number: index as u32 + 1,
                    finish_time: at(finish),
                })
                .collect(),
        )
    }

    #[test]
    fn test_floors_and_completion_rate() {
        // 5 laps of 10 floors against a 100 floor target
        let session = session(10, 100, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&[30, 70, 130, 160, 200]));

        assert_eq!(stats.total_laps, 5);
        assert_eq!(stats.total_floors_climbed, 50);
        assert_eq!(stats.completion_rate, 50); // 50 / 100 floors
    }

    #[test]
    fn test_lap_timing_metrics() {
        // Splits are 30, 40 and 60 seconds
        let session = session(10, 100, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&[30, 70, 130]));

        assert_eq!(stats.fastest_lap_time, 30);
        assert_eq!(stats.slowest_lap_time, 60);
        assert!((stats.average_time_per_lap - 130.0 / 3.0).abs() < 1e-9); // ≈ 43.33
        assert_eq!(stats.total_time_seconds, 130); // active: sum of splits
    }

    #[test]
    fn test_terminal_sessions_measure_wall_time() {
        // Last lap at T+130, but the user pressed finish at T+250
        let session = session(10, 100, SessionStatus::Finished, Some(at(250)));
        let stats = SessionStatistics::calculate(&session, &ledger(&[30, 70, 130]));

        assert_eq!(stats.total_time_seconds, 250);
        // Lap metrics stay split-based
        assert_eq!(stats.fastest_lap_time, 30);
        assert_eq!(stats.slowest_lap_time, 60);
    }

    #[test]
    fn test_abandoned_sessions_also_freeze() {
        let session = session(10, 100, SessionStatus::Abandoned, Some(at(90)));
        let stats = SessionStatistics::calculate(&session, &ledger(&[30]));

        assert_eq!(stats.total_time_seconds, 90);
    }

    #[test]
    fn test_completion_rate_is_not_capped() {
        // 12 laps of 10 floors against a 60 floor target
        let finishes: Vec<i64> = (1..=12).map(|lap| lap * 30).collect();
        let session = session(10, 60, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&finishes));

        assert_eq!(stats.total_floors_climbed, 120);
        assert_eq!(stats.completion_rate, 200); // not clamped at 100
    }

    #[test]
    fn test_completion_rate_rounds_to_nearest_percent() {
        // 1 lap of 1 floor against 3 floors: 33.33..% rounds to 33
        let session = session(1, 3, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&[30]));
        assert_eq!(stats.completion_rate, 33);

        // 2 of 3: 66.66..% rounds to 67
        let stats = SessionStatistics::calculate(&session, &ledger(&[30, 60]));
        assert_eq!(stats.completion_rate, 67);
    }

    #[test]
    fn test_session_without_laps_is_all_zeros() {
        let session = session(10, 100, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&[]));

        assert_eq!(stats, SessionStatistics::default());
    }

    #[test]
    fn test_zero_target_reports_zero_rate() {
        // Backend rows predating plan validation may carry a zero target
        let session = session(10, 0, SessionStatus::Active, None);
        let stats = SessionStatistics::calculate(&session, &ledger(&[30]));

        assert_eq!(stats.completion_rate, 0);
        assert_eq!(stats.total_floors_climbed, 10);
    }
}
